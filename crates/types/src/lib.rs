//! Core types module - shared data structures and constants
//!
//! This module defines the vocabulary shared by the simulation core, the
//! composite-command engine, the pointer mapper and the adapter protocol.
//! All types are plain data with no external dependencies.
//!
//! # Cell Codes
//!
//! The board is exchanged with callers (snapshots, wire protocol) as a flat
//! list of integer codes. A single integer domain covers every kind of cell:
//!
//! | Code | Meaning |
//! |------|---------|
//! | `-1..=-5` | Fixed slot (chest, dice, equipment, hero, pet) |
//! | `-9` | Empty placeholder (only visible mid-cascade) |
//! | `0..G` | Plain gem of kind `code` |
//! | `>= 100` | Special tile: `origin = (code - 100) / 10`, `kind = (code - 100) % 10` |
//!
//! Inside the engine the board is stored as the tagged [`Cell`] enum; the
//! arithmetic above lives only in [`encode_special`], [`special_kind`],
//! [`special_origin`] and [`Cell::from_code`].
//!
//! # Pacing Defaults
//!
//! Cascade resolution yields timed phases to the presentation layer:
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `SCORE_PAUSE_MS` | 250 | Pause after a pass is scored (tier 1) |
//! | `PAUSE_PER_TIER_MS` | 120 | Extra pause per tier above 1 |
//! | `CHAIN_PAUSE_MS` | 200 | Pause after special tiles detonate |
//! | `SETTLE_PAUSE_MS` | 300 | Pause after clear + gravity |
//! | `DRAG_TIME_LIMIT_MS` | 8000 | Drag force-end budget |
//!
//! # Examples
//!
//! ```
//! use gem_cascade_types::{encode_special, special_kind, Cell, SlotKind, SpecialKind};
//!
//! let code = encode_special(3, SpecialKind::Area);
//! assert_eq!(code, 132);
//! assert_eq!(special_kind(code), Some(SpecialKind::Area));
//!
//! assert_eq!(Cell::from_code(code), Some(Cell::Special { origin: 3, kind: SpecialKind::Area }));
//! assert_eq!(Cell::Fixed(SlotKind::Dice).to_code(), -2);
//! assert_eq!(Cell::Gem(4).effective_gem(), Some(4));
//! ```

/// Default board rows
pub const DEFAULT_ROWS: u8 = 8;

/// Default board columns
pub const DEFAULT_COLS: u8 = 8;

/// Default number of gem kinds (G)
pub const DEFAULT_GEM_KINDS: u8 = 5;

/// Fewest gem kinds that always leave a run-breaking choice when generating
pub const MIN_GEM_KINDS: u8 = 3;

/// Upper bound on gem kinds; origin gems must fit the special-code stride
pub const MAX_GEM_KINDS: u8 = 10;

/// Default move budget per stage
pub const DEFAULT_MOVE_BUDGET: u32 = 20;

/// Default stage clear target (match-group count)
pub const DEFAULT_CLEAR_TARGET: u32 = 30;

/// First special-tile code
pub const SPECIAL_OFFSET: i32 = 100;

/// Width of the special-kind sub-field inside a special code
pub const SPECIAL_STRIDE: i32 = 10;

/// Code of the transient empty placeholder
pub const EMPTY_CODE: i32 = -9;

/// Minimum run length that counts as a match
pub const MIN_MATCH_LEN: usize = 3;

/// Number of random cells hit by a lightning tile
pub const LIGHTNING_TARGETS: usize = 5;

/// Points per cleared cell
pub const BASE_PER_CELL: u32 = 10;

/// Bonus for a row group and a column group crossing on the same gem
pub const CROSS_BONUS: u32 = 50;

/// Combo bonus per cascade after the first
pub const COMBO_BASE: u32 = 25;

/// Pause after a pass is scored, tier 1
pub const SCORE_PAUSE_MS: u32 = 250;

/// Extra score pause per tier above 1
pub const PAUSE_PER_TIER_MS: u32 = 120;

/// Pause after the chain-trigger phase
pub const CHAIN_PAUSE_MS: u32 = 200;

/// Pause after clear + gravity
pub const SETTLE_PAUSE_MS: u32 = 300;

/// Time budget for one open drag
pub const DRAG_TIME_LIMIT_MS: u32 = 8000;


/// Immovable non-gem cells reserved for UI anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Chest,
    Dice,
    Equipment,
    Hero,
    Pet,
}

impl SlotKind {
    pub const ALL: [SlotKind; 5] = [
        SlotKind::Chest,
        SlotKind::Dice,
        SlotKind::Equipment,
        SlotKind::Hero,
        SlotKind::Pet,
    ];

    /// Negative sentinel code
    pub fn code(&self) -> i32 {
        match self {
            SlotKind::Chest => -1,
            SlotKind::Dice => -2,
            SlotKind::Equipment => -3,
            SlotKind::Hero => -4,
            SlotKind::Pet => -5,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(SlotKind::Chest),
            -2 => Some(SlotKind::Dice),
            -3 => Some(SlotKind::Equipment),
            -4 => Some(SlotKind::Hero),
            -5 => Some(SlotKind::Pet),
            _ => None,
        }
    }

    /// Parse slot kind from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "chest" => Some(SlotKind::Chest),
            "dice" => Some(SlotKind::Dice),
            "equipment" => Some(SlotKind::Equipment),
            "hero" => Some(SlotKind::Hero),
            "pet" => Some(SlotKind::Pet),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SlotKind::Chest => "chest",
            SlotKind::Dice => "dice",
            SlotKind::Equipment => "equipment",
            SlotKind::Hero => "hero",
            SlotKind::Pet => "pet",
        }
    }
}

/// Detonation ability carried by a special tile
///
/// - **RowLine**: every non-fixed cell in the tile's row
/// - **ColumnLine**: every non-fixed cell in the tile's column
/// - **Area**: 3x3 block around the tile
/// - **Lightning**: 5 random cells anywhere on the board
/// - **Rainbow**: every cell sharing the tile's origin gem
/// - **Cross**: row and column together
/// - **Mega**: 5x5 block around the tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialKind {
    RowLine,
    ColumnLine,
    Area,
    Lightning,
    Rainbow,
    Cross,
    Mega,
}

impl SpecialKind {
    pub const ALL: [SpecialKind; 7] = [
        SpecialKind::RowLine,
        SpecialKind::ColumnLine,
        SpecialKind::Area,
        SpecialKind::Lightning,
        SpecialKind::Rainbow,
        SpecialKind::Cross,
        SpecialKind::Mega,
    ];

    /// Sub-field value stored in the special code
    pub fn index(&self) -> u8 {
        match self {
            SpecialKind::RowLine => 0,
            SpecialKind::ColumnLine => 1,
            SpecialKind::Area => 2,
            SpecialKind::Lightning => 3,
            SpecialKind::Rainbow => 4,
            SpecialKind::Cross => 5,
            SpecialKind::Mega => 6,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Parse special kind from string (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use gem_cascade_types::SpecialKind;
    ///
    /// assert_eq!(SpecialKind::from_str("rowLine"), Some(SpecialKind::RowLine));
    /// assert_eq!(SpecialKind::from_str("MEGA"), Some(SpecialKind::Mega));
    /// assert_eq!(SpecialKind::from_str("bomb"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "rowline" | "row_line" => Some(SpecialKind::RowLine),
            "columnline" | "column_line" => Some(SpecialKind::ColumnLine),
            "area" => Some(SpecialKind::Area),
            "lightning" => Some(SpecialKind::Lightning),
            "rainbow" => Some(SpecialKind::Rainbow),
            "cross" => Some(SpecialKind::Cross),
            "mega" => Some(SpecialKind::Mega),
            _ => None,
        }
    }

    /// Convert to camelCase string for the adapter protocol
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialKind::RowLine => "rowLine",
            SpecialKind::ColumnLine => "columnLine",
            SpecialKind::Area => "area",
            SpecialKind::Lightning => "lightning",
            SpecialKind::Rainbow => "rainbow",
            SpecialKind::Cross => "cross",
            SpecialKind::Mega => "mega",
        }
    }
}

/// Encode a special tile as an integer cell code.
pub fn encode_special(gem: u8, kind: SpecialKind) -> i32 {
    SPECIAL_OFFSET + gem as i32 * SPECIAL_STRIDE + kind.index() as i32
}

/// Special kind of a cell code, `None` for anything that is not a special tile.
pub fn special_kind(code: i32) -> Option<SpecialKind> {
    if code < SPECIAL_OFFSET {
        return None;
    }
    SpecialKind::from_index(((code - SPECIAL_OFFSET) % SPECIAL_STRIDE) as u8)
}

/// Origin gem of a special cell code.
pub fn special_origin(code: i32) -> Option<u8> {
    if code < SPECIAL_OFFSET {
        return None;
    }
    let origin = (code - SPECIAL_OFFSET) / SPECIAL_STRIDE;
    if origin < MAX_GEM_KINDS as i32 {
        Some(origin as u8)
    } else {
        None
    }
}

/// A cell on the match-3 board
///
/// `Empty` only exists between the clear and gravity steps of a cascade pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    Fixed(SlotKind),
    Gem(u8),
    Special { origin: u8, kind: SpecialKind },
}

impl Cell {
    /// Decode an integer cell code
    pub fn from_code(code: i32) -> Option<Self> {
        if code == EMPTY_CODE {
            return Some(Cell::Empty);
        }
        if code < 0 {
            return SlotKind::from_code(code).map(Cell::Fixed);
        }
        if code < SPECIAL_OFFSET {
            return if code < MAX_GEM_KINDS as i32 {
                Some(Cell::Gem(code as u8))
            } else {
                None
            };
        }
        let origin = special_origin(code)?;
        let kind = special_kind(code)?;
        Some(Cell::Special { origin, kind })
    }

    /// Encode as an integer cell code
    pub fn to_code(&self) -> i32 {
        match *self {
            Cell::Empty => EMPTY_CODE,
            Cell::Fixed(slot) => slot.code(),
            Cell::Gem(gem) => gem as i32,
            Cell::Special { origin, kind } => encode_special(origin, kind),
        }
    }

    /// Gem used for matching: plain gem or the special tile's origin
    pub fn effective_gem(&self) -> Option<u8> {
        match *self {
            Cell::Gem(gem) => Some(gem),
            Cell::Special { origin, .. } => Some(origin),
            Cell::Empty | Cell::Fixed(_) => None,
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, Cell::Fixed(_))
    }

    pub fn is_special(&self) -> bool {
        matches!(self, Cell::Special { .. })
    }

    pub fn special(&self) -> Option<SpecialKind> {
        match *self {
            Cell::Special { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// Gem or special tile (something a drag can pick up)
    pub fn is_movable(&self) -> bool {
        matches!(self, Cell::Gem(_) | Cell::Special { .. })
    }
}

/// Board coordinate: `row` grows downward, `col` grows rightward
///
/// Signed so that raw pointer input outside the board can be represented and
/// rejected by bounds checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub row: i8,
    pub col: i8,
}

impl Coord {
    pub const fn new(row: i8, col: i8) -> Self {
        Self { row, col }
    }

    /// 8-directional neighbour (Chebyshev distance 1)
    pub fn is_adjacent(&self, other: Coord) -> bool {
        let dr = (self.row as i16 - other.row as i16).abs();
        let dc = (self.col as i16 - other.col as i16).abs();
        dr <= 1 && dc <= 1 && (dr, dc) != (0, 0)
    }
}

/// Match group orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Row,
    Column,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Row => "row",
            Orientation::Column => "column",
        }
    }
}

/// Input/resolution state of an engine instance
///
/// - **Idle**: accepts a new drag
/// - **Dragging**: a swap chain is open
/// - **Resolving**: cascades are draining; drags are ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    Idle,
    Dragging,
    Resolving,
}

impl EngineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineState::Idle => "idle",
            EngineState::Dragging => "dragging",
            EngineState::Resolving => "resolving",
        }
    }
}
