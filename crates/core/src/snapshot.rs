use crate::types::{Coord, EngineState};

/// Read-only view of an engine for rendering and observers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EngineSnapshot {
    pub rows: u8,
    pub cols: u8,
    /// Integer cell codes, row-major
    pub codes: Vec<i32>,
    pub board_hash: u64,
    pub state: EngineState,
    pub score: u32,
    pub remaining_moves: u32,
    pub total_match_count: u32,
    pub cascade_total: u32,
    pub clear_target: u32,
    pub clear_target_reached: bool,
    /// Active drag trail, empty when not dragging
    pub trail: Vec<Coord>,
}

impl EngineSnapshot {
    pub fn clear(&mut self) {
        self.rows = 0;
        self.cols = 0;
        self.codes.clear();
        self.board_hash = 0;
        self.state = EngineState::Idle;
        self.score = 0;
        self.remaining_moves = 0;
        self.total_match_count = 0;
        self.cascade_total = 0;
        self.clear_target = 0;
        self.clear_target_reached = false;
        self.trail.clear();
    }

    /// Code at (row, col), if in bounds
    pub fn code(&self, row: usize, col: usize) -> Option<i32> {
        if row >= self.rows as usize || col >= self.cols as usize {
            return None;
        }
        self.codes.get(row * self.cols as usize + col).copied()
    }

    pub fn code_rows(&self) -> Vec<Vec<i32>> {
        self.codes
            .chunks(self.cols.max(1) as usize)
            .map(|row| row.to_vec())
            .collect()
    }
}

impl Default for EngineSnapshot {
    fn default() -> Self {
        Self {
            rows: 0,
            cols: 0,
            codes: Vec::new(),
            board_hash: 0,
            state: EngineState::Idle,
            score: 0,
            remaining_moves: 0,
            total_match_count: 0,
            cascade_total: 0,
            clear_target: 0,
            clear_target_reached: false,
            trail: Vec::new(),
        }
    }
}

/// Stable 64-bit FNV-1a over the little-endian bytes of each cell code.
pub fn board_hash(codes: &[i32]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    let mut h = OFFSET_BASIS;
    for code in codes {
        for byte in code.to_le_bytes() {
            h ^= byte as u64;
            h = h.wrapping_mul(PRIME);
        }
    }
    h
}
