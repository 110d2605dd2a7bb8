//! Protocol module - JSON message types for the remote controller
//!
//! Line-delimited JSON. Every message carries `type`, `seq` (sender's
//! sequence number) and `ts` (sender's clock in ms).

use serde::{Deserialize, Serialize};

use arrayvec::ArrayVec;

use crate::core::{
    CascadePhase, CascadeReport, EngineSnapshot, MatchGroup, PhaseKind, SpecialSpawn,
};
use crate::types::{Coord, EngineState};

pub const PROTOCOL_VERSION: &str = "1.0.0";

/// Longest drag path accepted in a single `gesture` command
pub const MAX_PATH_LEN: usize = 64;

// ============== Client -> Game Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HelloType {
    #[serde(rename = "hello")]
    #[default]
    Hello,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CommandType {
    #[serde(rename = "command")]
    #[default]
    Command,
}

/// Client hello message (first message to establish connection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: HelloType,
    pub seq: u64,
    pub ts: u64,
    pub client: ClientInfo,
    pub protocol_version: String,
    #[serde(default)]
    pub requested: RequestedCapabilities,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestedCapabilities {
    pub stream_observations: bool,
}

impl Default for RequestedCapabilities {
    fn default() -> Self {
        Self {
            stream_observations: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandOp {
    BeginDrag,
    StepDrag,
    EndDrag,
    Gesture,
    Restart,
}

impl CommandOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandOp::BeginDrag => "begin_drag",
            CommandOp::StepDrag => "step_drag",
            CommandOp::EndDrag => "end_drag",
            CommandOp::Gesture => "gesture",
            CommandOp::Restart => "restart",
        }
    }
}

/// Command message (controller only)
#[derive(Debug, Clone, Deserialize)]
pub struct CommandMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: CommandType,
    pub seq: u64,
    pub ts: u64,
    pub op: CommandOp,
    #[serde(default)]
    pub row: Option<i8>,
    #[serde(default)]
    pub col: Option<i8>,
    #[serde(default)]
    pub path: Option<PathList>,
}

/// `[[row, col], ...]`, bounded so a single line cannot allocate unboundedly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathList(pub ArrayVec<Coord, MAX_PATH_LEN>);

impl<'de> Deserialize<'de> for PathList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct V;
        impl<'de> serde::de::Visitor<'de> for V {
            type Value = PathList;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "an array of [row, col] pairs")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut out = ArrayVec::<Coord, MAX_PATH_LEN>::new();
                while let Some([row, col]) = seq.next_element::<[i8; 2]>()? {
                    out.try_push(Coord::new(row, col))
                        .map_err(|_| serde::de::Error::custom("path too long"))?;
                }
                Ok(PathList(out))
            }
        }

        deserializer.deserialize_seq(V)
    }
}

// ============== Game -> Client Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WelcomeType {
    #[serde(rename = "welcome")]
    Welcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckType {
    #[serde(rename = "ack")]
    Ack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckStatus {
    #[serde(rename = "ok")]
    Ok,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    #[serde(rename = "error")]
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    HandshakeRequired,
    ProtocolMismatch,
    NotController,
    InvalidCommand,
    Backpressure,
    /// The engine refused the command; `reason` says why.
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignedRole {
    Controller,
    Observer,
}

/// Welcome message (response to hello)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeMessage {
    #[serde(rename = "type")]
    pub msg_type: WelcomeType,
    pub seq: u64,
    pub ts: u64,
    pub protocol_version: String,
    pub client_id: u64,
    pub role: AssignedRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller_id: Option<u64>,
    pub game_id: String,
}

/// Acknowledgment for an applied command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckMessage {
    #[serde(rename = "type")]
    pub msg_type: AckType,
    pub seq: u64,
    pub ts: u64,
    pub status: AckStatus,
}

/// Error message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: ErrorType,
    pub seq: u64,
    pub ts: u64,
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObservationType {
    #[serde(rename = "observation")]
    Observation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateLower {
    Idle,
    Dragging,
    Resolving,
}

impl From<EngineState> for StateLower {
    fn from(value: EngineState) -> Self {
        match value {
            EngineState::Idle => Self::Idle,
            EngineState::Dragging => Self::Dragging,
            EngineState::Resolving => Self::Resolving,
        }
    }
}

/// Board state observation (sent to streaming clients)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationMessage {
    #[serde(rename = "type")]
    pub msg_type: ObservationType,
    pub seq: u64,
    pub ts: u64,
    pub state: StateLower,
    pub rows: u8,
    pub cols: u8,
    /// Integer cell codes, one array per row
    pub cells: Vec<Vec<i32>>,
    pub board_hash: StateHash,
    pub score: u32,
    pub remaining_moves: u32,
    pub total_match_count: u32,
    pub cascade_total: u32,
    pub clear_target: u32,
    pub clear_target_reached: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trail: Vec<[i8; 2]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CascadeType {
    #[serde(rename = "cascade")]
    Cascade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseName {
    Scored,
    Triggered,
    Settled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    pub orientation: String,
    pub gem: u8,
    pub cells: Vec<[i8; 2]>,
}

impl From<&MatchGroup> for GroupSnapshot {
    fn from(value: &MatchGroup) -> Self {
        Self {
            orientation: value.orientation.as_str().to_string(),
            gem: value.gem,
            cells: pairs(&value.cells),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnSnapshot {
    pub at: [i8; 2],
    pub gem: u8,
    pub kind: String,
    pub tier: u8,
}

impl From<&SpecialSpawn> for SpawnSnapshot {
    fn from(value: &SpecialSpawn) -> Self {
        Self {
            at: [value.at.row, value.at.col],
            gem: value.gem,
            kind: value.kind.as_str().to_string(),
            tier: value.tier,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallSnapshot {
    pub from: [i8; 2],
    pub to: [i8; 2],
    pub code: i32,
}

/// One pacing point of a cascade; clients animate, then wait `pause_ms`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeMessage {
    #[serde(rename = "type")]
    pub msg_type: CascadeType,
    pub seq: u64,
    pub ts: u64,
    pub pass: u32,
    pub phase: PhaseName,
    pub pause_ms: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tier: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawn: Option<SpawnSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub detonated: Vec<[i8; 2]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<[i8; 2]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub purified: Vec<[i8; 2]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cleared: Vec<[i8; 2]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub falls: Vec<FallSnapshot>,
    /// `[row, col, gem]` for every freshly drawn gem
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spawned: Vec<[i32; 3]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportType {
    #[serde(rename = "report")]
    Report,
}

/// Summary sent once the board is stable again
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMessage {
    #[serde(rename = "type")]
    pub msg_type: ReportType,
    pub seq: u64,
    pub ts: u64,
    pub cascades: u32,
    pub match_groups: u32,
    pub cells_cleared: u32,
    pub score: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub specials: Vec<SpawnSnapshot>,
    /// The pass limit stopped the resolve before the board was stable
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cut_short: bool,
}

/// Deterministic board hash serialized as lowercase hex (without heap allocation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateHash(pub u64);

impl Serialize for StateHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        let mut buf = [0u8; 16];
        let mut v = self.0;
        for i in 0..16 {
            buf[15 - i] = HEX[(v & 0x0f) as usize];
            v >>= 4;
        }
        match std::str::from_utf8(&buf) {
            Ok(s) => serializer.serialize_str(s),
            Err(e) => Err(serde::ser::Error::custom(e)),
        }
    }
}

impl<'de> Deserialize<'de> for StateHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        u64::from_str_radix(s.trim(), 16)
            .map(StateHash)
            .map_err(|_| serde::de::Error::custom("invalid hex"))
    }
}

// ============== Message Parsing ==============

/// Parse a JSON message from a string
pub fn parse_message(json: &str) -> Result<ParsedMessage, serde_json::Error> {
    #[derive(Debug, Deserialize)]
    #[serde(tag = "type")]
    enum InboundMessage {
        #[serde(rename = "hello")]
        Hello(HelloMessage),
        #[serde(rename = "command")]
        Command(CommandMessage),
    }

    match serde_json::from_str::<InboundMessage>(json) {
        Ok(InboundMessage::Hello(m)) => Ok(ParsedMessage::Hello(m)),
        Ok(InboundMessage::Command(m)) => Ok(ParsedMessage::Command(m)),
        Err(e) => {
            // An unknown message type is answered, not treated as garbage.
            #[derive(Debug, Deserialize)]
            struct Header<'a> {
                #[serde(rename = "type", borrow)]
                msg_type: Option<&'a str>,
                seq: Option<u64>,
            }
            let header = serde_json::from_str::<Header>(json)?;
            match header.msg_type {
                Some("hello") | Some("command") => Err(e),
                _ => Ok(ParsedMessage::Unknown(UnknownMessage {
                    seq: header.seq.unwrap_or(0),
                })),
            }
        }
    }
}

/// Parsed incoming message
#[derive(Debug, Clone)]
pub enum ParsedMessage {
    Hello(HelloMessage),
    Command(CommandMessage),
    Unknown(UnknownMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownMessage {
    pub seq: u64,
}

// ============== Utility Functions ==============

fn pairs(cells: &[Coord]) -> Vec<[i8; 2]> {
    cells.iter().map(|c| [c.row, c.col]).collect()
}

/// Create a hello message
pub fn create_hello(seq: u64, client_name: &str, protocol_version: &str) -> HelloMessage {
    HelloMessage {
        msg_type: HelloType::Hello,
        seq,
        ts: current_timestamp_ms(),
        client: ClientInfo {
            name: client_name.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        protocol_version: protocol_version.to_string(),
        requested: RequestedCapabilities::default(),
    }
}

/// Create a welcome message
pub fn create_welcome(
    seq: u64,
    protocol_version: &str,
    client_id: u64,
    role: AssignedRole,
    controller_id: Option<u64>,
) -> WelcomeMessage {
    WelcomeMessage {
        msg_type: WelcomeType::Welcome,
        seq,
        ts: current_timestamp_ms(),
        protocol_version: protocol_version.to_string(),
        client_id,
        role,
        controller_id,
        game_id: "gem-cascade".to_string(),
    }
}

/// Create an acknowledgment
pub fn create_ack(seq: u64) -> AckMessage {
    AckMessage {
        msg_type: AckType::Ack,
        seq,
        ts: current_timestamp_ms(),
        status: AckStatus::Ok,
    }
}

/// Create an error message
pub fn create_error(seq: u64, code: ErrorCode, message: &str) -> ErrorMessage {
    ErrorMessage {
        msg_type: ErrorType::Error,
        seq,
        ts: current_timestamp_ms(),
        code,
        message: message.to_string(),
        reason: None,
    }
}

/// Create a `rejected` error carrying the engine's reason code
pub fn create_rejection(seq: u64, reason: &str, message: &str) -> ErrorMessage {
    ErrorMessage {
        reason: Some(reason.to_string()),
        ..create_error(seq, ErrorCode::Rejected, message)
    }
}

pub fn build_observation(snapshot: &EngineSnapshot, seq: u64) -> ObservationMessage {
    ObservationMessage {
        msg_type: ObservationType::Observation,
        seq,
        ts: current_timestamp_ms(),
        state: snapshot.state.into(),
        rows: snapshot.rows,
        cols: snapshot.cols,
        cells: snapshot.code_rows(),
        board_hash: StateHash(snapshot.board_hash),
        score: snapshot.score,
        remaining_moves: snapshot.remaining_moves,
        total_match_count: snapshot.total_match_count,
        cascade_total: snapshot.cascade_total,
        clear_target: snapshot.clear_target,
        clear_target_reached: snapshot.clear_target_reached,
        trail: pairs(&snapshot.trail),
    }
}

pub fn build_cascade(phase: &CascadePhase, seq: u64) -> CascadeMessage {
    let mut msg = CascadeMessage {
        msg_type: CascadeType::Cascade,
        seq,
        ts: current_timestamp_ms(),
        pass: phase.pass,
        phase: PhaseName::Scored,
        pause_ms: phase.pause_ms,
        groups: Vec::new(),
        max_tier: None,
        score: None,
        spawn: None,
        detonated: Vec::new(),
        extra: Vec::new(),
        purified: Vec::new(),
        cleared: Vec::new(),
        falls: Vec::new(),
        spawned: Vec::new(),
    };

    match &phase.kind {
        PhaseKind::Scored {
            groups,
            max_tier,
            score,
            spawn,
        } => {
            msg.groups = groups.iter().map(GroupSnapshot::from).collect();
            msg.max_tier = Some(*max_tier);
            msg.score = Some(score.total);
            msg.spawn = spawn.as_ref().map(SpawnSnapshot::from);
        }
        PhaseKind::Triggered {
            detonated,
            extra,
            purified,
        } => {
            msg.phase = PhaseName::Triggered;
            msg.detonated = pairs(detonated);
            msg.extra = pairs(extra);
            msg.purified = pairs(purified);
        }
        PhaseKind::Settled {
            cleared,
            spawn,
            gravity,
        } => {
            msg.phase = PhaseName::Settled;
            msg.cleared = pairs(cleared);
            msg.spawn = spawn.as_ref().map(SpawnSnapshot::from);
            msg.falls = gravity
                .falls
                .iter()
                .map(|f| FallSnapshot {
                    from: [f.from.row, f.from.col],
                    to: [f.to.row, f.to.col],
                    code: f.cell.to_code(),
                })
                .collect();
            msg.spawned = gravity
                .spawned
                .iter()
                .map(|(at, gem)| [at.row as i32, at.col as i32, *gem as i32])
                .collect();
        }
    }
    msg
}

pub fn build_report(report: &CascadeReport, seq: u64) -> ReportMessage {
    ReportMessage {
        msg_type: ReportType::Report,
        seq,
        ts: current_timestamp_ms(),
        cascades: report.cascades,
        match_groups: report.match_groups,
        cells_cleared: report.cells_cleared,
        score: report.score,
        specials: report.spawned().map(SpawnSnapshot::from).collect(),
        cut_short: report.cut_short,
    }
}

/// Get current timestamp in milliseconds
pub(crate) fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EngineConfig, Match3Engine};

    #[test]
    fn test_parse_hello() {
        let json = r#"{"type":"hello","seq":1,"ts":1234567890,"client":{"name":"test-bot","version":"1.0.0"},"protocol_version":"1.0.0","requested":{"stream_observations":false}}"#;
        match parse_message(json).unwrap() {
            ParsedMessage::Hello(msg) => {
                assert_eq!(msg.msg_type, HelloType::Hello);
                assert_eq!(msg.seq, 1);
                assert_eq!(msg.client.name, "test-bot");
                assert!(!msg.requested.stream_observations);
            }
            _ => panic!("Expected Hello message"),
        }

        // `requested` is optional and defaults to streaming.
        let json = r#"{"type":"hello","seq":1,"ts":0,"client":{"name":"a","version":"0"},"protocol_version":"1.0.0"}"#;
        match parse_message(json).unwrap() {
            ParsedMessage::Hello(msg) => assert!(msg.requested.stream_observations),
            _ => panic!("Expected Hello message"),
        }
    }

    #[test]
    fn test_parse_commands() {
        let json = r#"{"type":"command","seq":2,"ts":1,"op":"begin_drag","row":3,"col":4}"#;
        match parse_message(json).unwrap() {
            ParsedMessage::Command(msg) => {
                assert_eq!(msg.op, CommandOp::BeginDrag);
                assert_eq!((msg.row, msg.col), (Some(3), Some(4)));
                assert!(msg.path.is_none());
            }
            _ => panic!("Expected Command message"),
        }

        let json = r#"{"type":"command","seq":3,"ts":1,"op":"gesture","path":[[0,0],[0,1],[1,2]]}"#;
        match parse_message(json).unwrap() {
            ParsedMessage::Command(msg) => {
                assert_eq!(msg.op, CommandOp::Gesture);
                let path = msg.path.unwrap();
                assert_eq!(path.0.len(), 3);
                assert_eq!(path.0[2], Coord::new(1, 2));
            }
            _ => panic!("Expected Command message"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_command_and_flags_unknown_type() {
        let json = r#"{"type":"command","seq":4,"ts":1,"op":"teleport"}"#;
        assert!(parse_message(json).is_err());

        let json = r#"{"type":"control","seq":9,"ts":1}"#;
        match parse_message(json).unwrap() {
            ParsedMessage::Unknown(u) => assert_eq!(u.seq, 9),
            _ => panic!("Expected Unknown message"),
        }

        assert!(parse_message("not json").is_err());
    }

    #[test]
    fn test_path_length_is_bounded() {
        let cells: Vec<String> = (0..MAX_PATH_LEN + 1).map(|_| "[0,0]".to_string()).collect();
        let json = format!(
            r#"{{"type":"command","seq":5,"ts":1,"op":"gesture","path":[{}]}}"#,
            cells.join(",")
        );
        assert!(parse_message(&json).is_err());
    }

    #[test]
    fn test_error_serialization() {
        let err = create_rejection(7, "resolving", "cascades are still resolving");
        let v: serde_json::Value = serde_json::to_value(&err).unwrap();
        assert_eq!(v["type"], "error");
        assert_eq!(v["code"], "rejected");
        assert_eq!(v["reason"], "resolving");

        let err = create_error(8, ErrorCode::NotController, "nope");
        let v: serde_json::Value = serde_json::to_value(&err).unwrap();
        assert_eq!(v["code"], "not_controller");
        assert!(v.get("reason").is_none());
    }

    #[test]
    fn test_observation_from_snapshot() {
        let engine = Match3Engine::seeded(EngineConfig::default(), 5).unwrap();
        let snap = engine.snapshot();
        let obs = build_observation(&snap, 11);
        let v: serde_json::Value = serde_json::to_value(&obs).unwrap();
        assert_eq!(v["type"], "observation");
        assert_eq!(v["state"], "idle");
        assert_eq!(v["cells"].as_array().unwrap().len(), 8);
        assert_eq!(v["board_hash"].as_str().unwrap().len(), 16);
        assert!(v.get("trail").is_none());

        let back: StateHash = serde_json::from_value(v["board_hash"].clone()).unwrap();
        assert_eq!(back.0, snap.board_hash);
    }

    #[test]
    fn test_report_flags_cut_short_only_when_set() {
        let mut report = CascadeReport {
            cascades: 2,
            match_groups: 3,
            cells_cleared: 9,
            score: 120,
            ..CascadeReport::default()
        };
        let v = serde_json::to_value(build_report(&report, 4)).unwrap();
        assert_eq!(v["type"], "report");
        assert_eq!(v["match_groups"], 3);
        assert!(v.get("cut_short").is_none());

        report.cut_short = true;
        let v = serde_json::to_value(build_report(&report, 5)).unwrap();
        assert_eq!(v["cut_short"], true);
    }
}
