//! TCP server for remote controllers
//!
//! Handles incoming connections and manages client lifecycle.
//! Uses tokio for async networking.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, WriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, RwLock};

use crate::protocol::*;
use crate::runtime::{ClientCommand, InboundCommand, InboundPayload, OutboundMessage};
use crate::types::Coord;

fn extract_seq_best_effort(s: &str) -> Option<u64> {
    let start = s.find("\"seq\"")?;
    let after_key = &s[start + 5..];
    let colon = after_key.find(':')?;
    let rest = after_key[colon + 1..].trim_start();
    let end = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if end == 0 {
        return None;
    }
    rest[..end].parse::<u64>().ok()
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub protocol_version: String,
    pub max_pending_commands: usize,
    /// JSON game config (`GameConfigFile`); built-in defaults when unset
    pub config_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7878,
            protocol_version: PROTOCOL_VERSION.to_string(),
            max_pending_commands: 16,
            config_path: None,
        }
    }
}

impl ServerConfig {
    /// Create from `MATCH3_*` environment variables
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();
        let host = env::var("MATCH3_HOST").unwrap_or(defaults.host);
        let port = env::var("MATCH3_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        let max_pending_commands = env::var("MATCH3_MAX_PENDING")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_pending_commands);

        let config_path = env::var("MATCH3_CONFIG")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Self {
            host,
            port,
            protocol_version: defaults.protocol_version,
            max_pending_commands,
            config_path,
        }
    }

    /// Major component of the protocol version a hello must match
    fn major_version(&self) -> &str {
        self.protocol_version
            .split('.')
            .next()
            .unwrap_or(&self.protocol_version)
    }
}

/// Connected clients and the controller seat, guarded by one lock.
#[derive(Default)]
struct Roster {
    clients: Vec<ClientHandle>,
    controller: Option<usize>,
}

/// Verdict on an inbound message carrying `seq`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    NotHandshaken,
    StaleSeq,
    Observer,
    Controller,
}

impl Roster {
    fn get_mut(&mut self, id: usize) -> Option<&mut ClientHandle> {
        self.clients.iter_mut().find(|c| c.id == id)
    }

    /// Check the sender's role and record `seq` if it is fresh.
    fn admit(&mut self, id: usize, seq: u64) -> Admission {
        let controller = self.controller;
        let Some(client) = self.get_mut(id) else {
            return Admission::NotHandshaken;
        };
        if !client.handshaken {
            return Admission::NotHandshaken;
        }
        if matches!(client.last_seq, Some(prev) if seq <= prev) {
            return Admission::StaleSeq;
        }
        client.last_seq = Some(seq);
        if controller == Some(id) {
            Admission::Controller
        } else {
            Admission::Observer
        }
    }

    /// Mark `id` handshaken. The first client to get here takes control.
    fn handshake(&mut self, id: usize, seq: u64, stream: bool) -> (AssignedRole, Option<u64>) {
        if self.controller.is_none() && self.clients.iter().any(|c| c.id == id) {
            self.controller = Some(id);
            tracing::info!(client_id = id, "client is now controller");
        }
        if let Some(client) = self.get_mut(id) {
            client.handshaken = true;
            client.last_seq = Some(seq);
            client.stream_observations = stream;
        }
        let role = if self.controller == Some(id) {
            AssignedRole::Controller
        } else {
            AssignedRole::Observer
        };
        (role, self.controller.map(|c| c as u64))
    }

    /// Drop `id`. If it held control, the lowest handshaken id takes over.
    fn remove(&mut self, id: usize) {
        self.clients.retain(|c| c.id != id);
        if self.controller != Some(id) {
            return;
        }
        self.controller = self
            .clients
            .iter()
            .filter(|c| c.handshaken)
            .map(|c| c.id)
            .min();
        match self.controller {
            Some(next) => tracing::info!(client_id = next, "controller promoted"),
            None => tracing::info!(client_id = id, "controller released"),
        }
    }
}

/// Shared server state
pub struct ServerState {
    config: ServerConfig,
    roster: RwLock<Roster>,
}

impl ServerState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            roster: RwLock::new(Roster::default()),
        }
    }
}

/// Handle to a connected client
pub struct ClientHandle {
    pub id: usize,
    pub addr: SocketAddr,
    pub stream_observations: bool,
    pub handshaken: bool,
    pub last_seq: Option<u64>,
    pub tx: mpsc::UnboundedSender<ClientOutbound>,
}

#[derive(Debug, Clone)]
pub enum ClientOutbound {
    Line(String),
    Welcome(WelcomeMessage),
    Error(ErrorMessage),
}

const STALE_SEQ: &str = "seq must be strictly increasing";

/// Start the TCP server
///
/// Inbound commands go to the game loop through `command_tx`; lines the
/// game loop produces arrive on `out_rx` and are routed to clients.
pub async fn run_server(
    config: ServerConfig,
    command_tx: mpsc::Sender<InboundCommand>,
    mut out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    let bound = listener.local_addr()?;
    tracing::info!(addr = %bound, "listening");
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let state = Arc::new(ServerState::new(config));

    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let roster = state.roster.read().await;
                match msg {
                    OutboundMessage::ToClient { client_id, line } => {
                        if let Some(c) = roster.clients.iter().find(|c| c.id == client_id) {
                            let _ = c.tx.send(ClientOutbound::Line(line));
                        }
                    }
                    OutboundMessage::Broadcast { line } => {
                        let streaming = roster
                            .clients
                            .iter()
                            .filter(|c| c.handshaken && c.stream_observations);
                        for c in streaming {
                            let _ = c.tx.send(ClientOutbound::Line(line.clone()));
                        }
                    }
                }
            }
        });
    }

    let mut next_id = 0usize;
    loop {
        let (socket, addr) = listener.accept().await?;
        next_id += 1;
        let client_id = next_id;
        tracing::info!(client_id, %addr, "client connected");

        let state = Arc::clone(&state);
        let command_tx = command_tx.clone();
        tokio::spawn(async move {
            handle_client(socket, addr, client_id, state, command_tx).await;
            tracing::info!(client_id, "client disconnected");
        });
    }
}

/// Serve one connection until it closes, then release its seat.
async fn handle_client(
    socket: TcpStream,
    addr: SocketAddr,
    client_id: usize,
    state: Arc<ServerState>,
    command_tx: mpsc::Sender<InboundCommand>,
) {
    let (reader, writer) = tokio::io::split(socket);
    let mut reader = BufReader::new(reader);
    let (tx, rx) = mpsc::unbounded_channel::<ClientOutbound>();

    state.roster.write().await.clients.push(ClientHandle {
        id: client_id,
        addr,
        stream_observations: false,
        handshaken: false,
        last_seq: None,
        tx: tx.clone(),
    });

    let write_task = tokio::spawn(write_lines(writer, rx));
    let conn = Connection {
        id: client_id,
        state,
        tx,
        command_tx,
    };

    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(client_id, error = %e, "read failed");
                break;
            }
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !conn.on_line(trimmed).await {
            break;
        }
    }

    conn.state.roster.write().await.remove(client_id);
    // Every sender is gone after this; the writer drains and exits.
    drop(conn);
    let _ = write_task.await;
}

/// Encode outbound messages as JSON lines until the channel closes.
async fn write_lines(
    mut writer: WriteHalf<TcpStream>,
    mut rx: mpsc::UnboundedReceiver<ClientOutbound>,
) {
    let mut buf: Vec<u8> = Vec::with_capacity(4096);
    while let Some(msg) = rx.recv().await {
        buf.clear();
        let encoded = match &msg {
            ClientOutbound::Line(line) => {
                buf.extend_from_slice(line.as_bytes());
                Ok(())
            }
            ClientOutbound::Welcome(welcome) => serde_json::to_writer(&mut buf, welcome),
            ClientOutbound::Error(err) => serde_json::to_writer(&mut buf, err),
        };
        if let Err(e) = encoded {
            tracing::warn!(error = %e, "failed to encode reply");
            continue;
        }
        buf.push(b'\n');
        if writer.write_all(&buf).await.is_err() || writer.flush().await.is_err() {
            break;
        }
    }
}

/// Per-connection message handling
struct Connection {
    id: usize,
    state: Arc<ServerState>,
    tx: mpsc::UnboundedSender<ClientOutbound>,
    command_tx: mpsc::Sender<InboundCommand>,
}

impl Connection {
    fn reply_error(&self, seq: u64, code: ErrorCode, message: &str) {
        let _ = self
            .tx
            .send(ClientOutbound::Error(create_error(seq, code, message)));
    }

    /// Returns `false` when the connection should be closed.
    async fn on_line(&self, line: &str) -> bool {
        match parse_message(line) {
            Ok(ParsedMessage::Hello(hello)) => return self.on_hello(&hello).await,
            Ok(ParsedMessage::Command(cmd)) => self.on_command(&cmd).await,
            Ok(ParsedMessage::Unknown(unknown)) => {
                let admission = self.state.roster.write().await.admit(self.id, unknown.seq);
                if admission == Admission::StaleSeq {
                    self.reply_error(unknown.seq, ErrorCode::InvalidCommand, STALE_SEQ);
                } else {
                    self.reply_error(
                        unknown.seq,
                        ErrorCode::InvalidCommand,
                        "Unknown message type",
                    );
                }
            }
            Err(e) => {
                let seq = extract_seq_best_effort(line).unwrap_or(0);
                tracing::warn!(client_id = self.id, seq, error = %e, "malformed message");
                self.reply_error(
                    seq,
                    ErrorCode::InvalidCommand,
                    &format!("JSON parse error: {}", e),
                );
            }
        }
        true
    }

    async fn on_hello(&self, hello: &HelloMessage) -> bool {
        let admission = self.state.roster.write().await.admit(self.id, hello.seq);
        if admission == Admission::StaleSeq {
            self.reply_error(hello.seq, ErrorCode::InvalidCommand, STALE_SEQ);
            return true;
        }

        let config = &self.state.config;
        if hello.protocol_version.split('.').next() != Some(config.major_version()) {
            tracing::warn!(client_id = self.id, version = %hello.protocol_version, "protocol mismatch");
            self.reply_error(
                hello.seq,
                ErrorCode::ProtocolMismatch,
                &format!("Protocol version {} not supported", hello.protocol_version),
            );
            return false;
        }

        let stream = hello.requested.stream_observations;
        let (role, controller_id) =
            self.state
                .roster
                .write()
                .await
                .handshake(self.id, hello.seq, stream);
        tracing::info!(client_id = self.id, name = %hello.client.name, ?role, "handshake");

        let welcome = create_welcome(
            hello.seq,
            &config.protocol_version,
            self.id as u64,
            role,
            controller_id,
        );
        let _ = self.tx.send(ClientOutbound::Welcome(welcome));

        if stream {
            let _ = self.command_tx.try_send(InboundCommand {
                client_id: self.id,
                seq: hello.seq,
                payload: InboundPayload::SnapshotRequest,
            });
        }
        true
    }

    async fn on_command(&self, cmd: &CommandMessage) {
        let admission = self.state.roster.write().await.admit(self.id, cmd.seq);
        match admission {
            Admission::NotHandshaken => {
                return self.reply_error(
                    cmd.seq,
                    ErrorCode::HandshakeRequired,
                    "Send hello before command",
                );
            }
            Admission::StaleSeq => {
                return self.reply_error(cmd.seq, ErrorCode::InvalidCommand, STALE_SEQ);
            }
            Admission::Observer => {
                return self.reply_error(
                    cmd.seq,
                    ErrorCode::NotController,
                    "Only controller may send commands",
                );
            }
            Admission::Controller => {}
        }

        let command = match map_command(cmd) {
            Ok(c) => c,
            Err(message) => {
                tracing::warn!(client_id = self.id, seq = cmd.seq, %message, "invalid command");
                return self.reply_error(cmd.seq, ErrorCode::InvalidCommand, &message);
            }
        };

        // The game loop acks once the command is applied.
        let queued = self.command_tx.try_send(InboundCommand {
            client_id: self.id,
            seq: cmd.seq,
            payload: InboundPayload::Command(command),
        });
        if queued.is_err() {
            self.reply_error(cmd.seq, ErrorCode::Backpressure, "Command queue is full");
        }
    }
}

/// Map a protocol command into an engine command.
fn map_command(cmd: &CommandMessage) -> Result<ClientCommand, String> {
    let cell = || match (cmd.row, cmd.col) {
        (Some(row), Some(col)) => Ok(Coord::new(row, col)),
        _ => Err(format!("{} requires row and col", cmd.op.as_str())),
    };

    match cmd.op {
        CommandOp::BeginDrag => cell().map(ClientCommand::BeginDrag),
        CommandOp::StepDrag => cell().map(ClientCommand::StepDrag),
        CommandOp::EndDrag => Ok(ClientCommand::EndDrag),
        CommandOp::Restart => Ok(ClientCommand::Restart),
        CommandOp::Gesture => match &cmd.path {
            Some(path) if path.0.len() >= 2 => Ok(ClientCommand::Gesture(path.0.clone())),
            Some(_) => Err("gesture path needs at least two cells".to_string()),
            None => Err("gesture requires path".to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(json: &str) -> CommandMessage {
        match parse_message(json).unwrap() {
            ParsedMessage::Command(cmd) => cmd,
            other => panic!("expected command, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_seq_best_effort() {
        assert_eq!(extract_seq_best_effort(r#"{"seq": 42, "type":"x""#), Some(42));
        assert_eq!(extract_seq_best_effort(r#"{"seq":"a"}"#), None);
        assert_eq!(extract_seq_best_effort("garbage"), None);
    }

    #[test]
    fn test_map_command() {
        let cmd = command(r#"{"type":"command","seq":1,"ts":0,"op":"step_drag","row":1,"col":2}"#);
        assert!(matches!(
            map_command(&cmd),
            Ok(ClientCommand::StepDrag(c)) if c == Coord::new(1, 2)
        ));

        let cmd = command(r#"{"type":"command","seq":1,"ts":0,"op":"begin_drag","row":1}"#);
        assert!(map_command(&cmd).is_err());

        let cmd = command(r#"{"type":"command","seq":1,"ts":0,"op":"gesture","path":[[0,0]]}"#);
        assert!(map_command(&cmd).is_err());

        let cmd = command(r#"{"type":"command","seq":1,"ts":0,"op":"end_drag"}"#);
        assert!(matches!(map_command(&cmd), Ok(ClientCommand::EndDrag)));
    }

    fn join(roster: &mut Roster, id: usize) {
        let (tx, _rx) = mpsc::unbounded_channel();
        roster.clients.push(ClientHandle {
            id,
            addr: SocketAddr::from(([127, 0, 0, 1], 40000 + id as u16)),
            stream_observations: false,
            handshaken: false,
            last_seq: None,
            tx,
        });
    }

    #[test]
    fn test_roster_roles_and_seq() {
        let mut roster = Roster::default();
        join(&mut roster, 1);
        join(&mut roster, 2);

        assert_eq!(roster.admit(1, 1), Admission::NotHandshaken);
        assert_eq!(roster.handshake(1, 1, true), (AssignedRole::Controller, Some(1)));
        assert_eq!(roster.handshake(2, 5, false), (AssignedRole::Observer, Some(1)));

        assert_eq!(roster.admit(1, 1), Admission::StaleSeq);
        assert_eq!(roster.admit(1, 2), Admission::Controller);
        assert_eq!(roster.admit(2, 5), Admission::StaleSeq);
        assert_eq!(roster.admit(2, 6), Admission::Observer);
    }

    #[test]
    fn test_roster_promotes_lowest_handshaken() {
        let mut roster = Roster::default();
        for id in 1..=4 {
            join(&mut roster, id);
        }
        roster.handshake(1, 1, false);
        roster.handshake(4, 1, false);
        roster.handshake(3, 1, false);

        // Client 2 never said hello, so it is passed over.
        roster.remove(1);
        assert_eq!(roster.controller, Some(3));

        roster.remove(2);
        assert_eq!(roster.controller, Some(3));

        roster.remove(3);
        roster.remove(4);
        assert_eq!(roster.controller, None);
        assert!(roster.clients.is_empty());
    }

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.major_version(), "1");
        assert!(config.max_pending_commands > 0);
        assert!(config.config_path.is_none());
    }
}
