//! Adapter runtime integration.
//!
//! [`GameLoop`] owns the engine on a single tokio task. Commands arrive
//! from the TCP server, cascades are played out phase by phase with real
//! pauses in between, and everything observable is pushed back out as
//! JSON lines.

use std::net::SocketAddr;
use std::time::Duration;

use arrayvec::ArrayVec;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};

use crate::core::{EngineSnapshot, Match3Engine, ResolveStep};
use crate::engine::{apply_gesture, GestureError};
use crate::protocol::{
    build_cascade, build_observation, build_report, create_ack, create_rejection, MAX_PATH_LEN,
};
use crate::server::{run_server, ServerConfig};
use crate::types::{Coord, EngineState};

/// Drag clock resolution
pub const TICK_MS: u64 = 50;

/// Command delivered to the game loop.
#[derive(Debug, Clone)]
pub struct InboundCommand {
    pub client_id: usize,
    pub seq: u64,
    pub payload: InboundPayload,
}

#[derive(Debug, Clone)]
pub enum InboundPayload {
    /// Send the current observation to this client only
    SnapshotRequest,
    Command(ClientCommand),
}

/// Command payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    BeginDrag(Coord),
    StepDrag(Coord),
    EndDrag,
    Gesture(ArrayVec<Coord, MAX_PATH_LEN>),
    Restart,
}

/// Outbound message to be delivered by the server.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    ToClient { client_id: usize, line: String },
    /// Every handshaken client that asked for streaming
    Broadcast { line: String },
}

/// Why a command was not applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    Gesture(GestureError),
    NotDragging,
}

impl Refusal {
    pub fn code(self) -> &'static str {
        match self {
            Refusal::Gesture(e) => e.code(),
            Refusal::NotDragging => "not_dragging",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Refusal::Gesture(e) => e.message(),
            Refusal::NotDragging => "no drag in progress",
        }
    }
}

/// Presentation driver for one engine.
pub struct GameLoop {
    engine: Match3Engine,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
    seq: u64,
    snapshot: EngineSnapshot,
    resume_at: Option<Instant>,
    tick: Duration,
}

impl GameLoop {
    pub fn new(engine: Match3Engine, out_tx: mpsc::UnboundedSender<OutboundMessage>) -> Self {
        Self {
            engine,
            out_tx,
            seq: 0,
            snapshot: EngineSnapshot::default(),
            resume_at: None,
            tick: Duration::from_millis(TICK_MS),
        }
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick.max(Duration::from_millis(1));
        self
    }

    pub fn engine(&self) -> &Match3Engine {
        &self.engine
    }

    /// Drive the engine until `shutdown` fires (or its sender is dropped)
    /// or every command sender is gone. The engine is destroyed on the way
    /// out and handed back.
    pub async fn run(
        mut self,
        mut cmd_rx: mpsc::Receiver<InboundCommand>,
        mut shutdown: oneshot::Receiver<()>,
    ) -> Match3Engine {
        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_tick = Instant::now();

        loop {
            let resume_at = self.resume_at;
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                cmd = cmd_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                _ = tokio::time::sleep_until(resume_at.unwrap_or_else(Instant::now)),
                    if resume_at.is_some() => self.advance(),
                _ = ticker.tick() => {
                    let now = Instant::now();
                    let elapsed = now.duration_since(last_tick);
                    last_tick = now;
                    self.on_tick(elapsed);
                }
            }
        }

        self.engine.destroy();
        if self.resume_at.take().is_some() {
            // Resuming after destroy only confirms the abandon.
            let step = self.engine.advance_resolve();
            tracing::info!(aborted = matches!(step, ResolveStep::Aborted), "cascade abandoned");
        }
        tracing::info!(score = self.engine.score(), "game loop stopped");
        self.engine
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn handle_command(&mut self, cmd: InboundCommand) {
        let InboundCommand {
            client_id,
            seq,
            payload,
        } = cmd;

        let command = match payload {
            InboundPayload::SnapshotRequest => {
                self.engine.snapshot_into(&mut self.snapshot);
                let seq = self.next_seq();
                let obs = build_observation(&self.snapshot, seq);
                self.send_to(client_id, &obs);
                return;
            }
            InboundPayload::Command(command) => command,
        };

        match self.apply(command) {
            Ok(moved) => {
                self.send_to(client_id, &create_ack(seq));
                self.broadcast_observation();
                if moved {
                    self.start_resolve();
                }
            }
            Err(refusal) => {
                tracing::debug!(client_id, seq, reason = refusal.code(), "command rejected");
                self.send_to(
                    client_id,
                    &create_rejection(seq, refusal.code(), refusal.message()),
                );
            }
        }
    }

    /// Apply one command. `Ok(true)` means a move was spent and the board
    /// must be resolved.
    fn apply(&mut self, command: ClientCommand) -> Result<bool, Refusal> {
        match command {
            ClientCommand::BeginDrag(at) => {
                if self.engine.begin_drag(at.row, at.col) {
                    Ok(false)
                } else {
                    Err(self.refusal(GestureError::InvalidStart))
                }
            }
            ClientCommand::StepDrag(at) => {
                if self.engine.state() != EngineState::Dragging {
                    return Err(self.refusal_idle());
                }
                if self.engine.step_drag(at.row, at.col) {
                    Ok(false)
                } else {
                    Err(Refusal::Gesture(GestureError::NotAdjacent { index: 1 }))
                }
            }
            ClientCommand::EndDrag => {
                if self.engine.state() != EngineState::Dragging {
                    return Err(self.refusal_idle());
                }
                Ok(self.engine.end_drag().moved)
            }
            ClientCommand::Gesture(path) => apply_gesture(&mut self.engine, &path)
                .map(|_| true)
                .map_err(Refusal::Gesture),
            ClientCommand::Restart => {
                if self.engine.restart() {
                    Ok(false)
                } else {
                    Err(self.refusal(GestureError::Resolving))
                }
            }
        }
    }

    /// Most specific reason the engine is refusing input, else `fallback`.
    fn refusal(&self, fallback: GestureError) -> Refusal {
        let e = if self.engine.is_destroyed() {
            GestureError::Destroyed
        } else {
            match self.engine.state() {
                EngineState::Resolving => GestureError::Resolving,
                EngineState::Dragging => GestureError::Busy,
                EngineState::Idle if self.engine.remaining_moves() == 0 => {
                    GestureError::NoMovesLeft
                }
                EngineState::Idle => fallback,
            }
        };
        Refusal::Gesture(e)
    }

    fn refusal_idle(&self) -> Refusal {
        match self.refusal(GestureError::InvalidStart) {
            Refusal::Gesture(GestureError::Destroyed) => {
                Refusal::Gesture(GestureError::Destroyed)
            }
            Refusal::Gesture(GestureError::Resolving) => {
                Refusal::Gesture(GestureError::Resolving)
            }
            _ => Refusal::NotDragging,
        }
    }

    fn on_tick(&mut self, elapsed: Duration) {
        let ms = u32::try_from(elapsed.as_millis()).unwrap_or(u32::MAX);
        let Some(outcome) = self.engine.tick(ms) else {
            return;
        };
        tracing::info!(moved = outcome.moved, "drag released by time budget");
        self.broadcast_observation();
        if outcome.moved {
            self.start_resolve();
        }
    }

    fn start_resolve(&mut self) {
        if self.engine.begin_resolve() {
            self.resume_at = Some(Instant::now());
        }
    }

    fn advance(&mut self) {
        match self.engine.advance_resolve() {
            ResolveStep::Phase(phase) => {
                let msg = build_cascade(&phase, self.next_seq());
                self.broadcast(&msg);
                self.resume_at =
                    Some(Instant::now() + Duration::from_millis(phase.pause_ms as u64));
            }
            ResolveStep::Done(report) => {
                self.resume_at = None;
                let msg = build_report(&report, self.next_seq());
                self.broadcast(&msg);
                self.broadcast_observation();
            }
            ResolveStep::Aborted => {
                self.resume_at = None;
                tracing::info!("cascade abandoned");
            }
        }
    }

    fn broadcast_observation(&mut self) {
        self.engine.snapshot_into(&mut self.snapshot);
        let seq = self.next_seq();
        let obs = build_observation(&self.snapshot, seq);
        self.broadcast(&obs);
    }

    fn send_to<T: Serialize>(&self, client_id: usize, msg: &T) {
        if let Some(line) = encode(msg) {
            let _ = self.out_tx.send(OutboundMessage::ToClient { client_id, line });
        }
    }

    fn broadcast<T: Serialize>(&self, msg: &T) {
        if let Some(line) = encode(msg) {
            let _ = self.out_tx.send(OutboundMessage::Broadcast { line });
        }
    }
}

fn encode<T: Serialize>(msg: &T) -> Option<String> {
    match serde_json::to_string(msg) {
        Ok(line) => Some(line),
        Err(e) => {
            tracing::warn!(error = %e, "failed to encode message");
            None
        }
    }
}

/// Run the TCP server and the game loop until `shutdown` fires.
pub async fn serve(
    config: ServerConfig,
    engine: Match3Engine,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
    shutdown: oneshot::Receiver<()>,
) -> anyhow::Result<()> {
    let max_pending = config.max_pending_commands.max(1);
    let (cmd_tx, cmd_rx) = mpsc::channel::<InboundCommand>(max_pending);
    let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();

    let game = tokio::spawn(GameLoop::new(engine, out_tx).run(cmd_rx, shutdown));

    tokio::select! {
        res = run_server(config, cmd_tx, out_rx, ready_tx) => res,
        joined = game => {
            joined?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Board, EngineConfig, LengthTierTable, PacingConfig, ScriptedGems, SimpleRng};

    fn engine(move_budget: u32) -> Match3Engine {
        let config = EngineConfig {
            gem_kinds: 3,
            move_budget,
            pacing: PacingConfig::instant(),
            ..EngineConfig::default()
        };
        let board = Board::from_rows(&[&[0, 1, 0, 2], &[1, 0, 2, 1], &[2, 2, 1, 0], &[0, 1, -5, 2]])
            .unwrap();
        Match3Engine::with_board(
            config,
            board,
            LengthTierTable::default(),
            ScriptedGems::new([2, 0, 1, 2, 0, 1]),
            SimpleRng::new(3),
        )
        .unwrap()
    }

    fn command(seq: u64, command: ClientCommand) -> InboundCommand {
        InboundCommand {
            client_id: 1,
            seq,
            payload: InboundPayload::Command(command),
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<OutboundMessage>) -> Vec<serde_json::Value> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            let line = match msg {
                OutboundMessage::ToClient { line, .. } | OutboundMessage::Broadcast { line } => line,
            };
            out.push(serde_json::from_str(&line).unwrap());
        }
        out
    }

    #[test]
    fn test_refusal_codes() {
        let (out_tx, mut out_rx) = mpsc::unbounded_channel();
        let mut game = GameLoop::new(engine(1), out_tx);

        game.handle_command(command(1, ClientCommand::StepDrag(Coord::new(0, 1))));
        game.handle_command(command(2, ClientCommand::BeginDrag(Coord::new(3, 2))));
        let msgs = drain(&mut out_rx);
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0]["reason"], "not_dragging");
        assert_eq!(msgs[1]["code"], "rejected");
        assert_eq!(msgs[1]["reason"], "invalid_start");
    }

    #[test]
    fn test_gesture_acks_and_starts_resolve() {
        let (out_tx, mut out_rx) = mpsc::unbounded_channel();
        let mut game = GameLoop::new(engine(2), out_tx);

        let path: ArrayVec<Coord, MAX_PATH_LEN> =
            [Coord::new(2, 2), Coord::new(1, 2)].into_iter().collect();
        game.handle_command(command(1, ClientCommand::Gesture(path)));
        assert_eq!(game.engine().state(), EngineState::Resolving);
        assert!(game.resume_at.is_some());

        let msgs = drain(&mut out_rx);
        assert_eq!(msgs[0]["type"], "ack");
        assert_eq!(msgs[0]["seq"], 1);
        assert_eq!(msgs[1]["type"], "observation");

        // Input during the cascade is refused with the engine's reason.
        game.handle_command(command(2, ClientCommand::BeginDrag(Coord::new(0, 0))));
        let msgs = drain(&mut out_rx);
        assert_eq!(msgs[0]["reason"], "resolving");

        while game.resume_at.is_some() {
            game.advance();
        }
        assert_eq!(game.engine().state(), EngineState::Idle);
        let msgs = drain(&mut out_rx);
        let types: Vec<&str> = msgs.iter().filter_map(|m| m["type"].as_str()).collect();
        assert_eq!(types.first(), Some(&"cascade"));
        assert_eq!(&types[types.len() - 2..], &["report", "observation"]);
        assert_eq!(msgs[0]["phase"], "scored");
    }

    #[test]
    fn test_snapshot_request_goes_to_one_client() {
        let (out_tx, mut out_rx) = mpsc::unbounded_channel();
        let mut game = GameLoop::new(engine(2), out_tx);
        game.handle_command(InboundCommand {
            client_id: 7,
            seq: 1,
            payload: InboundPayload::SnapshotRequest,
        });
        match out_rx.try_recv().unwrap() {
            OutboundMessage::ToClient { client_id, line } => {
                assert_eq!(client_id, 7);
                assert!(line.contains("\"observation\""));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_shutdown_destroys_engine() {
        let (out_tx, _out_rx) = mpsc::unbounded_channel();
        let (_cmd_tx, cmd_rx) = mpsc::channel(4);
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(GameLoop::new(engine(2), out_tx).run(cmd_rx, stop_rx));
        let _ = stop_tx.send(());
        let engine = task.await.unwrap();
        assert!(engine.is_destroyed());
    }
}
