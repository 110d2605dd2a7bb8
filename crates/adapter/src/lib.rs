//! Adapter module - remote play via TCP socket with JSON protocol
//!
//! Lets an external client (a renderer, a bot, a test harness) drive the
//! engine and watch cascades play out with their real pauses.
//!
//! # Protocol Overview
//!
//! The adapter implements a **line-delimited JSON protocol** over TCP:
//!
//! 1. **Connection**: Client connects to TCP socket (default: 127.0.0.1:7878)
//! 2. **Handshake**: Client sends `hello`, server responds with `welcome`
//! 3. **Controller Assignment**: First client to hello becomes the controller
//! 4. **Commanding**: The controller drags gems (`begin_drag`, `step_drag`,
//!    `end_drag`) or sends a whole `gesture` path at once
//! 5. **Streaming**: Every client that asked for it receives `observation`,
//!    `cascade` and `report` messages
//!
//! # Message Types
//!
//! ## Client → Server
//!
//! - **hello**: Initial handshake with client info and requested capabilities
//! - **command**: `op` is one of `begin_drag`, `step_drag`, `end_drag`,
//!   `gesture` or `restart`
//!
//! ## Server → Client
//!
//! - **welcome**: Response to hello with the assigned role
//! - **ack**: The command was applied
//! - **error**: Error response with code and message; engine refusals use
//!   code `rejected` plus a `reason`
//! - **observation**: Board codes, counters and the active drag trail
//! - **cascade**: One pacing point of a resolve (`scored`, `triggered`,
//!   `settled`) and how long to hold it
//! - **report**: Totals once the board is stable again
//!
//! # Environment Variables
//!
//! - `MATCH3_HOST`: Bind address (default: "127.0.0.1")
//! - `MATCH3_PORT`: Port number (default: 7878)
//! - `MATCH3_MAX_PENDING`: Command queue depth before `backpressure`
//! - `MATCH3_CONFIG`: Path to a JSON [`GameConfigFile`]
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Server: {"type":"hello","seq":1,"ts":0,"client":{"name":"bot","version":"1.0.0"},"protocol_version":"1.0.0"}
//! Server -> Client: {"type":"welcome","seq":1,"ts":0,"protocol_version":"1.0.0","client_id":1,"role":"controller",...}
//! Server -> Client: {"type":"observation","seq":1,"ts":0,"state":"idle","rows":8,"cols":8,"cells":[[...]],...}
//! Client -> Server: {"type":"command","seq":2,"ts":0,"op":"gesture","path":[[2,2],[1,2]]}
//! Server -> Client: {"type":"ack","seq":2,"ts":0,"status":"ok"}
//! Server -> Client: {"type":"cascade","seq":3,"ts":0,"pass":1,"phase":"scored","pause_ms":250,...}
//! ```

pub mod config;
pub mod protocol;
pub mod runtime;
pub mod server;

pub use gem_cascade_core as core;
pub use gem_cascade_engine as engine;
pub use gem_cascade_types as types;

pub use config::GameConfigFile;
pub use protocol::*;
pub use runtime::{
    serve, ClientCommand, GameLoop, InboundCommand, InboundPayload, OutboundMessage, Refusal,
};
pub use server::*;
