//! Niri IPC client for compositor integration
//!
//! This crate provides communication with the niri compositor via its IPC socket.
//! It enables niri-helpers to:
//! - Query windows, workspaces and the focused window
//! - Send layout actions (focus, move, resize, float)
//! - Subscribe to window events for the dynamic float daemon
//!
//! ## Architecture
//!
//! - `NiriClient`: Request/response client over a [`Transport`]
//! - `SocketTransport`: One connection per request, bounded by a timeout
//! - `EventStream`: Long-lived subscription yielding decoded [`Event`]s
//! - `NiriError`: Error types for IPC operations
//!
//! ## Protocol
//!
//! Niri exposes a Unix socket at `$NIRI_SOCKET`. Clients send JSON-formatted
//! requests (one per line) and receive one JSON reply line.
//!
//! For event streaming, send `"EventStream"` to initiate continuous
//! event delivery until the connection closes.

mod action;
mod client;
mod error;
mod events;
mod transport;
mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use action::{Action, PositionChange, SizeChange, WorkspaceReference};
pub use client::NiriClient;
pub use error::NiriError;
pub use events::{Event, EventStream, DEFAULT_MAX_RETRIES};
pub use transport::{get_socket_path, SocketTransport, Transport, REQUEST_TIMEOUT};
pub use types::{Window, WindowLayout, Workspace};
