//! # codebridge - editor pair <-> companion service sync bridge
//!
//! Connects a dual-pane code explorer (one assembly pane, one C source pane)
//! hosted by an application it does not control to a companion reversing tool
//! over a persistent WebSocket, keeps the panes synchronized in both
//! directions, and relays on-demand "extract selected region" requests.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use codebridge::error::RetryPolicy;
//! use codebridge::host::fs::FsWorkspace;
//! use codebridge::status::ConsoleReporter;
//! use codebridge::{transport, Bridge, BridgeCommand, DEFAULT_ENDPOINT};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let host = Arc::new(FsWorkspace::new("func.s", "func.c"));
//!     let link = transport::spawn(DEFAULT_ENDPOINT, RetryPolicy::persistent())?;
//!     let (_commands_tx, commands) = tokio::sync::mpsc::channel::<BridgeCommand>(8);
//!
//!     let mut bridge = Bridge::new(host, Arc::new(ConsoleReporter), link.outbound.clone());
//!     bridge.discover_editors();
//!     bridge.run(link.events, commands).await;
//!     Ok(())
//! }
//! ```

pub mod bridge;
pub mod connection;
pub mod error;
pub mod host;
pub mod protocol;
pub mod registry;
pub mod status;
pub mod transport;

// Re-export the main types for library consumers
pub use bridge::{Bridge, BridgeCommand};
pub use connection::{ConnectionManager, ConnectionState};
pub use error::BridgeError;
pub use protocol::{ExtractOutcome, ExtractStatus, ProtocolMessage};
pub use registry::{EditorKind, EditorPair, EditorRegistry};
pub use status::{Severity, StatusReporter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Well-known local endpoint the companion service listens on.
pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:10241";
