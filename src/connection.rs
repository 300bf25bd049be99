//! Connection lifecycle for the channel to the companion service.
//!
//! One logical connection at a time. Transitions follow a fixed machine:
//!
//! ```text
//! Disconnected -> Connecting -> Connected
//!                     |             |
//!                     v             v
//!                  Failed(r)     Failed(r)
//! ```
//!
//! Failed and Disconnected are terminal for the current attempt; the
//! transport's retry loop (or an explicit new `start`) re-enters from
//! Connecting. Every transition is announced through the status reporter.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::status::{Severity, StatusReporter};

/// Current state of the channel to the companion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed(String),
}

/// Owns the connection state; only this type may drive transitions.
pub struct ConnectionManager {
    reporter: Arc<dyn StatusReporter>,
    state_tx: watch::Sender<ConnectionState>,
}

impl ConnectionManager {
    pub fn new(reporter: Arc<dyn StatusReporter>) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self { reporter, state_tx }
    }

    pub fn state(&self) -> ConnectionState {
        self.state_tx.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        matches!(*self.state_tx.borrow(), ConnectionState::Connected)
    }

    /// Watch state changes, for status surfaces outside the engine.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Begin a connection attempt. Legal from Disconnected or Failed.
    pub fn start(&self) {
        match self.state() {
            ConnectionState::Disconnected | ConnectionState::Failed(_) => {
                self.set(ConnectionState::Connecting);
                self.reporter
                    .report("Connecting to companion service...", Severity::Success);
            }
            other => warn!(?other, "start ignored in state"),
        }
    }

    /// Transport reports the channel is open. Returns true when the machine
    /// entered Connected; the caller then announces itself on the wire.
    pub fn on_connected(&self) -> bool {
        if self.state() != ConnectionState::Connecting {
            warn!("connect signal outside Connecting ignored");
            return false;
        }
        self.set(ConnectionState::Connected);
        self.reporter.report("Connected", Severity::Success);
        true
    }

    /// Transport failed to open the channel.
    pub fn on_connect_error(&self, reason: &str) {
        if self.state() != ConnectionState::Connecting {
            warn!(reason, "connect error outside Connecting ignored");
            return;
        }
        self.set(ConnectionState::Failed(reason.to_string()));
        self.reporter.report("Connection failed", Severity::Error);
    }

    /// An open channel dropped unexpectedly.
    pub fn on_disconnected(&self, reason: &str) {
        if self.state() != ConnectionState::Connected {
            warn!(reason, "disconnect outside Connected ignored");
            return;
        }
        self.set(ConnectionState::Failed(reason.to_string()));
        self.reporter.report("Disconnected", Severity::Error);
    }

    fn set(&self, next: ConnectionState) {
        debug!(?next, "connection state");
        self.state_tx.send_replace(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::testing::RecordingReporter;

    fn manager() -> (ConnectionManager, Arc<RecordingReporter>) {
        let reporter = Arc::new(RecordingReporter::default());
        (ConnectionManager::new(reporter.clone()), reporter)
    }

    #[test]
    fn happy_path_reaches_connected() {
        let (conn, reporter) = manager();
        assert_eq!(conn.state(), ConnectionState::Disconnected);

        conn.start();
        assert_eq!(conn.state(), ConnectionState::Connecting);

        assert!(conn.on_connected());
        assert!(conn.is_connected());
        assert_eq!(reporter.successes().last().unwrap(), "Connected");
    }

    #[test]
    fn connect_error_fails_the_attempt() {
        let (conn, reporter) = manager();
        conn.start();
        conn.on_connect_error("connection refused");

        assert_eq!(
            conn.state(),
            ConnectionState::Failed("connection refused".into())
        );
        assert_eq!(reporter.errors(), vec!["Connection failed"]);
    }

    #[test]
    fn drop_after_connected_fails_the_attempt() {
        let (conn, reporter) = manager();
        conn.start();
        conn.on_connected();
        conn.on_disconnected("closed by peer");

        assert_eq!(conn.state(), ConnectionState::Failed("closed by peer".into()));
        assert_eq!(reporter.errors(), vec!["Disconnected"]);
    }

    #[test]
    fn retry_reenters_from_connecting() {
        let (conn, _) = manager();
        conn.start();
        conn.on_connect_error("unreachable");

        conn.start();
        assert_eq!(conn.state(), ConnectionState::Connecting);
        assert!(conn.on_connected());
    }

    #[test]
    fn illegal_edges_are_ignored() {
        let (conn, _) = manager();

        // connect signal without an attempt
        assert!(!conn.on_connected());
        assert_eq!(conn.state(), ConnectionState::Disconnected);

        // disconnect without being connected
        conn.on_disconnected("whatever");
        assert_eq!(conn.state(), ConnectionState::Disconnected);

        // double start
        conn.start();
        conn.start();
        assert_eq!(conn.state(), ConnectionState::Connecting);

        // connect error after already connected
        conn.on_connected();
        conn.on_connect_error("late");
        assert!(conn.is_connected());
    }

    #[test]
    fn watchers_observe_transitions() {
        let (conn, _) = manager();
        let rx = conn.subscribe();

        conn.start();
        conn.on_connected();
        assert_eq!(*rx.borrow(), ConnectionState::Connected);
    }
}
