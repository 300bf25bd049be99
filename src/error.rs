//! Bridge error taxonomy and transport retry policy.
//!
//! Three error families matter to the engine: discovery errors (the editor
//! pair could not be resolved), connection errors (the channel is down), and
//! protocol precondition errors (a message or local action arrived before the
//! handle it needs exists). All of them are handled where they occur and
//! converted into a status report; none of them abort the bridge.

use std::time::Duration;

use thiserror::Error;

use crate::registry::EditorKind;

/// Everything that can go wrong inside the bridge engine.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Discovery found a second editor of a kind that is already bound.
    #[error("found more than one {0} editor")]
    DuplicateEditor(EditorKind),

    /// Discovery finished without locating every required editor kind.
    #[error("could not find {}", join_kinds(.0))]
    EditorsMissing(Vec<EditorKind>),

    /// A bound placeholder URI did not resolve to a live buffer model.
    #[error("no buffer model found for uri {0}")]
    UnresolvedUri(String),

    /// A message or action needs an editor that is not yet discovered.
    #[error("{0} editor not yet found")]
    EditorNotFound(EditorKind),

    /// The host discarded a buffer after discovery bound it.
    #[error("{0} editor buffer is gone")]
    BufferGone(EditorKind),

    /// Extraction was triggered while nothing is selected.
    #[error("nothing selected")]
    NothingSelected,

    /// The current host cannot express selections at all.
    #[error("selections are not supported by this editor host")]
    SelectionUnsupported,

    /// An outbound message was attempted while the channel is down.
    #[error("not connected to companion service")]
    NotConnected,

    /// An inbound frame did not parse as a protocol message.
    #[error("malformed frame: {0}")]
    BadFrame(#[from] serde_json::Error),

    /// The companion service reported an extraction failure.
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),
}

fn join_kinds(kinds: &[EditorKind]) -> String {
    let names: Vec<String> = kinds.iter().map(|k| format!("{k} editor")).collect();
    names.join(" and ")
}

/// Retry policy for the transport's reconnect loop.
///
/// Lives outside the connection state machine: every attempt it makes
/// re-enters the machine from Connecting.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of connection attempts.
    pub max_attempts: u32,

    /// Delay before the first retry.
    pub initial_delay: Duration,

    /// Exponential backoff multiplier.
    pub backoff_multiplier: f64,

    /// Ceiling for the delay between retries.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Keep dialing until the bridge shuts down.
    pub fn persistent() -> Self {
        Self {
            max_attempts: u32::MAX,
            initial_delay: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(10),
        }
    }

    /// Next backoff delay after `current`, clamped to `max_delay`.
    pub fn next_delay(&self, current: Duration) -> Duration {
        Duration::from_secs_f64(
            (current.as_secs_f64() * self.backoff_multiplier).min(self.max_delay.as_secs_f64()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_kinds_are_named() {
        let err = BridgeError::EditorsMissing(vec![EditorKind::Assembly, EditorKind::Source]);
        assert_eq!(err.to_string(), "could not find asm editor and c editor");

        let err = BridgeError::EditorsMissing(vec![EditorKind::Source]);
        assert_eq!(err.to_string(), "could not find c editor");
    }

    #[test]
    fn backoff_is_clamped() {
        let policy = RetryPolicy::default();
        let mut delay = policy.initial_delay;
        for _ in 0..20 {
            delay = policy.next_delay(delay);
        }
        assert_eq!(delay, policy.max_delay);
    }
}
