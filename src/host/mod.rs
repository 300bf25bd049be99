//! Host environment capabilities consumed by the bridge.
//!
//! The bridge never owns the editor buffers; the host application does.
//! These traits describe the two ways a host can expose them: a live list of
//! editor instances, or a flat set of mode-tagged placeholder nodes plus a
//! URI-to-model lookup. Discovery prefers the first and falls back to the
//! second.

use std::sync::Arc;

pub mod fs;
pub mod memory;

/// Content-mode tag carried by assembly panes.
pub const MODE_ASSEMBLY: &str = "asm";

/// Content-mode tag carried by the editable source pane. The host gives that
/// pane a dedicated marker mode so it can be told apart from any other
/// C-mode editor on the page.
pub const MODE_SOURCE: &str = "nc";

/// One live text buffer owned by the host.
///
/// Selections only exist on the source pane; hosts that cannot express them
/// return `None` / `false` and the engine surfaces that as a clean error.
pub trait EditorBuffer: Send + Sync {
    /// Current buffer content.
    fn text(&self) -> String;

    /// Replace the entire buffer content.
    fn set_text(&self, text: &str);

    /// Currently selected text, if the host supports selections. An empty
    /// string is a collapsed cursor, `None` means no selection capability.
    fn selection(&self) -> Option<String> {
        None
    }

    /// Replace the selected range with `text` (insert at the cursor when the
    /// selection is collapsed). Returns false when the host cannot express
    /// selections.
    fn replace_selection(&self, _text: &str) -> bool {
        false
    }
}

/// An editor instance from the host's live enumeration.
#[derive(Clone)]
pub struct EditorInstance {
    /// Declared content-mode tag.
    pub mode: String,
    /// The instance's backing buffer.
    pub buffer: Arc<dyn EditorBuffer>,
}

/// A placeholder node from the host's fallback DOM-like view, in document
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Declared content-mode tag.
    pub mode: String,
    /// URI that resolves to the backing buffer model.
    pub uri: String,
}

impl Placeholder {
    pub fn new(mode: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            uri: uri.into(),
        }
    }
}

/// The host application, seen through its discovery capabilities.
pub trait HostWorkspace: Send + Sync {
    /// Live editor instances, when the host can enumerate them. `None` means
    /// the capability is unavailable and discovery falls back to
    /// [`placeholders`](Self::placeholders).
    fn editors(&self) -> Option<Vec<EditorInstance>>;

    /// Placeholder nodes in document order.
    fn placeholders(&self) -> Vec<Placeholder>;

    /// Resolve a placeholder URI to its live buffer model.
    fn resolve(&self, uri: &str) -> Option<Arc<dyn EditorBuffer>>;
}
