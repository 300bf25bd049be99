//! In-memory host workspace.
//!
//! Backs the tests and any embedder that wants to drive the bridge without a
//! real editor host. Buffers keep their text plus a selected byte range.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{EditorBuffer, EditorInstance, HostWorkspace, Placeholder};

#[derive(Default)]
struct BufferState {
    text: String,
    /// Selected byte range, collapsed when start == end.
    selection: (usize, usize),
}

/// A text buffer with an explicit selection, like an editor pane.
pub struct MemoryBuffer {
    state: Mutex<BufferState>,
}

impl MemoryBuffer {
    pub fn new(text: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(BufferState {
                text: text.into(),
                selection: (0, 0),
            }),
        })
    }

    /// Select the byte range between `start` and `end`, given in either
    /// order. Both ends are clamped to the text and snapped down to char
    /// boundaries, so any pair of offsets is a valid selection.
    pub fn select(&self, start: usize, end: usize) {
        let mut state = self.state.lock();
        let lo = floor_char_boundary(&state.text, start.min(end));
        let hi = floor_char_boundary(&state.text, start.max(end));
        state.selection = (lo, hi);
    }

    /// Select the first occurrence of `needle`. Returns false when absent.
    pub fn select_str(&self, needle: &str) -> bool {
        let mut state = self.state.lock();
        match state.text.find(needle) {
            Some(start) => {
                state.selection = (start, start + needle.len());
                true
            }
            None => false,
        }
    }
}

impl EditorBuffer for MemoryBuffer {
    fn text(&self) -> String {
        self.state.lock().text.clone()
    }

    fn set_text(&self, text: &str) {
        let mut state = self.state.lock();
        state.text = text.to_string();
        state.selection = (0, 0);
    }

    fn selection(&self) -> Option<String> {
        let state = self.state.lock();
        let (start, end) = state.selection;
        Some(state.text[start..end].to_string())
    }

    fn replace_selection(&self, text: &str) -> bool {
        let mut state = self.state.lock();
        let (start, end) = state.selection;
        state.text.replace_range(start..end, text);
        let caret = start + text.len();
        state.selection = (caret, caret);
        true
    }
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// A scriptable host exposing either discovery capability.
#[derive(Default)]
pub struct MemoryWorkspace {
    editors: Mutex<Vec<EditorInstance>>,
    placeholders: Mutex<Vec<Placeholder>>,
    models: Mutex<HashMap<String, Arc<dyn EditorBuffer>>>,
    enumerable: bool,
}

impl MemoryWorkspace {
    /// A host that exposes a live editor list.
    pub fn new() -> Self {
        Self {
            enumerable: true,
            ..Default::default()
        }
    }

    /// A host that only exposes placeholder nodes and a model lookup.
    pub fn without_enumeration() -> Self {
        Self::default()
    }

    /// Add a live editor instance (enumeration strategy).
    pub fn add_editor(&self, mode: impl Into<String>, buffer: Arc<dyn EditorBuffer>) {
        self.editors.lock().push(EditorInstance {
            mode: mode.into(),
            buffer,
        });
    }

    /// Add a placeholder node and register its backing model.
    pub fn add_placeholder(
        &self,
        mode: impl Into<String>,
        uri: impl Into<String>,
        buffer: Arc<dyn EditorBuffer>,
    ) {
        let uri = uri.into();
        self.placeholders
            .lock()
            .push(Placeholder::new(mode, uri.clone()));
        self.models.lock().insert(uri, buffer);
    }

    /// Add a placeholder whose URI resolves to nothing.
    pub fn add_dangling_placeholder(&self, mode: impl Into<String>, uri: impl Into<String>) {
        self.placeholders.lock().push(Placeholder::new(mode, uri));
    }

    /// Drop every editor and model, as a host does when panes close.
    pub fn clear(&self) {
        self.editors.lock().clear();
        self.placeholders.lock().clear();
        self.models.lock().clear();
    }
}

impl HostWorkspace for MemoryWorkspace {
    fn editors(&self) -> Option<Vec<EditorInstance>> {
        if self.enumerable {
            Some(self.editors.lock().clone())
        } else {
            None
        }
    }

    fn placeholders(&self) -> Vec<Placeholder> {
        self.placeholders.lock().clone()
    }

    fn resolve(&self, uri: &str) -> Option<Arc<dyn EditorBuffer>> {
        self.models.lock().get(uri).cloned()
    }
}
