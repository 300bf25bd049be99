//! File-backed host workspace for the headless CLI.
//!
//! Two local files stand in for the assembly and source panes so the bridge
//! can run against a companion service without a browser host. Reads and
//! writes go straight through to disk. Selections do not exist here, so
//! extraction is unavailable and fails with a clean error.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;

use super::{EditorBuffer, EditorInstance, HostWorkspace, Placeholder, MODE_ASSEMBLY, MODE_SOURCE};

/// A buffer whose content lives in a file.
pub struct FileBuffer {
    path: PathBuf,
}

impl FileBuffer {
    pub fn new(path: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self { path: path.into() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EditorBuffer for FileBuffer {
    fn text(&self) -> String {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %self.path.display(), "read failed: {e}");
                String::new()
            }
        }
    }

    fn set_text(&self, text: &str) {
        if let Err(e) = std::fs::write(&self.path, text) {
            warn!(path = %self.path.display(), "write failed: {e}");
        }
    }
}

/// Host workspace backed by one assembly file and one source file.
pub struct FsWorkspace {
    assembly: Arc<FileBuffer>,
    source: Arc<FileBuffer>,
}

impl FsWorkspace {
    pub fn new(assembly: impl Into<PathBuf>, source: impl Into<PathBuf>) -> Self {
        Self {
            assembly: FileBuffer::new(assembly),
            source: FileBuffer::new(source),
        }
    }
}

impl HostWorkspace for FsWorkspace {
    fn editors(&self) -> Option<Vec<EditorInstance>> {
        Some(vec![
            EditorInstance {
                mode: MODE_ASSEMBLY.to_string(),
                buffer: self.assembly.clone(),
            },
            EditorInstance {
                mode: MODE_SOURCE.to_string(),
                buffer: self.source.clone(),
            },
        ])
    }

    fn placeholders(&self) -> Vec<Placeholder> {
        Vec::new()
    }

    fn resolve(&self, _uri: &str) -> Option<Arc<dyn EditorBuffer>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_buffer_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("func.c");
        std::fs::write(&path, "int x;").unwrap();

        let buffer = FileBuffer::new(&path);
        assert_eq!(buffer.text(), "int x;");

        buffer.set_text("int y;");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "int y;");
    }

    #[test]
    fn file_buffer_has_no_selection() {
        let dir = tempfile::tempdir().unwrap();
        let buffer = FileBuffer::new(dir.path().join("func.c"));
        assert!(buffer.selection().is_none());
        assert!(!buffer.replace_selection("x"));
    }

    #[test]
    fn workspace_enumerates_both_panes() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = FsWorkspace::new(dir.path().join("a.s"), dir.path().join("a.c"));
        let editors = workspace.editors().unwrap();
        assert_eq!(editors.len(), 2);
        assert_eq!(editors[0].mode, MODE_ASSEMBLY);
        assert_eq!(editors[1].mode, MODE_SOURCE);
    }
}
