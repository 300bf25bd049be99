//! Editor discovery and handle tracking.
//!
//! Finds the assembly and source panes among everything the host exposes and
//! binds them into an [`EditorPair`]. Handles are weak: the host owns the
//! buffers, and a pane the host has discarded fails cleanly on use instead of
//! corrupting state. A discovery pass either binds both kinds or leaves the
//! registry empty; there is no partial pair.

use std::fmt;
use std::sync::{Arc, Weak};

use tracing::debug;

use crate::error::BridgeError;
use crate::host::{EditorBuffer, EditorInstance, HostWorkspace, MODE_ASSEMBLY, MODE_SOURCE};

/// The two pane kinds the bridge cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorKind {
    Assembly,
    Source,
}

impl fmt::Display for EditorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorKind::Assembly => f.write_str("asm"),
            EditorKind::Source => f.write_str("c"),
        }
    }
}

/// Weak handle to one discovered buffer.
#[derive(Debug, Clone)]
pub struct EditorHandle {
    kind: EditorKind,
    buffer: Weak<dyn EditorBuffer>,
}

impl EditorHandle {
    fn bind(kind: EditorKind, buffer: &Arc<dyn EditorBuffer>) -> Self {
        Self {
            kind,
            buffer: Arc::downgrade(buffer),
        }
    }

    pub fn kind(&self) -> EditorKind {
        self.kind
    }

    /// Upgrade to the live buffer; fails when the host discarded it.
    pub fn buffer(&self) -> Result<Arc<dyn EditorBuffer>, BridgeError> {
        self.buffer
            .upgrade()
            .ok_or(BridgeError::BufferGone(self.kind))
    }
}

/// The two handles bound by one discovery pass.
#[derive(Debug, Clone)]
pub struct EditorPair {
    pub assembly: EditorHandle,
    pub source: EditorHandle,
}

impl EditorPair {
    pub fn handle(&self, kind: EditorKind) -> &EditorHandle {
        match kind {
            EditorKind::Assembly => &self.assembly,
            EditorKind::Source => &self.source,
        }
    }
}

/// Owns the current editor pair, if any.
#[derive(Debug, Default)]
pub struct EditorRegistry {
    pair: Option<EditorPair>,
}

impl EditorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pair(&self) -> Option<&EditorPair> {
        self.pair.as_ref()
    }

    /// Handle of `kind`, or the precondition error every protocol operation
    /// reports before discovery has succeeded.
    pub fn handle(&self, kind: EditorKind) -> Result<&EditorHandle, BridgeError> {
        self.pair
            .as_ref()
            .map(|pair| pair.handle(kind))
            .ok_or(BridgeError::EditorNotFound(kind))
    }

    /// Run a discovery pass against the host.
    ///
    /// The previous pair is dropped up front: after a failed pass the
    /// registry exposes nothing, and a re-discovery never reuses stale
    /// handles from an earlier host object graph.
    pub fn discover(&mut self, host: &dyn HostWorkspace) -> Result<(), BridgeError> {
        self.pair = None;
        let pair = match host.editors() {
            Some(instances) => Self::from_instances(instances)?,
            None => Self::from_placeholders(host)?,
        };
        debug!("bound asm and c editors");
        self.pair = Some(pair);
        Ok(())
    }

    /// Enumeration strategy: classify live instances by their mode tag.
    fn from_instances(instances: Vec<EditorInstance>) -> Result<EditorPair, BridgeError> {
        let mut assembly: Option<Arc<dyn EditorBuffer>> = None;
        let mut source: Option<Arc<dyn EditorBuffer>> = None;

        for instance in instances {
            match instance.mode.as_str() {
                MODE_ASSEMBLY => {
                    if assembly.is_some() {
                        return Err(BridgeError::DuplicateEditor(EditorKind::Assembly));
                    }
                    assembly = Some(instance.buffer);
                }
                MODE_SOURCE => {
                    if source.is_some() {
                        return Err(BridgeError::DuplicateEditor(EditorKind::Source));
                    }
                    source = Some(instance.buffer);
                }
                _ => {}
            }
        }

        Self::build_pair(assembly, source)
    }

    /// Placeholder-scan strategy: walk mode-tagged nodes in document order
    /// and resolve the bound URIs through the host's model lookup.
    ///
    /// The host pairs each source pane positionally with a companion
    /// low-level pane right after it; the `ignore_next_assembly` flag skips
    /// that companion so the next unskipped assembly node is the one bound.
    fn from_placeholders(host: &dyn HostWorkspace) -> Result<EditorPair, BridgeError> {
        let mut assembly_uri: Option<String> = None;
        let mut source_uri: Option<String> = None;
        let mut ignore_next_assembly = false;

        for node in host.placeholders() {
            match node.mode.as_str() {
                MODE_ASSEMBLY => {
                    if ignore_next_assembly {
                        ignore_next_assembly = false;
                        continue;
                    }
                    if assembly_uri.is_some() {
                        return Err(BridgeError::DuplicateEditor(EditorKind::Assembly));
                    }
                    debug!(uri = %node.uri, "asm placeholder bound");
                    assembly_uri = Some(node.uri);
                }
                MODE_SOURCE => {
                    if source_uri.is_some() {
                        return Err(BridgeError::DuplicateEditor(EditorKind::Source));
                    }
                    debug!(uri = %node.uri, "c placeholder bound");
                    source_uri = Some(node.uri);
                    ignore_next_assembly = true;
                }
                _ => {}
            }
        }

        let assembly = Self::resolve_uri(host, assembly_uri)?;
        let source = Self::resolve_uri(host, source_uri)?;
        Self::build_pair(assembly, source)
    }

    fn resolve_uri(
        host: &dyn HostWorkspace,
        uri: Option<String>,
    ) -> Result<Option<Arc<dyn EditorBuffer>>, BridgeError> {
        match uri {
            Some(uri) => {
                let buffer = host.resolve(&uri).ok_or(BridgeError::UnresolvedUri(uri))?;
                Ok(Some(buffer))
            }
            None => Ok(None),
        }
    }

    fn build_pair(
        assembly: Option<Arc<dyn EditorBuffer>>,
        source: Option<Arc<dyn EditorBuffer>>,
    ) -> Result<EditorPair, BridgeError> {
        match (assembly, source) {
            (Some(assembly), Some(source)) => Ok(EditorPair {
                assembly: EditorHandle::bind(EditorKind::Assembly, &assembly),
                source: EditorHandle::bind(EditorKind::Source, &source),
            }),
            (assembly, source) => {
                let mut missing = Vec::new();
                if assembly.is_none() {
                    missing.push(EditorKind::Assembly);
                }
                if source.is_none() {
                    missing.push(EditorKind::Source);
                }
                Err(BridgeError::EditorsMissing(missing))
            }
        }
    }
}
