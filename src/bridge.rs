//! The sync engine: binds protocol traffic to the editor pair.
//!
//! Inbound frames mutate the discovered buffers; local actions read them and
//! emit frames. Everything runs on one task, one event at a time, so handlers
//! never interleave. A message that needs an editor before discovery has
//! succeeded is dropped with an error, never queued; an outbound attempt
//! while the channel is down is an error, never buffered.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::connection::ConnectionManager;
use crate::error::BridgeError;
use crate::host::{EditorBuffer, HostWorkspace};
use crate::protocol::{ExtractOutcome, ExtractStatus, ProtocolMessage};
use crate::registry::{EditorKind, EditorRegistry};
use crate::status::{Severity, StatusReporter};
use crate::transport::TransportEvent;

/// Local actions forwarded into the engine (keyboard-shortcut wiring and the
/// like lives outside and only sends these).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeCommand {
    /// Send the source pane's selection to the companion for extraction.
    ExtractSelection,
    /// Re-run editor discovery against the host.
    Rediscover,
}

/// Ties the host workspace, the connection machine and the wire together.
pub struct Bridge {
    host: Arc<dyn HostWorkspace>,
    registry: EditorRegistry,
    connection: ConnectionManager,
    reporter: Arc<dyn StatusReporter>,
    outbound: mpsc::Sender<String>,
}

impl Bridge {
    pub fn new(
        host: Arc<dyn HostWorkspace>,
        reporter: Arc<dyn StatusReporter>,
        outbound: mpsc::Sender<String>,
    ) -> Self {
        let connection = ConnectionManager::new(reporter.clone());
        Self {
            host,
            registry: EditorRegistry::new(),
            connection,
            reporter,
            outbound,
        }
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Locate the editor pair in the host. A failure is reported and leaves
    /// the engine without a pair; inbound traffic is dropped until a pass
    /// succeeds.
    pub fn discover_editors(&mut self) {
        if let Err(e) = self.registry.discover(self.host.as_ref()) {
            self.fail(&e);
        }
    }

    /// Drive the engine until the transport or command channel closes.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<TransportEvent>,
        mut commands: mpsc::Receiver<BridgeCommand>,
    ) {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_transport(event).await,
                    None => break,
                },
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
            }
        }
        debug!("bridge loop finished");
    }

    async fn handle_transport(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connecting => self.connection.start(),
            TransportEvent::Opened => {
                if self.connection.on_connected() {
                    self.send(ProtocolMessage::ClientConnected).await;
                }
            }
            TransportEvent::Frame(frame) => match ProtocolMessage::decode(&frame) {
                Ok(message) => self.handle_message(message).await,
                Err(e) => self.fail(&BridgeError::BadFrame(e)),
            },
            TransportEvent::ConnectFailed(reason) => self.connection.on_connect_error(&reason),
            TransportEvent::Closed(reason) => self.connection.on_disconnected(&reason),
        }
    }

    async fn handle_command(&mut self, command: BridgeCommand) {
        match command {
            BridgeCommand::ExtractSelection => {
                if let Err(e) = self.extract_selection().await {
                    self.fail(&e);
                }
            }
            BridgeCommand::Rediscover => self.discover_editors(),
        }
    }

    /// Inbound dispatch. Every arm needs its editor handle already bound.
    async fn handle_message(&mut self, message: ProtocolMessage) {
        let event = message.event();
        debug!(event, "inbound");
        let result = match message {
            ProtocolMessage::AsmCode(text) => self.overwrite(EditorKind::Assembly, &text),
            ProtocolMessage::CCode(text) => self.overwrite(EditorKind::Source, &text),
            ProtocolMessage::AddCCode(text) => self.append_source(&text),
            ProtocolMessage::RequestCCode => self.send_source_code().await,
            ProtocolMessage::ExtractedData(outcome) => self.apply_extraction(outcome),
            ProtocolMessage::ClientConnected | ProtocolMessage::ExtractData(_) => {
                warn!(event, "client-to-server event received, dropped");
                Ok(())
            }
        };
        if let Err(e) = result {
            self.fail(&e);
        }
    }

    fn overwrite(&self, kind: EditorKind, text: &str) -> Result<(), BridgeError> {
        self.buffer(kind)?.set_text(text);
        self.reporter.report("Received code", Severity::Success);
        Ok(())
    }

    fn append_source(&self, text: &str) -> Result<(), BridgeError> {
        let buffer = self.buffer(EditorKind::Source)?;
        let mut content = buffer.text();
        content.push_str(text);
        buffer.set_text(&content);
        self.reporter.report("Received code", Severity::Success);
        Ok(())
    }

    async fn send_source_code(&self) -> Result<(), BridgeError> {
        let content = self.buffer(EditorKind::Source)?.text();
        self.send_connected(ProtocolMessage::CCode(content)).await?;
        self.reporter.report("Sent code", Severity::Success);
        Ok(())
    }

    fn apply_extraction(&self, outcome: ExtractOutcome) -> Result<(), BridgeError> {
        match outcome.status {
            ExtractStatus::Ok => {
                let buffer = self.buffer(EditorKind::Source)?;
                if !buffer.replace_selection(&outcome.text) {
                    return Err(BridgeError::SelectionUnsupported);
                }
                self.reporter
                    .report("Received extracted data", Severity::Success);
                Ok(())
            }
            ExtractStatus::Error => Err(BridgeError::ExtractionFailed(outcome.text)),
        }
    }

    /// Local extraction trigger: read the source selection and ship it.
    /// An empty selection fails here and nothing reaches the wire.
    async fn extract_selection(&self) -> Result<(), BridgeError> {
        let buffer = self.buffer(EditorKind::Source)?;
        let selection = buffer.selection().ok_or(BridgeError::SelectionUnsupported)?;
        if selection.is_empty() {
            return Err(BridgeError::NothingSelected);
        }
        self.send_connected(ProtocolMessage::ExtractData(selection))
            .await?;
        self.reporter.report("Sent selection", Severity::Success);
        Ok(())
    }

    fn buffer(&self, kind: EditorKind) -> Result<Arc<dyn EditorBuffer>, BridgeError> {
        self.registry.handle(kind)?.buffer()
    }

    /// Outbound send gated on the connected state. Nothing is ever queued
    /// while the channel is down.
    async fn send_connected(&self, message: ProtocolMessage) -> Result<(), BridgeError> {
        if !self.connection.is_connected() {
            return Err(BridgeError::NotConnected);
        }
        self.send(message).await;
        Ok(())
    }

    async fn send(&self, message: ProtocolMessage) {
        match message.encode() {
            Ok(frame) => {
                if self.outbound.send(frame).await.is_err() {
                    warn!("transport outbound channel closed");
                }
            }
            Err(e) => error!("failed to encode {}: {e}", message.event()),
        }
    }

    fn fail(&self, err: &BridgeError) {
        error!("{err}");
        self.reporter
            .report(&format!("Error: {err}"), Severity::Error);
    }
}
