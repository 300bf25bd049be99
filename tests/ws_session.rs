//! End-to-end bridge session against a local WebSocket listener playing the
//! companion service.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;

use codebridge::error::RetryPolicy;
use codebridge::host::memory::{MemoryBuffer, MemoryWorkspace};
use codebridge::host::{EditorBuffer, MODE_ASSEMBLY, MODE_SOURCE};
use codebridge::status::{Severity, StatusReporter};
use codebridge::{transport, Bridge, BridgeCommand};

struct NullReporter;

impl StatusReporter for NullReporter {
    fn report(&self, _: &str, _: Severity) {}
}

async fn next_text<S>(source: &mut S) -> String
where
    S: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let message = timeout(Duration::from_secs(5), source.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("ws error");
        if let Message::Text(text) = message {
            return text.to_string();
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn session_syncs_and_extracts() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let asm = MemoryBuffer::new("");
    let src = MemoryBuffer::new("int x;");
    let workspace = Arc::new(MemoryWorkspace::new());
    workspace.add_editor(MODE_ASSEMBLY, asm.clone());
    workspace.add_editor(MODE_SOURCE, src.clone());

    let link = transport::spawn(&format!("ws://{addr}"), RetryPolicy::no_retry()).unwrap();
    let (commands_tx, commands) = mpsc::channel(8);
    let mut bridge = Bridge::new(workspace, Arc::new(NullReporter), link.outbound.clone());
    bridge.discover_editors();
    let engine = tokio::spawn(bridge.run(link.events, commands));

    // companion side of the socket
    let (stream, _) = listener.accept().await.unwrap();
    let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
    let (mut sink, mut source) = ws.split();

    // the bridge announces itself once connected
    assert_eq!(next_text(&mut source).await, r#"{"event":"client_connected"}"#);

    // push assembly, then append to the source pane
    sink.send(Message::Text(
        r#"{"event":"asm_code","data":"MOV R0"}"#.into(),
    ))
    .await
    .unwrap();
    sink.send(Message::Text(
        r#"{"event":"add_c_code","data":" y;"}"#.into(),
    ))
    .await
    .unwrap();
    sleep(Duration::from_millis(200)).await;
    assert_eq!(asm.text(), "MOV R0");
    assert_eq!(src.text(), "int x; y;");

    // ask for the source pane content back
    sink.send(Message::Text(r#"{"event":"request_c_code"}"#.into()))
        .await
        .unwrap();
    assert_eq!(
        next_text(&mut source).await,
        r#"{"event":"c_code","data":"int x; y;"}"#
    );

    // local extraction of the appended region
    assert!(src.select_str(" y;"));
    commands_tx
        .send(BridgeCommand::ExtractSelection)
        .await
        .unwrap();
    assert_eq!(
        next_text(&mut source).await,
        r#"{"event":"extract_data","data":" y;"}"#
    );

    // the companion's reply replaces exactly the selected region
    sink.send(Message::Text(
        r#"{"event":"extracted_data","data":{"status":"ok","text":" int y;"}}"#.into(),
    ))
    .await
    .unwrap();
    sleep(Duration::from_millis(200)).await;
    assert_eq!(src.text(), "int x; int y;");

    drop(commands_tx);
    let _ = timeout(Duration::from_secs(2), engine).await;
    link.task.abort();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreachable_endpoint_reports_failure() {
    use codebridge::ConnectionState;

    // no listener on this port
    let link = transport::spawn("ws://127.0.0.1:1", RetryPolicy::no_retry()).unwrap();

    let workspace = Arc::new(MemoryWorkspace::new());
    workspace.add_editor(MODE_ASSEMBLY, MemoryBuffer::new(""));
    workspace.add_editor(MODE_SOURCE, MemoryBuffer::new(""));

    let (commands_tx, commands) = mpsc::channel(8);
    let mut bridge = Bridge::new(workspace, Arc::new(NullReporter), link.outbound.clone());
    bridge.discover_editors();
    let mut states = bridge.connection().subscribe();
    let engine = tokio::spawn(bridge.run(link.events, commands));

    let failed = timeout(Duration::from_secs(5), async {
        loop {
            states.changed().await.unwrap();
            let state = states.borrow().clone();
            if matches!(state, ConnectionState::Failed(_)) {
                return state;
            }
        }
    })
    .await
    .expect("never saw a Failed state");

    assert!(matches!(failed, ConnectionState::Failed(_)));

    drop(commands_tx);
    let _ = timeout(Duration::from_secs(2), engine).await;
}
