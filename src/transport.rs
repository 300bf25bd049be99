//! WebSocket transport to the companion service.
//!
//! Owns the socket and nothing else: the connection's lifecycle and inbound
//! frames become [`TransportEvent`]s on a channel, and an outbound channel is
//! drained into the socket. Reconnection with backoff lives here, outside the
//! connection state machine, which re-enters from Connecting on every
//! attempt.

use anyhow::{anyhow, Result};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};
use url::Url;

use crate::error::RetryPolicy;

/// What the socket reports to the engine.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A connection attempt is starting.
    Connecting,
    /// The socket is open.
    Opened,
    /// One text frame from the service.
    Frame(String),
    /// A connection attempt failed before opening.
    ConnectFailed(String),
    /// An open socket dropped.
    Closed(String),
}

/// Handle to a spawned transport task.
pub struct Transport {
    /// Lifecycle and inbound frames, in delivery order.
    pub events: mpsc::Receiver<TransportEvent>,
    /// Encoded frames to send. Dropping every sender closes the socket.
    pub outbound: mpsc::Sender<String>,
    pub task: JoinHandle<()>,
}

/// Spawn the transport task dialing `url`.
pub fn spawn(url: &str, policy: RetryPolicy) -> Result<Transport> {
    let url = Url::parse(url).map_err(|e| anyhow!("invalid ws url: {e}"))?;
    let (event_tx, events) = mpsc::channel(64);
    let (outbound, outbound_rx) = mpsc::channel(64);
    let task = tokio::spawn(run(url, policy, event_tx, outbound_rx));
    Ok(Transport {
        events,
        outbound,
        task,
    })
}

enum SessionEnd {
    /// The engine dropped its side; stop dialing.
    Shutdown,
    /// The socket dropped with a reason.
    Dropped(String),
}

async fn run(
    url: Url,
    policy: RetryPolicy,
    events: mpsc::Sender<TransportEvent>,
    mut outbound: mpsc::Receiver<String>,
) {
    let mut attempts = 0u32;
    let mut delay = policy.initial_delay;

    loop {
        attempts += 1;
        if events.send(TransportEvent::Connecting).await.is_err() {
            return;
        }

        match tokio_tungstenite::connect_async(url.as_str()).await {
            Ok((stream, _)) => {
                attempts = 0;
                delay = policy.initial_delay;
                match session(stream, &events, &mut outbound).await {
                    SessionEnd::Shutdown => return,
                    SessionEnd::Dropped(reason) => {
                        if events.send(TransportEvent::Closed(reason)).await.is_err() {
                            return;
                        }
                    }
                }
            }
            Err(e) => {
                debug!("connect to {url} failed: {e}");
                if events
                    .send(TransportEvent::ConnectFailed(e.to_string()))
                    .await
                    .is_err()
                {
                    return;
                }
            }
        }

        if attempts >= policy.max_attempts {
            warn!(attempts, "giving up on {url}");
            return;
        }
        tokio::time::sleep(delay).await;
        delay = policy.next_delay(delay);
    }
}

/// Pump one open socket until it drops or the engine shuts down.
async fn session(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    events: &mpsc::Sender<TransportEvent>,
    outbound: &mut mpsc::Receiver<String>,
) -> SessionEnd {
    let (mut sink, mut source) = stream.split();

    if events.send(TransportEvent::Opened).await.is_err() {
        return SessionEnd::Shutdown;
    }

    loop {
        tokio::select! {
            frame = outbound.recv() => match frame {
                Some(text) => {
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        return SessionEnd::Dropped(e.to_string());
                    }
                }
                None => {
                    let _ = sink.send(Message::Close(None)).await;
                    return SessionEnd::Shutdown;
                }
            },
            message = source.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    if events
                        .send(TransportEvent::Frame(text.to_string()))
                        .await
                        .is_err()
                    {
                        return SessionEnd::Shutdown;
                    }
                }
                Some(Ok(Message::Close(_))) => {
                    return SessionEnd::Dropped("closed by peer".to_string());
                }
                // pings are answered by the protocol layer underneath us
                Some(Ok(_)) => {}
                Some(Err(e)) => return SessionEnd::Dropped(e.to_string()),
                None => return SessionEnd::Dropped("connection closed".to_string()),
            },
        }
    }
}
