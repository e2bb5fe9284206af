//! WebSocket transport for the client.
//!
//! Provides [`ConnectedClient`] which handles WebSocket I/O for frame
//! transport. This is a thin layer that just sends/receives frames - protocol
//! logic remains in the Sans-IO [`crate::StompSession`] and
//! [`crate::ConnectionController`].

use futures::{SinkExt, StreamExt};
use stompchat_proto::Frame;
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

pub use crate::TransportEvent;

/// Capacity of the frame channels in each direction.
const CHANNEL_CAPACITY: usize = 32;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Endpoint URL is not a `ws://` or `wss://` URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Connection failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Stream error.
    #[error("stream error: {0}")]
    Stream(String),
}

/// Handle to a connected client with WebSocket transport.
///
/// Provides channels for frame transport. Frames are sent/received via
/// the channels, and an internal task handles the WebSocket I/O.
pub struct ConnectedClient {
    /// Send frames to the broker.
    pub to_server: mpsc::Sender<Frame>,
    /// Receive transport notifications.
    pub from_server: mpsc::Receiver<TransportEvent>,
    /// Connection task.
    task: JoinHandle<()>,
}

impl ConnectedClient {
    /// Flush queued frames, close the socket and wait for the I/O task.
    pub async fn shutdown(self) {
        let Self { to_server, from_server, task } = self;
        drop(to_server);
        drop(from_server);
        if let Err(e) = task.await
            && !e.is_cancelled()
        {
            tracing::warn!(error = %e, "connection task failed");
        }
    }

    /// Stop the connection without flushing.
    pub fn stop(&self) {
        self.task.abort();
    }
}

/// Connect to a STOMP broker's WebSocket endpoint.
///
/// Returns a [`ConnectedClient`] with channels for frame transport.
///
/// # Errors
///
/// - `TransportError::InvalidEndpoint` for a non-WebSocket URL
/// - `TransportError::Connection` if the WebSocket handshake fails
pub async fn connect(endpoint: &str) -> Result<ConnectedClient, TransportError> {
    let url = Url::parse(endpoint).map_err(|e| TransportError::InvalidEndpoint(e.to_string()))?;

    if url.scheme() != "ws" && url.scheme() != "wss" {
        return Err(TransportError::InvalidEndpoint(format!(
            "URL must use ws:// or wss:// scheme, got: {}",
            url.scheme()
        )));
    }

    let (socket, _response) = connect_async(url.as_str())
        .await
        .map_err(|e| TransportError::Connection(e.to_string()))?;

    tracing::info!(%url, "WebSocket connected");

    let (to_server_tx, to_server_rx) = mpsc::channel::<Frame>(CHANNEL_CAPACITY);
    let (from_server_tx, from_server_rx) = mpsc::channel::<TransportEvent>(CHANNEL_CAPACITY);

    let task = tokio::spawn(run_connection(socket, to_server_rx, from_server_tx));

    Ok(ConnectedClient { to_server: to_server_tx, from_server: from_server_rx, task })
}

/// Run the connection, bridging between channels and the socket.
async fn run_connection<S>(
    socket: S,
    mut to_server: mpsc::Receiver<Frame>,
    from_server: mpsc::Sender<TransportEvent>,
) where
    S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
        + futures::Sink<Message, Error = tokio_tungstenite::tungstenite::Error>
        + Unpin,
{
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            outgoing = to_server.recv() => {
                let Some(frame) = outgoing else {
                    // Handle dropped: everything queued has been written.
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                };
                if let Err(e) = send_frame(&mut sink, &frame).await {
                    let _ = from_server.send(TransportEvent::Error(e.to_string())).await;
                    break;
                }
            }

            incoming = stream.next() => {
                let event = match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if deliver(&from_server, text.as_bytes()).await {
                            continue;
                        }
                        break;
                    },
                    Some(Ok(Message::Binary(bytes))) => {
                        if deliver(&from_server, &bytes).await {
                            continue;
                        }
                        break;
                    },
                    Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                    Some(Ok(Message::Close(reason))) => {
                        tracing::debug!(?reason, "WebSocket closed by peer");
                        TransportEvent::Closed
                    },
                    None => TransportEvent::Closed,
                    Some(Err(e)) => TransportEvent::Error(e.to_string()),
                };
                let _ = from_server.send(event).await;
                break;
            }
        }
    }
}

/// Forward every frame in one WebSocket message.
///
/// Returns `false` once the receiving side is gone.
async fn deliver(from_server: &mpsc::Sender<TransportEvent>, bytes: &[u8]) -> bool {
    let events = match Frame::decode_all(bytes) {
        Ok(frames) => frames.into_iter().map(TransportEvent::Frame).collect(),
        Err(e) => vec![TransportEvent::Malformed(e)],
    };

    for event in events {
        if from_server.send(event).await.is_err() {
            return false;
        }
    }
    true
}

async fn send_frame<K>(sink: &mut K, frame: &Frame) -> Result<(), TransportError>
where
    K: futures::Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    let bytes = frame.to_vec().map_err(|e| TransportError::Stream(e.to_string()))?;

    let message = match String::from_utf8(bytes) {
        Ok(text) => Message::Text(text.into()),
        Err(e) => Message::Binary(e.into_bytes().into()),
    };

    sink.send(message).await.map_err(|e| TransportError::Stream(e.to_string()))
}
