//! WebSocket transport: reader/writer tasks bridging the socket to queues

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, error, info, warn};

use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Event produced by the reader side of the transport
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Decoded protocol message
    Message(ServerMsg),
    /// Socket closed or failed; no further events follow
    Closed(String),
}

/// Queues connecting the simulation to a live socket
///
/// The simulation never touches the socket directly: outbound messages are
/// pushed onto `outbound`, inbound events are drained from `inbound`.
pub struct TransportLink {
    pub outbound: mpsc::UnboundedSender<ClientMsg>,
    pub inbound: mpsc::UnboundedReceiver<TransportEvent>,
    tasks: Vec<JoinHandle<()>>,
}

impl TransportLink {
    /// Build a link from raw queues (no socket tasks attached)
    #[cfg(test)]
    pub fn from_channels(
        outbound: mpsc::UnboundedSender<ClientMsg>,
        inbound: mpsc::UnboundedReceiver<TransportEvent>,
    ) -> Self {
        Self {
            outbound,
            inbound,
            tasks: Vec::new(),
        }
    }

    /// Stop the socket tasks. Queued outbound messages are dropped.
    pub fn close(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.inbound.close();
    }
}

impl Drop for TransportLink {
    fn drop(&mut self) {
        self.close();
    }
}

/// Open a WebSocket to `url` and spawn the reader and writer tasks
pub async fn connect(url: &str) -> Result<TransportLink, TransportError> {
    let (socket, _response) = tokio_tungstenite::connect_async(url).await?;
    info!(url = %url, "WebSocket connected");

    let (mut ws_sink, mut ws_stream) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ClientMsg>();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<TransportEvent>();

    // Writer task: outbound queue -> WebSocket
    let writer_events = inbound_tx.clone();
    let writer = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    error!(error = %e, "Failed to encode client message");
                    continue;
                }
            };

            if let Err(e) = ws_sink.send(Message::Text(json)).await {
                debug!(error = %e, "WebSocket send failed");
                let _ = writer_events.send(TransportEvent::Closed(e.to_string()));
                break;
            }
        }
        let _ = ws_sink.close().await;
    });

    // Reader loop: WebSocket -> inbound queue
    let reader = tokio::spawn(async move {
        let reason = loop {
            match ws_stream.next().await {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<ServerMsg>(&text) {
                    Ok(msg) => {
                        if inbound_tx.send(TransportEvent::Message(msg)).is_err() {
                            debug!("Inbound queue closed");
                            return;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to parse server message");
                    }
                },
                Some(Ok(Message::Binary(_))) => {
                    warn!("Received binary message, ignoring");
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {}
                Some(Ok(Message::Close(frame))) => {
                    info!("Server closed the connection");
                    break frame
                        .map(|f| f.reason.to_string())
                        .filter(|r| !r.is_empty())
                        .unwrap_or_else(|| "closed by server".to_string());
                }
                Some(Err(e)) => {
                    error!(error = %e, "WebSocket error");
                    break e.to_string();
                }
                None => break "stream ended".to_string(),
            }
        };
        let _ = inbound_tx.send(TransportEvent::Closed(reason));
    });

    Ok(TransportLink {
        outbound: outbound_tx,
        inbound: inbound_rx,
        tasks: vec![reader, writer],
    })
}

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("WebSocket connect failed: {0}")]
    Connect(#[from] tungstenite::Error),
}
