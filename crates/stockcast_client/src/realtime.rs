use client_logging::{client_debug, client_info, client_warn};
use futures_util::stream::{SplitSink, StreamExt};
use futures_util::SinkExt;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use crate::{ApiError, ErrorKind};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// A persistent JSON-framed message connection.
///
/// Inbound text frames are decoded as JSON and handed to `on_message` in
/// wire arrival order. A frame that fails to decode is logged and dropped;
/// it reaches neither `on_message` nor `on_error` and the connection stays
/// open. Stream-level errors invoke `on_error` once and end the read loop.
pub struct RealtimeChannel {
    sink: Mutex<WsSink>,
    token: CancellationToken,
    reader: Option<JoinHandle<()>>,
}

impl RealtimeChannel {
    /// Connects to `url` and spawns the read loop.
    pub async fn connect<M, E>(
        url: &str,
        mut on_message: M,
        mut on_error: E,
    ) -> Result<Self, ApiError>
    where
        M: FnMut(Value) + Send + 'static,
        E: FnMut(ApiError) + Send + 'static,
    {
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|err| ApiError::new(ErrorKind::Network, err.to_string()))?;
        client_info!("realtime channel connected to {url}");

        let (sink, mut source) = stream.split();
        let token = CancellationToken::new();
        let read_token = token.clone();

        let reader = tokio::spawn(async move {
            loop {
                let frame = tokio::select! {
                    _ = read_token.cancelled() => break,
                    frame = source.next() => frame,
                };
                match frame {
                    Some(Ok(Message::Text(text))) => match serde_json::from_str::<Value>(&text) {
                        Ok(value) => on_message(value),
                        Err(err) => {
                            // Malformed frames are isolated from the session.
                            client_warn!("realtime channel dropped malformed frame: {err}");
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        client_info!("realtime channel closed by peer");
                        break;
                    }
                    Some(Ok(_)) => {
                        // Binary/ping/pong frames carry no application payload.
                    }
                    Some(Err(err)) => {
                        client_warn!("realtime channel stream error: {err}");
                        on_error(ApiError::new(ErrorKind::Network, err.to_string()));
                        break;
                    }
                }
            }
        });

        Ok(Self {
            sink: Mutex::new(sink),
            token,
            reader: Some(reader),
        })
    }

    /// Encodes `payload` as a JSON text frame and transmits it.
    pub async fn send(&self, payload: &Value) -> Result<(), ApiError> {
        let text = payload.to_string();
        client_debug!("realtime channel send {} bytes", text.len());
        let mut sink = self.sink.lock().await;
        sink.send(Message::Text(text))
            .await
            .map_err(|err| ApiError::new(ErrorKind::Network, err.to_string()))
    }

    /// Terminates the connection. Once this returns, no further
    /// `on_message`/`on_error` deliveries occur.
    pub async fn close(mut self) {
        self.token.cancel();
        {
            let mut sink = self.sink.lock().await;
            let _ = sink.send(Message::Close(None)).await;
        }
        if let Some(reader) = self.reader.take() {
            let _ = reader.await;
        }
        client_info!("realtime channel closed");
    }
}

impl Drop for RealtimeChannel {
    fn drop(&mut self) {
        self.token.cancel();
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}
