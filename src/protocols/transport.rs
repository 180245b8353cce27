//! Transport - one ordered, reliable text-frame channel to the host.
//!
//! Two adapters are provided:
//! - `WebSocketTransport`: the host's local WebSocket endpoint
//! - `ChannelTransport`: an in-process mpsc pair, paired with a `HostEndpoint`

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;

use crate::api::types::ApiError;
use crate::config::BridgeConfig;

/// Abstract interface for the connection to the host process.
///
/// The dispatcher's driver task is the only owner, so the methods take
/// `&mut self`.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Send a single text frame.
    async fn send(&mut self, frame: String) -> Result<(), ApiError>;

    /// Receive the next text frame.
    ///
    /// # Returns
    /// * `Some(Ok(frame))` - A frame arrived
    /// * `Some(Err(ApiError::ProtocolError))` - A frame arrived but is not
    ///   text; the connection stays usable
    /// * `Some(Err(_))` - Any other error: the connection failed
    /// * `None` - The host closed the connection
    async fn next_frame(&mut self) -> Option<Result<String, ApiError>>;

    /// Close the connection. Closing twice is not an error.
    async fn close(&mut self) -> Result<(), ApiError>;
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// WebSocket connection to the host's local port.
pub struct WebSocketTransport {
    stream: WsStream,
    closed: bool,
}

impl WebSocketTransport {
    /// Connect to the host addressed by `config.port`.
    pub async fn connect(config: &BridgeConfig) -> Result<Self, ApiError> {
        let url = config.websocket_url();
        log::info!("Connecting to host: url={url}");

        let (stream, _response) =
            tokio_tungstenite::connect_async(url.as_str())
                .await
                .map_err(|e| ApiError::ConnectionFailed {
                    message: format!("WebSocket connect to {url} failed: {e}"),
                })?;

        log::debug!("Host connection established: url={url}");
        Ok(Self {
            stream,
            closed: false,
        })
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&mut self, frame: String) -> Result<(), ApiError> {
        self.stream
            .send(tungstenite::Message::Text(frame))
            .await
            .map_err(|e| ApiError::ConnectionLost {
                reason: format!("WebSocket send failed: {e}"),
            })
    }

    async fn next_frame(&mut self) -> Option<Result<String, ApiError>> {
        loop {
            match self.stream.next().await {
                Some(Ok(tungstenite::Message::Text(text))) => return Some(Ok(text)),
                Some(Ok(tungstenite::Message::Binary(data))) => {
                    return Some(String::from_utf8(data).map_err(|e| ApiError::ProtocolError {
                        message: format!("Binary frame is not UTF-8: {e}"),
                    }));
                }
                Some(Ok(tungstenite::Message::Ping(data))) => {
                    if let Err(e) = self.stream.send(tungstenite::Message::Pong(data)).await {
                        log::warn!("Failed to answer ping: {e}");
                    }
                }
                Some(Ok(tungstenite::Message::Pong(_))) | Some(Ok(tungstenite::Message::Frame(_))) => {}
                Some(Ok(tungstenite::Message::Close(close_frame))) => {
                    let (code, reason) = close_frame
                        .map(|cf| (u16::from(cf.code), cf.reason.to_string()))
                        .unwrap_or((1005, String::new()));
                    log::info!("Host closed the connection: code={code}, reason={reason}");
                    self.closed = true;
                    return None;
                }
                Some(Err(e)) => {
                    return Some(Err(ApiError::ConnectionLost {
                        reason: format!("WebSocket read error: {e}"),
                    }));
                }
                None => return None,
            }
        }
    }

    async fn close(&mut self) -> Result<(), ApiError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.stream
            .close(None)
            .await
            .map_err(|e| ApiError::IoError {
                message: format!("WebSocket close failed: {e}"),
            })
    }
}

/// In-process transport backed by tokio channels.
pub struct ChannelTransport {
    outbound: Option<mpsc::UnboundedSender<String>>,
    inbound: mpsc::UnboundedReceiver<String>,
}

/// Host end of a `ChannelTransport` pair.
pub struct HostEndpoint {
    /// Frames written by the bridge
    pub from_client: mpsc::UnboundedReceiver<String>,
    /// Frames delivered to the bridge; dropping it closes the connection
    pub to_client: mpsc::UnboundedSender<String>,
}

impl ChannelTransport {
    /// Create a connected transport and its host end.
    pub fn pair() -> (Self, HostEndpoint) {
        let (client_tx, client_rx) = mpsc::unbounded_channel();
        let (host_tx, host_rx) = mpsc::unbounded_channel();
        (
            Self {
                outbound: Some(client_tx),
                inbound: host_rx,
            },
            HostEndpoint {
                from_client: client_rx,
                to_client: host_tx,
            },
        )
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&mut self, frame: String) -> Result<(), ApiError> {
        let outbound = self
            .outbound
            .as_ref()
            .ok_or_else(|| ApiError::connection_lost("transport closed"))?;
        outbound
            .send(frame)
            .map_err(|_| ApiError::connection_lost("host endpoint dropped"))
    }

    async fn next_frame(&mut self) -> Option<Result<String, ApiError>> {
        self.inbound.recv().await.map(Ok)
    }

    async fn close(&mut self) -> Result<(), ApiError> {
        self.outbound = None;
        self.inbound.close();
        Ok(())
    }
}

impl HostEndpoint {
    /// Deliver a frame to the bridge.
    pub fn send(&self, frame: String) -> Result<(), ApiError> {
        self.to_client
            .send(frame)
            .map_err(|_| ApiError::connection_lost("client transport dropped"))
    }

    /// Next frame written by the bridge, `None` once the client closed.
    pub async fn recv(&mut self) -> Option<String> {
        self.from_client.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_pair_carries_frames_both_ways() {
        let (mut transport, mut host) = ChannelTransport::pair();

        transport.send("ping".to_string()).await.unwrap();
        assert_eq!(host.recv().await.as_deref(), Some("ping"));

        host.send("pong".to_string()).unwrap();
        assert_eq!(transport.next_frame().await, Some(Ok("pong".to_string())));
    }

    #[tokio::test]
    async fn test_channel_ends_when_host_drops() {
        let (mut transport, host) = ChannelTransport::pair();
        drop(host);

        assert_eq!(transport.next_frame().await, None);
        assert!(matches!(
            transport.send("late".to_string()).await,
            Err(ApiError::ConnectionLost { .. })
        ));
    }

    #[tokio::test]
    async fn test_channel_close_is_idempotent() {
        let (mut transport, mut host) = ChannelTransport::pair();

        transport.close().await.unwrap();
        transport.close().await.unwrap();

        assert_eq!(host.recv().await, None);
        assert!(transport.send("x".to_string()).await.is_err());
    }

    #[tokio::test]
    async fn test_websocket_connect_refused() {
        // Bind then drop to find a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = WebSocketTransport::connect(&BridgeConfig::new(port)).await;
        assert!(matches!(result, Err(ApiError::ConnectionFailed { .. })));
    }

    type HostSocket = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

    /// Accept one WebSocket connection on a free local port and run `script`
    /// against it.
    async fn serve_once<F, Fut>(script: F) -> (BridgeConfig, tokio::task::JoinHandle<()>)
    where
        F: FnOnce(HostSocket) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let socket = tokio_tungstenite::accept_async(stream).await.unwrap();
            script(socket).await;
        });
        (BridgeConfig::new(port), server)
    }

    const WAIT: std::time::Duration = std::time::Duration::from_secs(2);

    #[tokio::test]
    async fn test_websocket_text_round_trip() {
        let (config, server) = serve_once(|mut socket| async move {
            let message = socket.next().await.unwrap().unwrap();
            assert_eq!(message, tungstenite::Message::Text("hello".to_string()));
            socket
                .send(tungstenite::Message::Text("world".to_string()))
                .await
                .unwrap();
            // Hold the socket open until the client closes
            while let Some(Ok(_)) = socket.next().await {}
        })
        .await;

        let mut transport = WebSocketTransport::connect(&config).await.unwrap();
        transport.send("hello".to_string()).await.unwrap();
        let frame = tokio::time::timeout(WAIT, transport.next_frame()).await.unwrap();
        assert_eq!(frame, Some(Ok("world".to_string())));

        transport.close().await.unwrap();
        tokio::time::timeout(WAIT, server).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_websocket_binary_frames() {
        let (config, _server) = serve_once(|mut socket| async move {
            socket
                .send(tungstenite::Message::Binary(b"utf8 text".to_vec()))
                .await
                .unwrap();
            socket
                .send(tungstenite::Message::Binary(vec![0xff, 0xfe, 0x00]))
                .await
                .unwrap();
            socket
                .send(tungstenite::Message::Text("still here".to_string()))
                .await
                .unwrap();
            while let Some(Ok(_)) = socket.next().await {}
        })
        .await;

        let mut transport = WebSocketTransport::connect(&config).await.unwrap();

        let first = tokio::time::timeout(WAIT, transport.next_frame()).await.unwrap();
        assert_eq!(first, Some(Ok("utf8 text".to_string())));

        let second = tokio::time::timeout(WAIT, transport.next_frame()).await.unwrap();
        assert!(matches!(second, Some(Err(ApiError::ProtocolError { .. }))));

        let third = tokio::time::timeout(WAIT, transport.next_frame()).await.unwrap();
        assert_eq!(third, Some(Ok("still here".to_string())));
    }

    #[tokio::test]
    async fn test_websocket_ping_is_answered() {
        let (config, server) = serve_once(|mut socket| async move {
            socket
                .send(tungstenite::Message::Ping(vec![1, 2, 3]))
                .await
                .unwrap();
            let reply = socket.next().await.unwrap().unwrap();
            assert_eq!(reply, tungstenite::Message::Pong(vec![1, 2, 3]));
            socket
                .send(tungstenite::Message::Text("after ping".to_string()))
                .await
                .unwrap();
            while let Some(Ok(_)) = socket.next().await {}
        })
        .await;

        let mut transport = WebSocketTransport::connect(&config).await.unwrap();

        // The ping is consumed inside next_frame; the next text frame surfaces
        let frame = tokio::time::timeout(WAIT, transport.next_frame()).await.unwrap();
        assert_eq!(frame, Some(Ok("after ping".to_string())));

        transport.close().await.unwrap();
        tokio::time::timeout(WAIT, server).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_websocket_close_frame_ends_stream() {
        let (config, _server) = serve_once(|mut socket| async move {
            socket.close(None).await.unwrap();
            while let Some(Ok(_)) = socket.next().await {}
        })
        .await;

        let mut transport = WebSocketTransport::connect(&config).await.unwrap();

        let frame = tokio::time::timeout(WAIT, transport.next_frame()).await.unwrap();
        assert_eq!(frame, None);
        transport.close().await.unwrap();
        transport.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_websocket_bad_binary_frame_does_not_drop_pending_call() {
        use crate::protocols::codec;
        use crate::runtime::dispatcher::Dispatcher;
        use crate::runtime::events::EventHub;
        use std::sync::Arc;

        let (config, _server) = serve_once(|mut socket| async move {
            let frame = match socket.next().await.unwrap().unwrap() {
                tungstenite::Message::Text(text) => text,
                other => panic!("Expected a call frame, got {other:?}"),
            };
            let call = codec::decode_call(&frame).unwrap();
            socket
                .send(tungstenite::Message::Binary(vec![0xff, 0xfe, 0x00]))
                .await
                .unwrap();
            let reply = codec::encode_response(&call.id, serde_json::json!("ok")).unwrap();
            socket.send(tungstenite::Message::Text(reply)).await.unwrap();
            while let Some(Ok(_)) = socket.next().await {}
        })
        .await;

        let transport = WebSocketTransport::connect(&config).await.unwrap();
        let dispatcher = Dispatcher::start(transport, Arc::new(EventHub::new()), &config);

        let result = tokio::time::timeout(WAIT, dispatcher.call("app.getConfig", serde_json::Value::Null))
            .await
            .unwrap();

        assert_eq!(result, Ok(serde_json::json!("ok")));
        assert!(dispatcher.is_connected());
        dispatcher.shutdown().await;
    }
}
