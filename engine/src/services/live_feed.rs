//! Market WebSocket listener.
//!
//! Connects once, logs each inbound text message verbatim and stops when the
//! remote closes or the handle is shut down. There is no reconnect and no
//! message parsing.

use futures::{SinkExt, StreamExt};
use std::future::Future;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::error::EngineError;

pub struct LiveFeed {
    url: String,
    sink: Option<mpsc::UnboundedSender<String>>,
}

impl LiveFeed {
    pub fn new(url: impl Into<String>) -> Self {
        LiveFeed {
            url: url.into(),
            sink: None,
        }
    }

    /// Also forward every text message to `sink`.
    pub fn with_sink(mut self, sink: mpsc::UnboundedSender<String>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Starts the listener on the current tokio runtime.
    pub fn spawn(self) -> LiveFeedHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(listen(self.url, self.sink, shutdown_rx));
        LiveFeedHandle {
            shutdown: Some(shutdown_tx),
            task,
        }
    }
}

/// Owns the running listener. Dropping the handle also stops it.
pub struct LiveFeedHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<(), EngineError>>,
}

impl LiveFeedHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signals the listener to stop and waits for it.
    pub async fn shutdown(mut self) -> Result<(), EngineError> {
        if let Some(tx) = self.shutdown.take() {
            // Err means the task already exited on its own.
            let _ = tx.send(());
        }
        self.join().await
    }

    /// Waits until the remote side closes the connection or the connection fails.
    pub async fn wait(mut self) -> Result<(), EngineError> {
        // Keep the sender alive so the listener is not told to stop.
        let _keep = self.shutdown.take();
        self.join().await
    }

    /// Runs until `stop` resolves or the listener exits on its own, whichever comes first.
    pub async fn stop_on<F>(mut self, stop: F) -> Result<(), EngineError>
    where
        F: Future<Output = ()>,
    {
        let finished_first = tokio::select! {
            _ = stop => None,
            joined = &mut self.task => Some(joined),
        };
        let joined = match finished_first {
            Some(joined) => joined,
            None => {
                if let Some(tx) = self.shutdown.take() {
                    let _ = tx.send(());
                }
                (&mut self.task).await
            }
        };
        joined.map_err(|e| EngineError::LiveFeedError(format!("listener task failed: {}", e)))?
    }

    async fn join(self) -> Result<(), EngineError> {
        self.task
            .await
            .map_err(|e| EngineError::LiveFeedError(format!("listener task failed: {}", e)))?
    }
}

async fn listen(
    url: String,
    sink: Option<mpsc::UnboundedSender<String>>,
    mut shutdown: oneshot::Receiver<()>,
) -> Result<(), EngineError> {
    // Shutdown is honoured during the handshake as well.
    let connected = tokio::select! {
        _ = &mut shutdown => {
            tracing::info!(%url, "Live feed shut down before connecting");
            return Ok(());
        }
        connected = connect_async(url.as_str()) => connected,
    };
    let (ws_stream, _) =
        connected.map_err(|e| EngineError::LiveFeedError(format!("failed to connect to {}: {}", url, e)))?;
    tracing::info!(%url, "Live feed connected");

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!(%url, "Live feed shutting down");
                let _ = write.send(Message::Close(None)).await;
                break;
            }
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    tracing::info!(payload = %text.as_str(), "Received");
                    if let Some(sink) = &sink {
                        let _ = sink.send(text.as_str().to_string());
                    }
                }
                Some(Ok(Message::Binary(bytes))) => {
                    tracing::debug!(len = bytes.len(), "Ignoring binary frame");
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!(%url, ?frame, "Live feed closed by remote");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::error!(%url, error = %e, "Live feed connection error");
                    return Err(EngineError::LiveFeedError(e.to_string()));
                }
                None => {
                    tracing::info!(%url, "Live feed stream ended");
                    break;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::TcpListener;

    // Accepts one client, sends `messages`, optionally closes, then drains until the client leaves.
    async fn spawn_ws_server(messages: Vec<&'static str>, close_after: bool) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            for message in messages {
                ws.send(Message::text(message.to_string())).await.unwrap();
            }
            if close_after {
                let _ = ws.close(None).await;
            }
            while let Some(Ok(_)) = ws.next().await {}
        });
        format!("ws://{}", addr)
    }

    #[tokio::test]
    async fn test_messages_forwarded_and_shutdown_is_prompt() {
        let url = spawn_ws_server(vec!["{\"e\":\"markPriceUpdate\"}", "hello"], false).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = LiveFeed::new(url).with_sink(tx).spawn();

        let first = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
        let second = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
        assert_eq!(first.as_deref(), Some("{\"e\":\"markPriceUpdate\"}"));
        assert_eq!(second.as_deref(), Some("hello"));
        assert!(!handle.is_finished());

        tokio::time::timeout(Duration::from_secs(5), handle.shutdown())
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_remote_close_ends_listener() {
        let url = spawn_ws_server(vec!["only"], true).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = LiveFeed::new(url).with_sink(tx).spawn();

        tokio::time::timeout(Duration::from_secs(5), handle.wait())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rx.recv().await.as_deref(), Some("only"));
    }

    #[tokio::test]
    async fn test_stop_on_future_shuts_listener_down() {
        let url = spawn_ws_server(vec!["tick"], false).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = LiveFeed::new(url).with_sink(tx).spawn();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let running = tokio::spawn(handle.stop_on(async move {
            let _ = stop_rx.await;
        }));
        assert_eq!(
            tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap().as_deref(),
            Some("tick")
        );
        stop_tx.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(5), running)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_stop_on_returns_when_remote_closes_first() {
        let url = spawn_ws_server(vec![], true).await;
        let handle = LiveFeed::new(url).spawn();

        tokio::time::timeout(Duration::from_secs(5), handle.stop_on(std::future::pending()))
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_during_stalled_handshake() {
        // Accepts the TCP connection but never answers the upgrade request.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            std::future::pending::<()>().await;
        });

        let handle = LiveFeed::new(format!("ws://{}", addr)).spawn();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!handle.is_finished());

        tokio::time::timeout(Duration::from_secs(3), handle.shutdown())
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_connect_failure_is_reported() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let handle = LiveFeed::new(format!("ws://{}", addr)).spawn();
        let err = tokio::time::timeout(Duration::from_secs(5), handle.wait())
            .await
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, EngineError::LiveFeedError(_)));
        assert!(err.to_string().contains("failed to connect"));
    }
}
