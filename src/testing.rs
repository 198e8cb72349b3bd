//! Test utilities for driving a realtime channel without a real socket.
//!
//! [`MockTransport`] accepts any number of connections. Each accepted
//! connection shows up on the paired [`MockServer`] as a [`MockSocket`] the
//! test uses to read outbound frames, push inbound frames, close with a code,
//! or drop the socket outright.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::Sink;
use sonic_rs::Value;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::cache::{CacheKey, InvalidationSink};
use crate::dashboard::AlertSink;
use crate::transport::{WsTransport, WsTransportConnectFuture};
use crate::ws::{WebSocketBufferConfig, WebSocketError, WsCloseFrame, WsFrame, into_ws_frame};

/// What the next connect attempt does.
#[derive(Debug, Clone)]
pub enum MockConnectOutcome {
    Accept,
    Refuse(String),
    /// Never completes; the attempt stays in flight until cancelled.
    Stall,
}

struct MockTransportInner {
    script: Mutex<VecDeque<MockConnectOutcome>>,
    connects: AtomicUsize,
    attempts: Mutex<Vec<(String, Instant)>>,
    accepted_tx: mpsc::UnboundedSender<MockSocket>,
}

/// In-memory transport. Connects are accepted unless scripted otherwise.
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<MockTransportInner>,
}

impl MockTransport {
    /// Build a transport + server control pair.
    pub fn channel_pair() -> (Self, MockServer) {
        let (accepted_tx, accepted_rx) = mpsc::unbounded_channel();
        (
            Self {
                inner: Arc::new(MockTransportInner {
                    script: Mutex::new(VecDeque::new()),
                    connects: AtomicUsize::new(0),
                    attempts: Mutex::new(Vec::new()),
                    accepted_tx,
                }),
            },
            MockServer { accepted_rx },
        )
    }

    /// Queue outcomes for upcoming connect attempts, in order.
    pub fn script(&self, outcomes: impl IntoIterator<Item = MockConnectOutcome>) {
        self.inner
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(outcomes);
    }

    pub fn refuse_next(&self, attempts: usize, reason: &str) {
        self.script((0..attempts).map(|_| MockConnectOutcome::Refuse(reason.to_string())));
    }

    /// Connect attempts made so far, including refused ones.
    pub fn connect_count(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }

    /// URLs of every connect attempt, in order.
    pub fn connected_urls(&self) -> Vec<String> {
        self.inner
            .attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    /// Runtime clock reading at each connect attempt. Follows a paused clock.
    pub fn connect_times(&self) -> Vec<Instant> {
        self.inner
            .attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, at)| *at)
            .collect()
    }
}

impl WsTransport for MockTransport {
    type Reader = MockReader;
    type Writer = MockWriter;

    fn connect(
        &self,
        url: String,
        _buffers: WebSocketBufferConfig,
    ) -> WsTransportConnectFuture<Self::Reader, Self::Writer> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            inner.connects.fetch_add(1, Ordering::SeqCst);
            inner
                .attempts
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((url, Instant::now()));
            let outcome = inner
                .script
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front()
                .unwrap_or(MockConnectOutcome::Accept);

            match outcome {
                MockConnectOutcome::Accept => {}
                MockConnectOutcome::Refuse(reason) => {
                    return Err(WebSocketError::ConnectionFailed(reason));
                }
                MockConnectOutcome::Stall => futures_util::future::pending::<()>().await,
            }

            let (sent_tx, sent_rx) = mpsc::unbounded_channel();
            let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
            inner
                .accepted_tx
                .send(MockSocket {
                    outbound_rx: sent_rx,
                    inbound_tx: Some(inbound_tx),
                })
                .map_err(|_| {
                    WebSocketError::ConnectionFailed("mock server dropped".to_string())
                })?;
            Ok((MockReader { rx: inbound_rx }, MockWriter { sent_tx }))
        })
    }
}

/// Error surface for operations on [`MockSocket`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum MockServerError {
    /// The inbound socket side was intentionally dropped.
    SocketDropped,
    /// The channel side is no longer reading.
    ChannelClosed,
}

impl std::fmt::Display for MockServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MockServerError::SocketDropped => f.write_str("mock socket already dropped"),
            MockServerError::ChannelClosed => f.write_str("mock channel reader is closed"),
        }
    }
}

impl std::error::Error for MockServerError {}

/// Accepting side of [`MockTransport`].
pub struct MockServer {
    accepted_rx: mpsc::UnboundedReceiver<MockSocket>,
}

impl MockServer {
    pub async fn accept(&mut self) -> Option<MockSocket> {
        self.accepted_rx.recv().await
    }

    pub async fn accept_timeout(&mut self, timeout: Duration) -> Option<MockSocket> {
        tokio::time::timeout(timeout, self.accepted_rx.recv())
            .await
            .unwrap_or_default()
    }
}

/// Server end of one accepted connection. Dropping it ends the stream.
pub struct MockSocket {
    outbound_rx: mpsc::UnboundedReceiver<WsFrame>,
    inbound_tx: Option<mpsc::UnboundedSender<WsFrame>>,
}

impl MockSocket {
    /// Receive a frame written by the channel.
    pub async fn recv_outbound(&mut self) -> Option<WsFrame> {
        self.outbound_rx.recv().await
    }

    pub async fn recv_outbound_timeout(&mut self, timeout: Duration) -> Option<WsFrame> {
        tokio::time::timeout(timeout, self.outbound_rx.recv())
            .await
            .unwrap_or_default()
    }

    /// Push an inbound frame to the channel.
    pub fn send_inbound(&self, frame: WsFrame) -> Result<(), MockServerError> {
        let Some(tx) = self.inbound_tx.as_ref() else {
            return Err(MockServerError::SocketDropped);
        };
        tx.send(frame).map_err(|_| MockServerError::ChannelClosed)
    }

    /// Push a UTF-8 payload as websocket text.
    pub fn send_text(&self, text: impl AsRef<str>) -> Result<(), MockServerError> {
        self.send_inbound(into_ws_frame(text.as_ref().as_bytes().to_vec()))
    }

    /// Send a close frame with `code`, then end the inbound stream.
    pub fn close(&mut self, code: u16, reason: &'static str) -> Result<(), MockServerError> {
        let sent = self.send_inbound(WsFrame::Close(Some(WsCloseFrame {
            code,
            reason: bytes::Bytes::from_static(reason.as_bytes()),
        })));
        self.inbound_tx = None;
        sent
    }

    /// Simulate a server-side socket drop: the stream ends without a close frame.
    pub fn drop_socket(&mut self) {
        self.inbound_tx = None;
    }
}

/// Reader side for [`MockTransport`].
pub struct MockReader {
    rx: mpsc::UnboundedReceiver<WsFrame>,
}

impl futures_util::Stream for MockReader {
    type Item = Result<WsFrame, WebSocketError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match Pin::new(&mut self.rx).poll_recv(cx) {
            Poll::Ready(Some(frame)) => Poll::Ready(Some(Ok(frame))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Writer side for [`MockTransport`].
pub struct MockWriter {
    sent_tx: mpsc::UnboundedSender<WsFrame>,
}

impl Sink<WsFrame> for MockWriter {
    type Error = WebSocketError;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(self: Pin<&mut Self>, item: WsFrame) -> Result<(), Self::Error> {
        self.get_mut()
            .sent_tx
            .send(item)
            .map_err(|_| WebSocketError::TransportError {
                context: "mock_transport_write",
                error: "mock outbound channel closed".to_string(),
            })
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }
}

/// Invalidation sink that records every key, in order.
#[derive(Debug, Default)]
pub struct RecordingInvalidations {
    keys: Mutex<Vec<CacheKey>>,
}

impl RecordingInvalidations {
    pub fn keys(&self) -> Vec<CacheKey> {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl InvalidationSink for RecordingInvalidations {
    fn invalidate(&self, key: CacheKey) {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(key);
    }
}

/// Alert sink that records each payload as compact JSON.
#[derive(Debug, Default)]
pub struct RecordingAlerts {
    alerts: Mutex<Vec<String>>,
}

impl RecordingAlerts {
    pub fn alerts(&self) -> Vec<String> {
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AlertSink for RecordingAlerts {
    fn notify(&self, alert: &Value) {
        let text = sonic_rs::to_string(alert).unwrap_or_default();
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text);
    }
}
