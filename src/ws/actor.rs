//! Realtime channel actor.
//!
//! The socket read loop runs in a spawned task and forwards frames into the
//! actor mailbox; the actor owns connection state, the retry counter and the
//! reconnect timer, so every transition happens one message at a time.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use kameo::error::SendError;
use kameo::prelude::{Actor, ActorRef, Context, Message as KameoMessage, WeakActorRef};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

use super::writer::{WriterClose, WriterWrite, WsWriterActor};
use crate::core::{
    CLOSE_NORMAL, ChannelSnapshot, ChannelState, ExponentialBackoffReconnect,
    WebSocketBufferConfig, WebSocketError, WebSocketResult, WsConnectionStats,
    WsDisconnectAction, WsDisconnectCause, WsEndpointHandler, WsFrame, WsHealthMonitor,
    WsReconnectStrategy, frame_bytes,
};
use crate::transport::WsTransport;
use crate::transport::tungstenite::TungsteniteTransport;

/// Arguments passed when constructing a channel actor instance.
pub struct RealtimeChannelArgs<E, R = ExponentialBackoffReconnect, T = TungsteniteTransport>
where
    E: WsEndpointHandler,
    R: WsReconnectStrategy,
    T: WsTransport,
{
    pub url: String,
    pub transport: T,
    pub reconnect_strategy: R,
    pub handler: E,
    pub ws_buffers: WebSocketBufferConfig,
}

/// One logical realtime channel: at most one physical connection at a time.
pub struct RealtimeChannel<E, R = ExponentialBackoffReconnect, T = TungsteniteTransport>
where
    E: WsEndpointHandler,
    R: WsReconnectStrategy,
    T: WsTransport,
{
    url: String,
    transport: T,
    reconnect: R,
    handler: E,
    ws_buffers: WebSocketBufferConfig,
    health: WsHealthMonitor,
    actor_ref: ActorRef<Self>,
    state: ChannelState,
    retry_count: u32,
    last_message: Option<E::Message>,
    error: Option<String>,
    /// Bumped whenever a connection (or pending attempt) is retired; events
    /// tagged with an older epoch are ignored.
    epoch: u64,
    writer_ref: Option<ActorRef<WsWriterActor<T::Writer>>>,
    reader_task: Option<JoinHandle<()>>,
    connect_task: Option<JoinHandle<()>>,
    reconnect_task: Option<JoinHandle<()>>,
    snapshot_tx: watch::Sender<ChannelSnapshot<E::Message>>,
}

impl<E, R, T> Actor for RealtimeChannel<E, R, T>
where
    E: WsEndpointHandler,
    R: WsReconnectStrategy,
    T: WsTransport,
{
    type Args = RealtimeChannelArgs<E, R, T>;
    type Error = WebSocketError;

    fn name() -> &'static str {
        "RealtimeChannel"
    }

    async fn on_start(args: Self::Args, actor_ref: ActorRef<Self>) -> WebSocketResult<Self> {
        let RealtimeChannelArgs {
            url,
            transport,
            reconnect_strategy,
            handler,
            ws_buffers,
        } = args;

        let (snapshot_tx, _) = watch::channel(ChannelSnapshot::default());

        Ok(Self {
            url,
            transport,
            reconnect: reconnect_strategy,
            handler,
            ws_buffers,
            health: WsHealthMonitor::new(),
            actor_ref,
            state: ChannelState::Disconnected,
            retry_count: 0,
            last_message: None,
            error: None,
            epoch: 0,
            writer_ref: None,
            reader_task: None,
            connect_task: None,
            reconnect_task: None,
            snapshot_tx,
        })
    }

    async fn on_stop(
        &mut self,
        _actor_ref: WeakActorRef<Self>,
        _reason: kameo::error::ActorStopReason,
    ) -> WebSocketResult<()> {
        self.close_connection(None).await;
        Ok(())
    }

    fn on_panic(
        &mut self,
        _actor_ref: WeakActorRef<Self>,
        err: kameo::prelude::PanicError,
    ) -> impl std::future::Future<
        Output = Result<std::ops::ControlFlow<kameo::prelude::ActorStopReason>, Self::Error>,
    > + Send {
        async move {
            tracing::error!(error = ?err, "RealtimeChannel panicked");
            Ok(std::ops::ControlFlow::Break(
                kameo::prelude::ActorStopReason::Panicked(err),
            ))
        }
    }
}

/// Lifecycle commands issued by the channel owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelEvent {
    /// Start (or resume) the session. No-op while open or connecting.
    Connect,
    /// Cancel any pending reconnect and close with code 1000.
    Disconnect,
}

impl<E, R, T> KameoMessage<ChannelEvent> for RealtimeChannel<E, R, T>
where
    E: WsEndpointHandler,
    R: WsReconnectStrategy,
    T: WsTransport,
{
    type Reply = WebSocketResult<()>;

    async fn handle(
        &mut self,
        event: ChannelEvent,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        match event {
            ChannelEvent::Connect => self.handle_connect(),
            ChannelEvent::Disconnect => self.handle_manual_disconnect().await,
        }
        Ok(())
    }
}

/// Send an application frame. Replies `false` when the channel is not open;
/// nothing is buffered for later delivery.
#[derive(Debug, Clone)]
pub struct SendMessage {
    pub frame: WsFrame,
}

impl<E, R, T> KameoMessage<SendMessage> for RealtimeChannel<E, R, T>
where
    E: WsEndpointHandler,
    R: WsReconnectStrategy,
    T: WsTransport,
{
    type Reply = WebSocketResult<bool>;

    async fn handle(
        &mut self,
        msg: SendMessage,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        Ok(self.send_frame(msg.frame).await)
    }
}

/// Send the endpoint's liveness frame.
#[derive(Debug, Clone, Copy)]
pub struct Ping;

impl<E, R, T> KameoMessage<Ping> for RealtimeChannel<E, R, T>
where
    E: WsEndpointHandler,
    R: WsReconnectStrategy,
    T: WsTransport,
{
    type Reply = WebSocketResult<bool>;

    async fn handle(&mut self, _msg: Ping, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        match self.handler.ping_frame() {
            Some(frame) => Ok(self.send_frame(frame).await),
            None => Ok(false),
        }
    }
}

pub struct GetConnectionStatus;

impl<E, R, T> KameoMessage<GetConnectionStatus> for RealtimeChannel<E, R, T>
where
    E: WsEndpointHandler,
    R: WsReconnectStrategy,
    T: WsTransport,
{
    type Reply = WebSocketResult<ChannelState>;

    async fn handle(
        &mut self,
        _msg: GetConnectionStatus,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        Ok(self.state)
    }
}

pub struct GetSnapshot;

impl<E, R, T> KameoMessage<GetSnapshot> for RealtimeChannel<E, R, T>
where
    E: WsEndpointHandler,
    R: WsReconnectStrategy,
    T: WsTransport,
{
    type Reply = WebSocketResult<ChannelSnapshot<E::Message>>;

    async fn handle(
        &mut self,
        _msg: GetSnapshot,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        Ok(self.snapshot())
    }
}

pub struct GetConnectionStats;

impl<E, R, T> KameoMessage<GetConnectionStats> for RealtimeChannel<E, R, T>
where
    E: WsEndpointHandler,
    R: WsReconnectStrategy,
    T: WsTransport,
{
    type Reply = WebSocketResult<WsConnectionStats>;

    async fn handle(
        &mut self,
        _msg: GetConnectionStats,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        Ok(self.health.get_stats())
    }
}

/// Subscribe to snapshots published on every transition and inbound message.
pub struct SubscribeSnapshots;

impl<E, R, T> KameoMessage<SubscribeSnapshots> for RealtimeChannel<E, R, T>
where
    E: WsEndpointHandler,
    R: WsReconnectStrategy,
    T: WsTransport,
{
    type Reply = WebSocketResult<watch::Receiver<ChannelSnapshot<E::Message>>>;

    async fn handle(
        &mut self,
        _msg: SubscribeSnapshots,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        Ok(self.snapshot_tx.subscribe())
    }
}

pub(crate) struct ConnectionEstablished<TR: WsTransport> {
    epoch: u64,
    reader: TR::Reader,
    writer: TR::Writer,
}

pub(crate) struct ConnectionFailed {
    epoch: u64,
    error: String,
}

pub(crate) struct Inbound {
    epoch: u64,
    frame: WsFrame,
}

pub(crate) struct ConnectionClosed {
    epoch: u64,
    cause: WsDisconnectCause,
}

pub(crate) struct ReconnectDue {
    epoch: u64,
}

impl<E, R, T> KameoMessage<ConnectionEstablished<T>> for RealtimeChannel<E, R, T>
where
    E: WsEndpointHandler,
    R: WsReconnectStrategy,
    T: WsTransport,
{
    type Reply = WebSocketResult<()>;

    async fn handle(
        &mut self,
        msg: ConnectionEstablished<T>,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        self.on_connection_established(msg.epoch, msg.reader, msg.writer)
            .await;
        Ok(())
    }
}

impl<E, R, T> KameoMessage<ConnectionFailed> for RealtimeChannel<E, R, T>
where
    E: WsEndpointHandler,
    R: WsReconnectStrategy,
    T: WsTransport,
{
    type Reply = WebSocketResult<()>;

    async fn handle(
        &mut self,
        msg: ConnectionFailed,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        if msg.epoch != self.epoch || self.state != ChannelState::Connecting {
            debug!(connection = %self.url, "ignoring failure of superseded attempt");
            return Ok(());
        }
        self.connect_task = None;
        self.state = ChannelState::Error;
        self.handle_closed(WsDisconnectCause::HandshakeFailed { message: msg.error })
            .await;
        Ok(())
    }
}

impl<E, R, T> KameoMessage<Inbound> for RealtimeChannel<E, R, T>
where
    E: WsEndpointHandler,
    R: WsReconnectStrategy,
    T: WsTransport,
{
    type Reply = WebSocketResult<()>;

    async fn handle(&mut self, msg: Inbound, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        if msg.epoch != self.epoch || self.state != ChannelState::Open {
            return Ok(());
        }
        self.process_inbound(msg.frame);
        Ok(())
    }
}

impl<E, R, T> KameoMessage<ConnectionClosed> for RealtimeChannel<E, R, T>
where
    E: WsEndpointHandler,
    R: WsReconnectStrategy,
    T: WsTransport,
{
    type Reply = WebSocketResult<()>;

    async fn handle(
        &mut self,
        msg: ConnectionClosed,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        if msg.epoch != self.epoch || self.state != ChannelState::Open {
            return Ok(());
        }
        self.handle_closed(msg.cause).await;
        Ok(())
    }
}

impl<E, R, T> KameoMessage<ReconnectDue> for RealtimeChannel<E, R, T>
where
    E: WsEndpointHandler,
    R: WsReconnectStrategy,
    T: WsTransport,
{
    type Reply = WebSocketResult<()>;

    async fn handle(
        &mut self,
        msg: ReconnectDue,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        if msg.epoch != self.epoch || self.state != ChannelState::ReconnectPending {
            return Ok(());
        }
        self.reconnect_task = None;
        self.retry_count = self.retry_count.saturating_add(1);
        info!(
            connection = %self.url,
            attempt = self.retry_count,
            "reconnecting websocket"
        );
        self.open_transport();
        Ok(())
    }
}

impl<E, R, T> RealtimeChannel<E, R, T>
where
    E: WsEndpointHandler,
    R: WsReconnectStrategy,
    T: WsTransport,
{
    fn snapshot(&self) -> ChannelSnapshot<E::Message> {
        ChannelSnapshot {
            state: self.state,
            retry_count: self.retry_count,
            last_message: self.last_message.clone(),
            error: self.error.clone(),
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }

    fn record_error(&mut self, context: &str, error: String) {
        self.health.record_error(context, &error);
        self.handler.on_error(&error);
        self.error = Some(error);
    }

    fn handle_connect(&mut self) {
        match self.state {
            ChannelState::Open | ChannelState::Connecting => {
                debug!(
                    connection = %self.url,
                    state = self.state.as_str(),
                    "connect ignored; connection already active"
                );
                return;
            }
            ChannelState::ReconnectPending => {
                // Connect now instead of waiting out the backoff; the attempt
                // still counts against the current session.
                if let Some(handle) = self.reconnect_task.take() {
                    handle.abort();
                }
            }
            ChannelState::Disconnected | ChannelState::Error => {
                self.retry_count = 0;
            }
        }
        self.open_transport();
    }

    fn open_transport(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);

        if let Err(err) = validate_endpoint(&self.url) {
            warn!(connection = %self.url, error = %err, "failed to create websocket connection");
            self.state = ChannelState::Error;
            self.record_error(
                "connect",
                format!("Failed to create WebSocket connection: {err}"),
            );
            self.publish();
            return;
        }

        self.state = ChannelState::Connecting;
        self.publish();

        let epoch = self.epoch;
        let actor_ref = self.actor_ref.clone();
        let url = self.url.clone();
        let buffers = self.ws_buffers;
        let transport = self.transport.clone();

        self.connect_task = Some(tokio::spawn(async move {
            match transport.connect(url, buffers).await {
                Ok((reader, writer)) => {
                    let _ = actor_ref
                        .tell(ConnectionEstablished::<T> {
                            epoch,
                            reader,
                            writer,
                        })
                        .send()
                        .await;
                }
                Err(err) => {
                    let _ = actor_ref
                        .tell(ConnectionFailed {
                            epoch,
                            error: err.to_string(),
                        })
                        .send()
                        .await;
                }
            }
        }));
    }

    async fn on_connection_established(
        &mut self,
        epoch: u64,
        reader: T::Reader,
        mut writer: T::Writer,
    ) {
        if epoch != self.epoch || self.state != ChannelState::Connecting {
            debug!(connection = %self.url, "discarding superseded connection");
            tokio::spawn(async move {
                let _ = writer.close().await;
            });
            return;
        }

        info!(connection = %self.url, "websocket connection established");
        self.connect_task = None;
        self.state = ChannelState::Open;
        self.retry_count = 0;
        self.error = None;
        self.health.reset();
        self.writer_ref = Some(WsWriterActor::spawn(WsWriterActor::new(writer)));
        self.handler.on_open();

        // Handshake goes out before any caller traffic: callers' SendMessage
        // requests queue behind this handler in the mailbox.
        if let Some(frame) = self.handler.subscribe_frame()
            && let Err(err) = self.write(frame).await
        {
            self.publish();
            self.handle_closed(WsDisconnectCause::WriteFailure {
                error: err.to_string(),
            })
            .await;
            return;
        }

        self.spawn_reader(epoch, reader);
        self.publish();
    }

    fn spawn_reader(&mut self, epoch: u64, mut reader: T::Reader) {
        let actor_ref = self.actor_ref.clone();
        let label = self.url.clone();
        self.reader_task = Some(tokio::spawn(async move {
            while let Some(item) = reader.next().await {
                match item {
                    Ok(frame @ WsFrame::Close(_)) => {
                        let reason = match &frame {
                            WsFrame::Close(Some(close)) => {
                                String::from_utf8_lossy(close.reason.as_ref()).into_owned()
                            }
                            _ => String::new(),
                        };
                        let code = frame.close_code().unwrap_or(CLOSE_NORMAL);
                        info!(connection = %label, code, reason = %reason, "received websocket close frame");
                        let _ = actor_ref
                            .tell(ConnectionClosed {
                                epoch,
                                cause: WsDisconnectCause::RemoteClosed { code, reason },
                            })
                            .send()
                            .await;
                        return;
                    }
                    Ok(frame) => {
                        if actor_ref.tell(Inbound { epoch, frame }).send().await.is_err() {
                            return;
                        }
                    }
                    Err(err) => {
                        let _ = actor_ref
                            .tell(ConnectionClosed {
                                epoch,
                                cause: WsDisconnectCause::ReadFailure {
                                    error: err.to_string(),
                                },
                            })
                            .send()
                            .await;
                        return;
                    }
                }
            }
            let _ = actor_ref
                .tell(ConnectionClosed {
                    epoch,
                    cause: WsDisconnectCause::StreamEnded,
                })
                .send()
                .await;
        }));
    }

    fn process_inbound(&mut self, frame: WsFrame) {
        // Protocol ping/pong control frames are answered by the transport.
        let Some(bytes) = frame_bytes(&frame) else {
            return;
        };
        self.health.record_message();

        match self.handler.parse(bytes) {
            Ok(message) => {
                self.handler.handle_message(&message);
                self.last_message = Some(message);
                self.publish();
            }
            Err(err) => {
                let error = err.to_string();
                warn!(
                    connection = %self.url,
                    error = %error,
                    payload_len = bytes.len(),
                    "error parsing websocket message; frame dropped"
                );
                self.health.record_decode_error(&error);
            }
        }
    }

    async fn write(&mut self, frame: WsFrame) -> WebSocketResult<()> {
        let Some(writer) = self.writer_ref.clone() else {
            return Err(WebSocketError::InvalidState("no active writer".to_string()));
        };
        writer
            .ask(WriterWrite { frame })
            .await
            .map_err(flatten_send_error)
    }

    async fn send_frame(&mut self, frame: WsFrame) -> bool {
        if self.state != ChannelState::Open || self.writer_ref.is_none() {
            warn!(
                connection = %self.url,
                state = self.state.as_str(),
                "websocket is not connected; message dropped"
            );
            return false;
        }
        match self.write(frame).await {
            Ok(()) => true,
            Err(err) => {
                warn!(connection = %self.url, error = %err, "websocket write failed");
                self.handle_closed(WsDisconnectCause::WriteFailure {
                    error: err.to_string(),
                })
                .await;
                false
            }
        }
    }

    /// Retire the current connection: stale events are ignored from here on.
    async fn close_connection(&mut self, close_frame: Option<WsFrame>) {
        self.epoch = self.epoch.wrapping_add(1);
        if let Some(handle) = self.connect_task.take() {
            handle.abort();
        }
        if let Some(handle) = self.reconnect_task.take() {
            handle.abort();
        }
        if let Some(writer) = self.writer_ref.take() {
            if let Err(err) = writer.ask(WriterClose { frame: close_frame }).await {
                debug!(connection = %self.url, error = %err, "writer close failed");
            }
            let _ = writer.stop_gracefully().await;
            writer.wait_for_shutdown().await;
        }
        if let Some(handle) = self.reader_task.take() {
            handle.abort();
        }
    }

    async fn handle_manual_disconnect(&mut self) {
        let was_open = self.state == ChannelState::Open;
        let close_frame = was_open.then(|| WsFrame::close(CLOSE_NORMAL, "Manual disconnect"));
        self.close_connection(close_frame).await;

        if self.state != ChannelState::Disconnected {
            info!(
                connection = %self.url,
                from = self.state.as_str(),
                "websocket disconnected by owner"
            );
        }
        self.state = ChannelState::Disconnected;
        if was_open {
            self.handler.on_disconnect(&WsDisconnectCause::Manual);
        }
        self.publish();
    }

    async fn handle_closed(&mut self, cause: WsDisconnectCause) {
        self.close_connection(None).await;

        match &cause {
            WsDisconnectCause::ReadFailure { error } | WsDisconnectCause::WriteFailure { error } => {
                self.record_error("transport", format!("WebSocket connection error: {error}"));
            }
            WsDisconnectCause::HandshakeFailed { message } => {
                self.record_error("connect", format!("WebSocket connection error: {message}"));
            }
            WsDisconnectCause::Manual
            | WsDisconnectCause::RemoteClosed { .. }
            | WsDisconnectCause::StreamEnded => {}
        }

        self.handler.on_disconnect(&cause);
        let action = self.handler.classify_disconnect(&cause);
        self.schedule_reconnect(&cause, action);
    }

    fn schedule_reconnect(&mut self, cause: &WsDisconnectCause, action: WsDisconnectAction) {
        if action == WsDisconnectAction::Abort {
            self.state = ChannelState::Disconnected;
            self.log_reconnect_plan("abort", cause, action, None);
            self.publish();
            return;
        }

        if self.retry_count >= self.reconnect.max_attempts() {
            self.state = ChannelState::Disconnected;
            self.record_error(
                "reconnect",
                format!(
                    "WebSocket reconnect attempts exhausted after {} attempts",
                    self.retry_count
                ),
            );
            self.log_reconnect_plan("exhausted", cause, action, None);
            self.publish();
            return;
        }

        let delay = self.reconnect.delay_for(self.retry_count.saturating_add(1));
        self.state = ChannelState::ReconnectPending;
        self.health.increment_reconnect();
        self.log_reconnect_plan("scheduled", cause, action, Some(delay));

        let epoch = self.epoch;
        let actor_ref = self.actor_ref.clone();
        self.reconnect_task = Some(tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let _ = actor_ref.tell(ReconnectDue { epoch }).send().await;
        }));
        self.publish();
    }

    fn log_reconnect_plan(
        &self,
        note: &str,
        cause: &WsDisconnectCause,
        action: WsDisconnectAction,
        delay: Option<Duration>,
    ) {
        let delay_ms = delay.map(|d| d.as_millis().min(u64::MAX as u128) as u64);
        let stats = self.health.get_stats();
        let uptime_ms = stats.uptime.as_millis().min(u64::MAX as u128) as u64;
        let last_error = self.health.last_error();

        if action == WsDisconnectAction::Abort {
            info!(
                connection = %self.url,
                note = %note,
                close_code = cause.close_code(),
                cause = ?cause,
                "websocket closed normally; not reconnecting"
            );
            return;
        }

        warn!(
            connection = %self.url,
            note = %note,
            close_code = cause.close_code(),
            cause = ?cause,
            action = ?action,
            attempt = self.retry_count.saturating_add(1),
            max_attempts = self.reconnect.max_attempts(),
            delay_ms,
            uptime_ms,
            messages = stats.messages,
            last_error = last_error.as_deref(),
            "websocket reconnect plan"
        );
    }
}

/// Unwrap handler errors; mailbox failures become [`WebSocketError::ActorError`].
pub(crate) fn flatten_send_error<M>(err: SendError<M, WebSocketError>) -> WebSocketError {
    match err {
        SendError::HandlerError(err) => err,
        other => WebSocketError::ActorError(other.to_string()),
    }
}

/// Reject endpoints a websocket client could never open.
fn validate_endpoint(url: &str) -> WebSocketResult<()> {
    let uri: http::Uri = url
        .parse()
        .map_err(|err: http::uri::InvalidUri| WebSocketError::InvalidUrl(format!("{url}: {err}")))?;
    match uri.scheme_str() {
        Some("ws") | Some("wss") => {}
        other => {
            return Err(WebSocketError::InvalidUrl(format!(
                "{url}: unsupported scheme {}",
                other.unwrap_or("<none>")
            )));
        }
    }
    if uri.host().is_none_or(str::is_empty) {
        return Err(WebSocketError::InvalidUrl(format!("{url}: missing host")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_validation_accepts_ws_schemes() {
        assert!(validate_endpoint("ws://localhost:8000/ws").is_ok());
        assert!(validate_endpoint("wss://example.com/ws?client_id=a").is_ok());
    }

    #[test]
    fn endpoint_validation_rejects_malformed_urls() {
        for bad in ["", "not a url", "http://localhost:8000/ws", "ws://", "/ws"] {
            assert!(
                matches!(validate_endpoint(bad), Err(WebSocketError::InvalidUrl(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
