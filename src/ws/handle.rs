use kameo::prelude::{Actor, ActorRef};
use serde::Serialize;
use tokio::sync::watch;

use super::actor::{
    ChannelEvent, GetConnectionStats, Ping, RealtimeChannel, RealtimeChannelArgs, SendMessage,
    SubscribeSnapshots, flatten_send_error,
};
use crate::core::{
    ChannelSnapshot, ChannelState, ExponentialBackoffReconnect, WebSocketError, WebSocketResult,
    WsConnectionStats, WsEndpointHandler, WsFrame, WsReconnectStrategy,
};
use crate::transport::WsTransport;
use crate::transport::tungstenite::TungsteniteTransport;

/// Owner-facing handle over a spawned [`RealtimeChannel`].
///
/// Commands go through the actor mailbox; observable state is read from the
/// snapshot watch without a round trip.
pub struct ChannelHandle<E, R = ExponentialBackoffReconnect, T = TungsteniteTransport>
where
    E: WsEndpointHandler,
    R: WsReconnectStrategy,
    T: WsTransport,
{
    actor: ActorRef<RealtimeChannel<E, R, T>>,
    snapshots: watch::Receiver<ChannelSnapshot<E::Message>>,
}

impl<E, R, T> Clone for ChannelHandle<E, R, T>
where
    E: WsEndpointHandler,
    R: WsReconnectStrategy,
    T: WsTransport,
{
    fn clone(&self) -> Self {
        Self {
            actor: self.actor.clone(),
            snapshots: self.snapshots.clone(),
        }
    }
}

impl<E, R, T> ChannelHandle<E, R, T>
where
    E: WsEndpointHandler,
    R: WsReconnectStrategy,
    T: WsTransport,
{
    /// Spawn the channel actor. The channel starts disconnected.
    pub async fn spawn(args: RealtimeChannelArgs<E, R, T>) -> WebSocketResult<Self> {
        let actor = RealtimeChannel::spawn(args);
        let snapshots = actor
            .ask(SubscribeSnapshots)
            .await
            .map_err(flatten_send_error)?;
        Ok(Self { actor, snapshots })
    }

    pub fn actor(&self) -> &ActorRef<RealtimeChannel<E, R, T>> {
        &self.actor
    }

    pub async fn connect(&self) -> WebSocketResult<()> {
        self.actor
            .ask(ChannelEvent::Connect)
            .await
            .map_err(flatten_send_error)
    }

    pub async fn disconnect(&self) -> WebSocketResult<()> {
        self.actor
            .ask(ChannelEvent::Disconnect)
            .await
            .map_err(flatten_send_error)
    }

    /// Serialize `message` as JSON and send it. Returns `Ok(false)` when the
    /// channel is not open.
    pub async fn send_message<S>(&self, message: &S) -> WebSocketResult<bool>
    where
        S: Serialize + ?Sized,
    {
        let text =
            sonic_rs::to_string(message).map_err(|e| WebSocketError::EncodeFailed(e.to_string()))?;
        self.send_frame(WsFrame::text(text)).await
    }

    pub async fn send_frame(&self, frame: WsFrame) -> WebSocketResult<bool> {
        self.actor
            .ask(SendMessage { frame })
            .await
            .map_err(flatten_send_error)
    }

    pub async fn ping(&self) -> WebSocketResult<bool> {
        self.actor.ask(Ping).await.map_err(flatten_send_error)
    }

    pub fn snapshot(&self) -> ChannelSnapshot<E::Message> {
        self.snapshots.borrow().clone()
    }

    pub fn state(&self) -> ChannelState {
        self.snapshots.borrow().state
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    pub fn last_message(&self) -> Option<E::Message> {
        self.snapshots.borrow().last_message.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.snapshots.borrow().error.clone()
    }

    /// Receiver notified on every state transition and decoded message.
    pub fn subscribe(&self) -> watch::Receiver<ChannelSnapshot<E::Message>> {
        self.snapshots.clone()
    }

    pub async fn stats(&self) -> WebSocketResult<WsConnectionStats> {
        self.actor
            .ask(GetConnectionStats)
            .await
            .map_err(flatten_send_error)
    }

    /// Disconnect and stop the actor.
    pub async fn shutdown(self) -> WebSocketResult<()> {
        self.disconnect().await?;
        self.actor
            .stop_gracefully()
            .await
            .map_err(|e| WebSocketError::ActorError(e.to_string()))?;
        self.actor.wait_for_shutdown().await;
        Ok(())
    }
}
