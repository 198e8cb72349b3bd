use futures_util::{Sink, SinkExt};
use kameo::prelude::{Actor, ActorRef, Context, Message as KameoMessage};
use tracing::debug;

use crate::core::{WebSocketError, WebSocketResult, WsFrame};

/// Writer actor that owns the transport sink and serializes writes.
///
/// One writer lives per physical connection; the channel actor drops it on
/// every disconnect.
pub struct WsWriterActor<W>
where
    W: Sink<WsFrame, Error = WebSocketError> + Send + Sync + Unpin + 'static,
{
    writer: W,
    closed: bool,
}

impl<W> WsWriterActor<W>
where
    W: Sink<WsFrame, Error = WebSocketError> + Send + Sync + Unpin + 'static,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            closed: false,
        }
    }
}

impl<W> Actor for WsWriterActor<W>
where
    W: Sink<WsFrame, Error = WebSocketError> + Send + Sync + Unpin + 'static,
{
    type Args = Self;
    type Error = WebSocketError;

    fn name() -> &'static str {
        "WsWriterActor"
    }

    async fn on_start(args: Self::Args, _ctx: ActorRef<Self>) -> Result<Self, Self::Error> {
        Ok(args)
    }

    fn on_panic(
        &mut self,
        _actor_ref: kameo::actor::WeakActorRef<Self>,
        err: kameo::prelude::PanicError,
    ) -> impl std::future::Future<
        Output = Result<std::ops::ControlFlow<kameo::prelude::ActorStopReason>, Self::Error>,
    > + Send {
        async move {
            tracing::error!(error = ?err, "WsWriterActor panicked");
            Ok(std::ops::ControlFlow::Break(
                kameo::prelude::ActorStopReason::Panicked(err),
            ))
        }
    }
}

/// Write one frame to the wire.
#[derive(Clone, Debug)]
pub struct WriterWrite {
    pub frame: WsFrame,
}

impl<W> KameoMessage<WriterWrite> for WsWriterActor<W>
where
    W: Sink<WsFrame, Error = WebSocketError> + Send + Sync + Unpin + 'static,
{
    type Reply = WebSocketResult<()>;

    async fn handle(
        &mut self,
        msg: WriterWrite,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        if self.closed {
            return Err(WebSocketError::InvalidState("writer closed".to_string()));
        }
        debug!(target: "ws-writer", "sending websocket frame to wire");
        self.writer.send(msg.frame).await
    }
}

/// Send a close frame (best effort) and close the sink.
#[derive(Clone, Debug)]
pub struct WriterClose {
    pub frame: Option<WsFrame>,
}

impl<W> KameoMessage<WriterClose> for WsWriterActor<W>
where
    W: Sink<WsFrame, Error = WebSocketError> + Send + Sync + Unpin + 'static,
{
    type Reply = WebSocketResult<()>;

    async fn handle(
        &mut self,
        msg: WriterClose,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if let Some(frame) = msg.frame {
            if let Err(err) = self.writer.send(frame).await {
                debug!(target: "ws-writer", error = %err, "close frame not delivered");
            }
        }
        self.writer.close().await
    }
}
