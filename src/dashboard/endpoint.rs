use std::sync::Arc;

use sonic_rs::Value;
use tracing::{debug, info, warn};

use super::message::{DecodeError, InboundMessage, MessageKind};
use crate::cache::InvalidationSink;
use crate::core::{WsDisconnectCause, WsEndpointHandler, WsFrame};

/// Events requested in the subscribe handshake.
pub const SUBSCRIBED_EVENTS: [&str; 4] = ["scaling_event", "system_metrics", "alert", "health_status"];

const SUBSCRIBE_FRAME: &str =
    r#"{"type":"subscribe","events":["scaling_event","system_metrics","alert","health_status"]}"#;
const PING_FRAME: &str = r#"{"type":"ping"}"#;

/// Receiver of alert payloads pushed by the backend.
pub trait AlertSink: Send + Sync + 'static {
    fn notify(&self, alert: &Value);
}

pub type MessageHook = Arc<dyn Fn(&InboundMessage) + Send + Sync>;
pub type ConnectHook = Arc<dyn Fn() + Send + Sync>;
pub type DisconnectHook = Arc<dyn Fn(&WsDisconnectCause) + Send + Sync>;
pub type ErrorHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Optional caller callbacks. `on_message` sees every decoded message.
#[derive(Clone, Default)]
pub struct DashboardHooks {
    pub on_message: Option<MessageHook>,
    pub on_connect: Option<ConnectHook>,
    pub on_disconnect: Option<DisconnectHook>,
    pub on_error: Option<ErrorHook>,
}

/// Dashboard protocol over the realtime channel: subscribe handshake, inbound
/// classification and cache invalidation.
pub struct DashboardEndpoint {
    invalidations: Arc<dyn InvalidationSink>,
    alerts: Option<Arc<dyn AlertSink>>,
    hooks: DashboardHooks,
}

impl DashboardEndpoint {
    pub fn new(invalidations: Arc<dyn InvalidationSink>) -> Self {
        Self {
            invalidations,
            alerts: None,
            hooks: DashboardHooks::default(),
        }
    }

    pub fn with_alerts(mut self, alerts: Arc<dyn AlertSink>) -> Self {
        self.alerts = Some(alerts);
        self
    }

    pub fn with_hooks(mut self, hooks: DashboardHooks) -> Self {
        self.hooks = hooks;
        self
    }

    fn dispatch(&self, msg: &InboundMessage) {
        match &msg.kind {
            MessageKind::ScalingEvent => {
                info!(
                    event_type = msg.event_type.as_ref().map(|t| t.as_str()),
                    timestamp = msg.timestamp.as_deref(),
                    "scaling event"
                );
            }
            // Alerts without a payload still notify, with a null body.
            MessageKind::Alert => match &self.alerts {
                Some(sink) => match &msg.data {
                    Some(data) => sink.notify(data),
                    None => sink.notify(&Value::default()),
                },
                None => debug!("alert received without a notification sink"),
            },
            MessageKind::ServerError => {
                warn!(message = msg.message.as_deref(), "server reported an error");
            }
            MessageKind::Unknown(kind) => {
                info!(kind = %kind, "unknown websocket message type");
            }
            kind if kind.is_informational() => {
                debug!(kind = kind.as_str(), "websocket control message");
            }
            _ => {}
        }

        for key in msg.invalidations() {
            self.invalidations.invalidate(*key);
        }
    }
}

impl WsEndpointHandler for DashboardEndpoint {
    type Message = InboundMessage;
    type Error = DecodeError;

    fn subscribe_frame(&mut self) -> Option<WsFrame> {
        Some(WsFrame::text_static(SUBSCRIBE_FRAME))
    }

    fn ping_frame(&mut self) -> Option<WsFrame> {
        Some(WsFrame::text_static(PING_FRAME))
    }

    fn parse(&mut self, data: &[u8]) -> Result<Self::Message, Self::Error> {
        InboundMessage::decode(data)
    }

    fn handle_message(&mut self, msg: &Self::Message) {
        if let Some(hook) = &self.hooks.on_message {
            hook(msg);
        }
        self.dispatch(msg);
    }

    fn on_open(&mut self) {
        if let Some(hook) = &self.hooks.on_connect {
            hook();
        }
    }

    fn on_disconnect(&mut self, cause: &WsDisconnectCause) {
        if let Some(hook) = &self.hooks.on_disconnect {
            hook(cause);
        }
    }

    fn on_error(&mut self, error: &str) {
        if let Some(hook) = &self.hooks.on_error {
            hook(error);
        }
    }
}
