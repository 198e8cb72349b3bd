use serde::Deserialize;
use sonic_rs::{JsonValueTrait, Value};
use thiserror::Error;

use crate::cache::CacheKey;

/// Why an inbound frame could not be turned into an [`InboundMessage`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid json: {0}")]
    Json(String),
    #[error("message has no type")]
    MissingType,
    #[error("message type is not a string")]
    NonStringType,
}

/// Top-level `type` discriminator of an inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    /// `subscribe_ack` or `subscription_confirmed`.
    SubscribeAck,
    ConnectionEstablished,
    ScalingEvent,
    SystemMetrics,
    Alert,
    HealthStatus,
    Pong,
    /// Error reported by the server in-band.
    ServerError,
    Unknown(String),
}

impl MessageKind {
    fn from_wire(kind: String) -> Self {
        match kind.as_str() {
            "subscribe_ack" | "subscription_confirmed" => MessageKind::SubscribeAck,
            "connection_established" => MessageKind::ConnectionEstablished,
            "scaling_event" => MessageKind::ScalingEvent,
            "system_metrics" => MessageKind::SystemMetrics,
            "alert" => MessageKind::Alert,
            "health_status" => MessageKind::HealthStatus,
            "pong" => MessageKind::Pong,
            "error" => MessageKind::ServerError,
            _ => MessageKind::Unknown(kind),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MessageKind::SubscribeAck => "subscribe_ack",
            MessageKind::ConnectionEstablished => "connection_established",
            MessageKind::ScalingEvent => "scaling_event",
            MessageKind::SystemMetrics => "system_metrics",
            MessageKind::Alert => "alert",
            MessageKind::HealthStatus => "health_status",
            MessageKind::Pong => "pong",
            MessageKind::ServerError => "error",
            MessageKind::Unknown(kind) => kind,
        }
    }

    /// Acknowledgements and keepalive replies with no dashboard effect.
    pub fn is_informational(&self) -> bool {
        matches!(
            self,
            MessageKind::SubscribeAck | MessageKind::ConnectionEstablished | MessageKind::Pong
        )
    }
}

/// `event_type` of a `scaling_event`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventSubtype {
    ScalingDecision,
    ScalingExecution,
    AnomalyDetection,
    ForecastUpdate,
    HealthStatus,
    Other(String),
}

impl EventSubtype {
    fn from_wire(subtype: String) -> Self {
        match subtype.as_str() {
            "scaling_decision" => EventSubtype::ScalingDecision,
            "scaling_execution" => EventSubtype::ScalingExecution,
            "anomaly_detection" => EventSubtype::AnomalyDetection,
            "forecast_update" => EventSubtype::ForecastUpdate,
            "health_status" => EventSubtype::HealthStatus,
            _ => EventSubtype::Other(subtype),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventSubtype::ScalingDecision => "scaling_decision",
            EventSubtype::ScalingExecution => "scaling_execution",
            EventSubtype::AnomalyDetection => "anomaly_detection",
            EventSubtype::ForecastUpdate => "forecast_update",
            EventSubtype::HealthStatus => "health_status",
            EventSubtype::Other(subtype) => subtype,
        }
    }
}

/// Only `type` has to be a string; the other fields are optional metadata and a
/// value of an unexpected JSON type reads as absent.
#[derive(Deserialize)]
struct RawInbound {
    #[serde(rename = "type", default)]
    kind: Option<Value>,
    #[serde(default)]
    event_type: Option<Value>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    timestamp: Option<Value>,
    #[serde(default)]
    message: Option<Value>,
}

fn string_field(value: Option<Value>) -> Option<String> {
    value.as_ref().and_then(|v| v.as_str()).map(str::to_owned)
}

/// Decoded server-to-client frame.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub kind: MessageKind,
    pub event_type: Option<EventSubtype>,
    pub data: Option<Value>,
    pub timestamp: Option<String>,
    pub message: Option<String>,
}

impl InboundMessage {
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let raw: RawInbound =
            sonic_rs::from_slice(payload).map_err(|e| DecodeError::Json(e.to_string()))?;
        let kind = raw.kind.ok_or(DecodeError::MissingType)?;
        let kind = kind.as_str().ok_or(DecodeError::NonStringType)?.to_owned();

        Ok(Self {
            kind: MessageKind::from_wire(kind),
            event_type: string_field(raw.event_type).map(EventSubtype::from_wire),
            data: raw.data,
            timestamp: string_field(raw.timestamp),
            message: string_field(raw.message),
        })
    }

    /// Cache keys made stale by this message.
    pub fn invalidations(&self) -> &'static [CacheKey] {
        match (&self.kind, &self.event_type) {
            (MessageKind::ScalingEvent, Some(subtype)) => match subtype {
                EventSubtype::ScalingDecision => {
                    &[CacheKey::ScalingDecision, CacheKey::ScalingStatus]
                }
                EventSubtype::ScalingExecution => {
                    &[CacheKey::ScalingStatus, CacheKey::SystemMetrics]
                }
                EventSubtype::AnomalyDetection => &[CacheKey::AnomalyDetection],
                EventSubtype::ForecastUpdate => &[CacheKey::Forecast],
                EventSubtype::HealthStatus => &[CacheKey::HealthStatus],
                EventSubtype::Other(_) => &[],
            },
            (MessageKind::SystemMetrics, _) => &[CacheKey::SystemMetrics],
            (MessageKind::HealthStatus, _) => &[CacheKey::HealthStatus],
            _ => &[],
        }
    }
}
