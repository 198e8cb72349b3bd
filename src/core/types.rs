use std::fmt::Debug;
use std::time::Duration;

use thiserror::Error;

use super::frame::{CLOSE_ABNORMAL, CLOSE_NORMAL, WsFrame};

/// Convenience result alias for websocket operations.
pub type WebSocketResult<T> = Result<T, WebSocketError>;

/// Canonical websocket error surface shared across the channel.
#[derive(Debug, Clone, Error)]
pub enum WebSocketError {
    #[error("Invalid endpoint: {0}")]
    InvalidUrl(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Transport error ({context}): {error}")]
    TransportError {
        context: &'static str,
        error: String,
    },

    #[error("Encode failed: {0}")]
    EncodeFailed(String),

    #[error("Actor error: {0}")]
    ActorError(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Transport-independent buffer sizing parameters used for websocket configuration.
#[derive(Clone, Copy, Debug)]
pub struct WebSocketBufferConfig {
    pub write_buffer_bytes: usize,
    pub max_write_buffer_bytes: usize,
    pub max_message_bytes: usize,
    pub max_frame_bytes: usize,
}

impl Default for WebSocketBufferConfig {
    fn default() -> Self {
        // Dashboard events are small JSON documents.
        Self {
            write_buffer_bytes: 64 << 10,
            max_write_buffer_bytes: 256 << 10,
            max_message_bytes: 4 * 1024 * 1024,
            max_frame_bytes: 4 * 1024 * 1024,
        }
    }
}

/// Lifecycle state of a realtime channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelState {
    #[default]
    Disconnected,
    Connecting,
    Open,
    ReconnectPending,
    Error,
}

impl ChannelState {
    #[inline]
    pub fn is_connected(self) -> bool {
        matches!(self, ChannelState::Open)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChannelState::Disconnected => "disconnected",
            ChannelState::Connecting => "connecting",
            ChannelState::Open => "open",
            ChannelState::ReconnectPending => "reconnect_pending",
            ChannelState::Error => "error",
        }
    }
}

/// Why a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsDisconnectCause {
    /// `disconnect()` was called by the owner.
    Manual,
    /// The server sent a close frame.
    RemoteClosed { code: u16, reason: String },
    /// The stream ended without a close frame.
    StreamEnded,
    ReadFailure { error: String },
    WriteFailure { error: String },
    HandshakeFailed { message: String },
}

impl WsDisconnectCause {
    /// Close code equivalent for this cause. Anything that is not an explicit
    /// close frame is reported as abnormal.
    pub fn close_code(&self) -> u16 {
        match self {
            WsDisconnectCause::Manual => CLOSE_NORMAL,
            WsDisconnectCause::RemoteClosed { code, .. } => *code,
            WsDisconnectCause::StreamEnded
            | WsDisconnectCause::ReadFailure { .. }
            | WsDisconnectCause::WriteFailure { .. }
            | WsDisconnectCause::HandshakeFailed { .. } => CLOSE_ABNORMAL,
        }
    }
}

/// Actions the reconnect policy may take after a disconnect classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WsDisconnectAction {
    BackoffReconnect,
    Abort,
}

/// Basic connection statistics snapshot.
#[derive(Clone, Debug)]
pub struct WsConnectionStats {
    pub uptime: Duration,
    pub messages: u64,
    pub decode_errors: u64,
    pub errors: u64,
    pub reconnects: u64,
    pub last_message_age: Duration,
    pub recent_errors: usize,
}

/// Observable channel state, published on every transition.
#[derive(Debug, Clone)]
pub struct ChannelSnapshot<M> {
    pub state: ChannelState,
    pub retry_count: u32,
    pub last_message: Option<M>,
    pub error: Option<String>,
}

impl<M> ChannelSnapshot<M> {
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }
}

impl<M> Default for ChannelSnapshot<M> {
    fn default() -> Self {
        Self {
            state: ChannelState::Disconnected,
            retry_count: 0,
            last_message: None,
            error: None,
        }
    }
}

/// Reconnect policy consulted after an abnormal closure.
pub trait WsReconnectStrategy: Send + Sync + 'static {
    /// Delay before reconnect attempt `attempt` (1-indexed).
    fn delay_for(&self, attempt: u32) -> Duration;

    /// Reconnect attempts allowed before the channel gives up.
    fn max_attempts(&self) -> u32;
}

/// Application-specific protocol adapter driven by the channel actor.
///
/// The actor owns connection state and retry policy; the endpoint owns the
/// wire format and what each inbound message means.
pub trait WsEndpointHandler: Send + Sync + 'static {
    type Message: Clone + Debug + Send + Sync + 'static;
    type Error: std::error::Error + Send + Sync;

    /// Handshake frame sent first on every successful open.
    fn subscribe_frame(&mut self) -> Option<WsFrame>;

    /// Application-level liveness frame.
    fn ping_frame(&mut self) -> Option<WsFrame> {
        None
    }

    fn parse(&mut self, data: &[u8]) -> Result<Self::Message, Self::Error>;

    fn handle_message(&mut self, msg: &Self::Message);

    fn classify_disconnect(&self, cause: &WsDisconnectCause) -> WsDisconnectAction {
        if cause.close_code() == CLOSE_NORMAL {
            WsDisconnectAction::Abort
        } else {
            WsDisconnectAction::BackoffReconnect
        }
    }

    fn on_open(&mut self) {}

    fn on_disconnect(&mut self, _cause: &WsDisconnectCause) {}

    fn on_error(&mut self, _error: &str) {}
}
