//! Dashboard protocol spoken over the realtime channel.

pub mod endpoint;
pub mod message;

pub use endpoint::*;
pub use message::*;

use crate::core::ExponentialBackoffReconnect;
use crate::transport::tungstenite::TungsteniteTransport;
use crate::ws::{ChannelHandle, RealtimeChannel};

/// Realtime channel speaking the dashboard protocol.
pub type DashboardChannel<T = TungsteniteTransport> =
    RealtimeChannel<DashboardEndpoint, ExponentialBackoffReconnect, T>;

/// Handle over a [`DashboardChannel`].
pub type DashboardHandle<T = TungsteniteTransport> =
    ChannelHandle<DashboardEndpoint, ExponentialBackoffReconnect, T>;
