//! Dashboard backend for an auto-scaling system: a kameo-based realtime update
//! channel, a keyed query cache, a typed prediction-API client and an auth API.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod core;
pub mod dashboard;
pub mod testing;
pub mod transport;
pub mod ws;

pub use cache::{CacheKey, InvalidationSink, QueryCache};
pub use dashboard::{DashboardEndpoint, DashboardHandle, InboundMessage};
pub use ws::{ChannelEvent, ChannelHandle, RealtimeChannel, RealtimeChannelArgs};
