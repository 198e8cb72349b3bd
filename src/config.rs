use std::time::Duration;

use crate::core::{
    ExponentialBackoffReconnect, WebSocketBufferConfig, WsEndpointHandler,
};
use crate::transport::WsTransport;
use crate::ws::RealtimeChannelArgs;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_WS_URL: &str = "ws://localhost:8000/ws";
pub const DEFAULT_JWT_SECRET: &str = "dev_secret_change_me";
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Endpoint and reconnect tuning for one realtime channel.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub url: String,
    pub reconnect_base: Duration,
    pub reconnect_max: Duration,
    pub max_reconnect_attempts: u32,
    pub buffers: WebSocketBufferConfig,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::new(DEFAULT_WS_URL)
    }
}

impl ChannelConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_base: ExponentialBackoffReconnect::DEFAULT_BASE,
            reconnect_max: ExponentialBackoffReconnect::DEFAULT_MAX,
            max_reconnect_attempts: ExponentialBackoffReconnect::DEFAULT_MAX_ATTEMPTS,
            buffers: WebSocketBufferConfig::default(),
        }
    }

    pub fn with_backoff(mut self, base: Duration, max: Duration, max_attempts: u32) -> Self {
        self.reconnect_base = base;
        self.reconnect_max = max;
        self.max_reconnect_attempts = max_attempts;
        self
    }

    pub fn reconnect_strategy(&self) -> ExponentialBackoffReconnect {
        ExponentialBackoffReconnect::new(
            self.reconnect_base,
            self.reconnect_max,
            self.max_reconnect_attempts,
        )
    }

    pub fn channel_args<E, T>(
        &self,
        handler: E,
        transport: T,
    ) -> RealtimeChannelArgs<E, ExponentialBackoffReconnect, T>
    where
        E: WsEndpointHandler,
        T: WsTransport,
    {
        RealtimeChannelArgs {
            url: self.url.clone(),
            transport,
            reconnect_strategy: self.reconnect_strategy(),
            handler,
            ws_buffers: self.buffers,
        }
    }
}

/// Token signing settings for the auth service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_ttl: DEFAULT_TOKEN_TTL,
        }
    }
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            ..Self::default()
        }
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::WsReconnectStrategy;

    #[test]
    fn channel_defaults_follow_dashboard_backoff() {
        let config = ChannelConfig::default();
        assert_eq!(config.url, DEFAULT_WS_URL);

        let strategy = config.reconnect_strategy();
        assert_eq!(strategy.max_attempts(), 5);
        assert_eq!(strategy.delay_for(1), Duration::from_secs(1));
        assert_eq!(strategy.delay_for(6), Duration::from_secs(30));
    }

    #[test]
    fn auth_defaults_flag_the_development_secret() {
        assert!(AuthConfig::default().uses_default_secret());
        assert_eq!(AuthConfig::default().token_ttl, Duration::from_secs(604_800));
        assert!(!AuthConfig::new("prod-secret").uses_default_secret());
    }
}
