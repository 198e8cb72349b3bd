//! scalewatch CLI.
//!
//! `auth-server` serves the account API; `watch` keeps a realtime channel to
//! the prediction backend open and refreshes the dashboard queries it affects.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use sonic_rs::Value;
use tracing::{info, warn};

use scalewatch::api::ApiClient;
use scalewatch::auth::{self, AuthState, InMemoryUserStore};
use scalewatch::cache::{CacheKey, QueryCache};
use scalewatch::config::{
    AuthConfig, ChannelConfig, DEFAULT_API_BASE_URL, DEFAULT_JWT_SECRET, DEFAULT_WS_URL,
};
use scalewatch::dashboard::{AlertSink, DashboardEndpoint, DashboardHandle};
use scalewatch::transport::tungstenite::TungsteniteTransport;

#[derive(Parser, Debug)]
#[command(
    name = "scalewatch",
    about = "Auto-scaling dashboard backend",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the signup/signin/me API.
    AuthServer {
        /// Listen host.
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: IpAddr,

        /// Listen port.
        #[arg(long, env = "PORT", default_value_t = 4000)]
        port: u16,

        /// HS256 signing secret for session tokens.
        #[arg(long, env = "JWT_SECRET", default_value = DEFAULT_JWT_SECRET, hide_env_values = true)]
        jwt_secret: String,
    },

    /// Follow realtime events from the prediction backend.
    Watch {
        /// Realtime endpoint.
        #[arg(long, env = "WS_URL", default_value = DEFAULT_WS_URL)]
        ws_url: String,

        /// Prediction backend base URL.
        #[arg(long, env = "API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
        api_base_url: String,

        /// Delay before the first reconnect attempt.
        #[arg(long, default_value_t = 1000)]
        reconnect_base_ms: u64,

        /// Upper bound on reconnect delay.
        #[arg(long, default_value_t = 30_000)]
        reconnect_max_ms: u64,

        /// Reconnect attempts before giving up.
        #[arg(long, default_value_t = 5)]
        max_reconnect_attempts: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("info".parse().context("invalid log directive")?),
        )
        .init();

    match cli.command {
        Command::AuthServer {
            host,
            port,
            jwt_secret,
        } => run_auth_server(SocketAddr::new(host, port), AuthConfig::new(jwt_secret)).await,
        Command::Watch {
            ws_url,
            api_base_url,
            reconnect_base_ms,
            reconnect_max_ms,
            max_reconnect_attempts,
        } => {
            let channel = ChannelConfig::new(ws_url).with_backoff(
                Duration::from_millis(reconnect_base_ms),
                Duration::from_millis(reconnect_max_ms),
                max_reconnect_attempts,
            );
            run_watch(channel, &api_base_url).await
        }
    }
}

async fn run_auth_server(listen_addr: SocketAddr, config: AuthConfig) -> anyhow::Result<()> {
    if config.uses_default_secret() {
        warn!("JWT_SECRET not set; using the development secret");
    }

    let state = AuthState::new(Arc::new(InMemoryUserStore::new()), &config);
    auth::serve(listen_addr, state, shutdown_signal())
        .await
        .context("auth server failed")
}

/// Alerts are surfaced in the log.
struct LogAlerts;

impl AlertSink for LogAlerts {
    fn notify(&self, alert: &Value) {
        let payload = sonic_rs::to_string(alert).unwrap_or_default();
        warn!(alert = %payload, "backend alert");
    }
}

async fn run_watch(channel: ChannelConfig, api_base_url: &str) -> anyhow::Result<()> {
    let api = ApiClient::new(api_base_url).context("failed to build HTTP client")?;
    let cache = Arc::new(QueryCache::new());

    let health_api = api.clone();
    let status_api = api.clone();
    let queries = [
        cache.spawn_query(
            CacheKey::HealthStatus,
            CacheKey::HealthStatus
                .default_refetch_interval()
                .unwrap_or(Duration::from_secs(30)),
            move || {
                let api = health_api.clone();
                async move { api.health().await }
            },
        ),
        cache.spawn_query(
            CacheKey::ScalingStatus,
            CacheKey::ScalingStatus
                .default_refetch_interval()
                .unwrap_or(Duration::from_secs(10)),
            move || {
                let api = status_api.clone();
                async move { api.scaling_status().await }
            },
        ),
    ];

    let endpoint = DashboardEndpoint::new(cache.clone()).with_alerts(Arc::new(LogAlerts));
    let handle: DashboardHandle =
        DashboardHandle::spawn(channel.channel_args(endpoint, TungsteniteTransport))
            .await
            .context("failed to start realtime channel")?;

    let mut snapshots = handle.subscribe();
    let observer = tokio::spawn(async move {
        let mut last_state = snapshots.borrow().state;
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            if snapshot.state != last_state {
                info!(
                    from = last_state.as_str(),
                    to = snapshot.state.as_str(),
                    retry_count = snapshot.retry_count,
                    error = snapshot.error.as_deref(),
                    "realtime channel state changed"
                );
                last_state = snapshot.state;
            }
        }
    });

    handle.connect().await.context("connect failed")?;
    info!(
        url = %channel.url,
        api = %api.base_url(),
        "watching realtime events; Ctrl-C to stop"
    );

    shutdown_signal().await;

    handle.shutdown().await.context("channel shutdown failed")?;
    observer.abort();
    for query in queries {
        query.abort();
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
