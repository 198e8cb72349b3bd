//! Keyed query cache shared between the realtime channel and data fetchers.
//!
//! The channel never reads cached values. It only marks keys stale through
//! [`InvalidationSink`]; fetchers spawned with [`QueryCache::spawn_query`]
//! refetch on their interval and right after an invalidation.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

const INVALIDATION_CHANNEL_CAPACITY: usize = 64;

/// Identifier of a cached dashboard query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    SystemMetrics,
    ScalingStatus,
    ScalingDecision,
    Forecast,
    HealthStatus,
    AnomalyDetection,
}

impl CacheKey {
    pub const ALL: [CacheKey; 6] = [
        CacheKey::SystemMetrics,
        CacheKey::ScalingStatus,
        CacheKey::ScalingDecision,
        CacheKey::Forecast,
        CacheKey::HealthStatus,
        CacheKey::AnomalyDetection,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CacheKey::SystemMetrics => "systemMetrics",
            CacheKey::ScalingStatus => "scalingStatus",
            CacheKey::ScalingDecision => "scalingDecision",
            CacheKey::Forecast => "forecast",
            CacheKey::HealthStatus => "healthStatus",
            CacheKey::AnomalyDetection => "anomalyDetection",
        }
    }

    /// Polling interval used by the dashboard for keys that refresh on a timer.
    pub fn default_refetch_interval(self) -> Option<Duration> {
        match self {
            CacheKey::HealthStatus => Some(Duration::from_secs(30)),
            CacheKey::ScalingStatus => Some(Duration::from_secs(10)),
            CacheKey::SystemMetrics => Some(Duration::from_secs(5)),
            CacheKey::ScalingDecision | CacheKey::Forecast | CacheKey::AnomalyDetection => None,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receiver of staleness signals.
pub trait InvalidationSink: Send + Sync + 'static {
    fn invalidate(&self, key: CacheKey);
}

/// A cached value with its freshness.
#[derive(Debug, Clone)]
pub struct Cached<T> {
    pub value: Arc<T>,
    pub stale: bool,
    pub age: Duration,
}

#[derive(Clone)]
struct Slot {
    value: Arc<dyn Any + Send + Sync>,
    fetched_at: Instant,
    stale: bool,
}

pub struct QueryCache {
    entries: DashMap<CacheKey, Slot>,
    invalidations: broadcast::Sender<CacheKey>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        let (invalidations, _) = broadcast::channel(INVALIDATION_CHANNEL_CAPACITY);
        Self {
            entries: DashMap::new(),
            invalidations,
        }
    }

    /// Store a fresh value for `key`, replacing any previous one.
    pub fn set<T>(&self, key: CacheKey, value: T)
    where
        T: Send + Sync + 'static,
    {
        self.entries.insert(
            key,
            Slot {
                value: Arc::new(value),
                fetched_at: Instant::now(),
                stale: false,
            },
        );
    }

    /// Cached value for `key`, or `None` when absent or stored as another type.
    pub fn get<T>(&self, key: CacheKey) -> Option<Cached<T>>
    where
        T: Send + Sync + 'static,
    {
        let slot = self.entries.get(&key)?.clone();
        let value = slot.value.downcast::<T>().ok()?;
        Some(Cached {
            value,
            stale: slot.stale,
            age: slot.fetched_at.elapsed(),
        })
    }

    /// Missing keys count as stale.
    pub fn is_stale(&self, key: CacheKey) -> bool {
        self.entries.get(&key).is_none_or(|slot| slot.stale)
    }

    /// Mark `key` stale and notify every fetcher watching it.
    pub fn invalidate(&self, key: CacheKey) {
        if let Some(mut slot) = self.entries.get_mut(&key) {
            slot.stale = true;
        }
        debug!(key = %key, "query invalidated");
        // No receivers just means nothing is polling this cache yet.
        let _ = self.invalidations.send(key);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheKey> {
        self.invalidations.subscribe()
    }

    /// Keep `key` populated: fetch immediately, then every `interval` and after
    /// each invalidation of `key`. Failed fetches keep the previous value.
    pub fn spawn_query<T, E, F, Fut>(
        self: &Arc<Self>,
        key: CacheKey,
        interval: Duration,
        fetch: F,
    ) -> JoinHandle<()>
    where
        T: Send + Sync + 'static,
        E: fmt::Display + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let cache = Arc::clone(self);
        let mut invalidated = cache.subscribe();
        let period = interval.max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    recv = invalidated.recv() => match recv {
                        Ok(k) if k == key => ticker.reset(),
                        Ok(_) => continue,
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(key = %key, skipped, "invalidation receiver lagged; refetching");
                        }
                        Err(RecvError::Closed) => return,
                    },
                }

                match fetch().await {
                    Ok(value) => cache.set(key, value),
                    Err(err) => warn!(key = %key, error = %err, "query fetch failed"),
                }
            }
        })
    }
}

impl InvalidationSink for QueryCache {
    fn invalidate(&self, key: CacheKey) {
        QueryCache::invalidate(self, key);
    }
}
