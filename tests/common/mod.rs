#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use scalewatch::core::{ChannelSnapshot, ChannelState, ExponentialBackoffReconnect, WsFrame, frame_bytes};
use scalewatch::dashboard::{DashboardEndpoint, DashboardHandle, DashboardHooks, InboundMessage};
use scalewatch::testing::{MockServer, MockTransport, RecordingAlerts, RecordingInvalidations};
use scalewatch::ws::{RealtimeChannelArgs, WebSocketBufferConfig};

pub const TIMEOUT: Duration = Duration::from_secs(2);

pub struct Harness {
    pub handle: DashboardHandle<MockTransport>,
    pub transport: MockTransport,
    pub server: MockServer,
    pub invalidations: Arc<RecordingInvalidations>,
    pub alerts: Arc<RecordingAlerts>,
}

pub fn backoff_ms(base: u64, max: u64, attempts: u32) -> ExponentialBackoffReconnect {
    ExponentialBackoffReconnect::new(
        Duration::from_millis(base),
        Duration::from_millis(max),
        attempts,
    )
}

pub async fn harness(url: &str, reconnect: ExponentialBackoffReconnect) -> Harness {
    harness_with_hooks(url, reconnect, DashboardHooks::default()).await
}

pub async fn harness_with_hooks(
    url: &str,
    reconnect: ExponentialBackoffReconnect,
    hooks: DashboardHooks,
) -> Harness {
    let (transport, server) = MockTransport::channel_pair();
    let invalidations = Arc::new(RecordingInvalidations::default());
    let alerts = Arc::new(RecordingAlerts::default());

    let endpoint = DashboardEndpoint::new(invalidations.clone())
        .with_alerts(alerts.clone())
        .with_hooks(hooks);

    let handle = DashboardHandle::spawn(RealtimeChannelArgs {
        url: url.to_string(),
        transport: transport.clone(),
        reconnect_strategy: reconnect,
        handler: endpoint,
        ws_buffers: WebSocketBufferConfig::default(),
    })
    .await
    .unwrap();

    Harness {
        handle,
        transport,
        server,
        invalidations,
        alerts,
    }
}

/// Wait until the published snapshot is in `state`.
pub async fn wait_for_state(
    handle: &DashboardHandle<MockTransport>,
    state: ChannelState,
) -> ChannelSnapshot<InboundMessage> {
    let mut rx = handle.subscribe();
    match tokio::time::timeout(TIMEOUT, rx.wait_for(|s| s.state == state)).await {
        Ok(Ok(snapshot)) => snapshot.clone(),
        _ => panic!(
            "timed out waiting for {state:?} (last={:?})",
            handle.snapshot().state
        ),
    }
}

/// Poll `cond` until it holds.
pub async fn eventually(what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + TIMEOUT;
    while !cond() {
        if Instant::now() >= deadline {
            panic!("timed out waiting for {what}");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

pub fn frame_json(frame: &WsFrame) -> serde_json::Value {
    serde_json::from_slice(frame_bytes(frame).expect("data frame")).expect("json frame")
}

pub fn is_subscribe(frame: &WsFrame) -> bool {
    frame_json(frame)["type"] == "subscribe"
}
