mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use scalewatch::cache::CacheKey;
use scalewatch::core::ChannelState;
use scalewatch::dashboard::{DashboardHooks, InboundMessage, MessageKind};
use scalewatch::testing::MockSocket;

use common::{Harness, TIMEOUT, backoff_ms, eventually, harness, harness_with_hooks, is_subscribe, wait_for_state};

async fn open(h: &mut Harness) -> MockSocket {
    h.handle.connect().await.unwrap();
    let mut socket = h.server.accept_timeout(TIMEOUT).await.expect("accepted");
    assert!(is_subscribe(&socket.recv_outbound_timeout(TIMEOUT).await.unwrap()));
    wait_for_state(&h.handle, ChannelState::Open).await;
    socket
}

async fn wait_for_messages(h: &Harness, count: u64) {
    let deadline = tokio::time::Instant::now() + TIMEOUT;
    loop {
        let stats = h.handle.stats().await.unwrap();
        if stats.messages >= count {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {count} messages (saw {})",
            stats.messages
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn system_metrics_invalidates_metrics_query() {
    let mut h = harness("ws://dashboard/ws", backoff_ms(10, 40, 5)).await;
    let socket = open(&mut h).await;

    socket
        .send_text(r#"{"type":"system_metrics","data":{"cpu_usage":41.5},"timestamp":"2024-01-01T00:00:00Z"}"#)
        .unwrap();
    wait_for_messages(&h, 1).await;

    assert_eq!(h.invalidations.keys(), vec![CacheKey::SystemMetrics]);
    let last = h.handle.last_message().expect("last message");
    assert_eq!(last.kind, MessageKind::SystemMetrics);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn scaling_execution_invalidates_status_and_metrics() {
    let mut h = harness("ws://dashboard/ws", backoff_ms(10, 40, 5)).await;
    let socket = open(&mut h).await;

    socket
        .send_text(r#"{"type":"scaling_event","event_type":"scaling_execution","data":{"action":"scale_up"}}"#)
        .unwrap();
    wait_for_messages(&h, 1).await;

    assert_eq!(
        h.invalidations.keys(),
        vec![CacheKey::ScalingStatus, CacheKey::SystemMetrics]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn alerts_reach_the_sink_without_touching_the_cache() {
    let mut h = harness("ws://dashboard/ws", backoff_ms(10, 40, 5)).await;
    let socket = open(&mut h).await;

    socket
        .send_text(r#"{"type":"alert","data":{"severity":"high","message":"cpu saturated"}}"#)
        .unwrap();
    wait_for_messages(&h, 1).await;

    let alerts = h.alerts.alerts();
    assert_eq!(alerts.len(), 1);
    let alert: serde_json::Value = serde_json::from_str(&alerts[0]).unwrap();
    assert_eq!(alert["severity"], "high");
    assert!(h.invalidations.keys().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unknown_type_only_updates_last_message() {
    let mut h = harness("ws://dashboard/ws", backoff_ms(10, 40, 5)).await;
    let socket = open(&mut h).await;

    socket.send_text(r#"{"type":"capacity_report","data":{}}"#).unwrap();
    wait_for_messages(&h, 1).await;

    assert!(h.invalidations.keys().is_empty());
    assert!(h.alerts.alerts().is_empty());
    let last = h.handle.last_message().expect("last message");
    assert_eq!(last.kind, MessageKind::Unknown("capacity_report".to_string()));
    assert_eq!(h.handle.state(), ChannelState::Open);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn malformed_frame_is_dropped_and_channel_stays_open() {
    let mut h = harness("ws://dashboard/ws", backoff_ms(10, 40, 5)).await;
    let socket = open(&mut h).await;

    socket.send_text("{not json").unwrap();
    socket.send_text(r#"{"data":{}}"#).unwrap();
    socket
        .send_text(r#"{"type":"health_status","data":{"status":"healthy"}}"#)
        .unwrap();
    wait_for_messages(&h, 3).await;

    let stats = h.handle.stats().await.unwrap();
    assert_eq!(stats.decode_errors, 2);
    assert_eq!(h.handle.state(), ChannelState::Open);
    assert_eq!(h.invalidations.keys(), vec![CacheKey::HealthStatus]);
    assert_eq!(h.transport.connect_count(), 1);

    let last = h.handle.last_message().expect("valid message kept");
    assert_eq!(last.kind, MessageKind::HealthStatus);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn message_hook_sees_every_message_in_order() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let connects = Arc::new(Mutex::new(0u32));

    let hooks = DashboardHooks {
        on_message: Some({
            let seen = seen.clone();
            Arc::new(move |msg: &InboundMessage| seen.lock().unwrap().push(msg.kind.as_str().to_string()))
        }),
        on_connect: Some({
            let connects = connects.clone();
            Arc::new(move || *connects.lock().unwrap() += 1)
        }),
        ..DashboardHooks::default()
    };

    let mut h = harness_with_hooks("ws://dashboard/ws", backoff_ms(10, 40, 5), hooks).await;
    let socket = open(&mut h).await;

    for frame in [
        r#"{"type":"connection_established","client_id":"abc"}"#,
        r#"{"type":"subscription_confirmed","events":["alert"]}"#,
        r#"{"type":"pong"}"#,
        r#"{"type":"scaling_event","event_type":"forecast_update","data":{}}"#,
    ] {
        socket.send_text(frame).unwrap();
    }
    wait_for_messages(&h, 4).await;

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["connection_established", "subscribe_ack", "pong", "scaling_event"]
    );
    assert_eq!(*connects.lock().unwrap(), 1);
    assert_eq!(h.invalidations.keys(), vec![CacheKey::Forecast]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn frames_from_a_retired_connection_are_ignored() {
    let mut h = harness("ws://dashboard/ws", backoff_ms(10, 40, 5)).await;
    let mut first = open(&mut h).await;

    first.drop_socket();
    let mut second = h.server.accept_timeout(TIMEOUT).await.expect("reconnected");
    assert!(is_subscribe(&second.recv_outbound_timeout(TIMEOUT).await.unwrap()));
    wait_for_state(&h.handle, ChannelState::Open).await;

    // The old socket has no inbound side left; only the new one delivers.
    assert!(first.send_text(r#"{"type":"system_metrics"}"#).is_err());
    second
        .send_text(r#"{"type":"scaling_event","event_type":"anomaly_detection"}"#)
        .unwrap();

    let invalidations = h.invalidations.clone();
    eventually("anomaly invalidation", move || {
        invalidations.keys() == vec![CacheKey::AnomalyDetection]
    })
    .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn non_string_metadata_still_dispatches() {
    let mut h = harness("ws://dashboard/ws", backoff_ms(10, 40, 5)).await;
    let socket = open(&mut h).await;

    socket
        .send_text(r#"{"type":"system_metrics","timestamp":1714000000}"#)
        .unwrap();
    socket
        .send_text(r#"{"type":"scaling_event","event_type":"forecast_update","message":{"text":"hi"}}"#)
        .unwrap();
    wait_for_messages(&h, 2).await;

    let stats = h.handle.stats().await.unwrap();
    assert_eq!(stats.decode_errors, 0);
    assert_eq!(
        h.invalidations.keys(),
        vec![CacheKey::SystemMetrics, CacheKey::Forecast]
    );
    let last = h.handle.last_message().expect("last message");
    assert_eq!(last.kind, MessageKind::ScalingEvent);
    assert_eq!(last.message, None);
}
