use std::sync::Arc;

use bytes::Bytes;
use criterion::{Criterion, black_box, criterion_group, criterion_main};

use scalewatch::cache::{CacheKey, InvalidationSink};
use scalewatch::core::WsEndpointHandler;
use scalewatch::dashboard::{DashboardEndpoint, InboundMessage};

#[derive(Default)]
struct CountingSink;

impl InvalidationSink for CountingSink {
    #[inline]
    fn invalidate(&self, key: CacheKey) {
        black_box(key);
    }
}

fn system_metrics_frame() -> Bytes {
    Bytes::from_static(
        br#"{"type":"system_metrics","data":{"cpu_usage":41.5,"memory_usage":63.2,"load_1m":1.4,"active_instances":3},"timestamp":"2024-05-01T12:00:00Z"}"#,
    )
}

fn scaling_event_frame(history: usize) -> Bytes {
    // A decision event with a scores map and a short history tail, to resemble
    // what the backend broadcasts after a scaling run.
    let mut s = String::with_capacity(256 + history * 96);
    s.push_str(
        "{\"type\":\"scaling_event\",\"event_type\":\"scaling_decision\",\"timestamp\":\"2024-05-01T12:00:00Z\",\"data\":{\"action\":\"scale_up\",\"confidence\":0.87,\"scores\":{\"scale_up\":0.87,\"maintain\":0.1,\"scale_down\":0.03},\"history\":[",
    );
    for i in 0..history {
        if i != 0 {
            s.push(',');
        }
        s.push_str(&format!(
            "{{\"timestamp\":\"2024-05-01T{:02}:00:00Z\",\"action\":\"maintain\",\"target_instances\":{},\"confidence\":0.{:02}}}",
            i % 24,
            2 + i % 4,
            50 + i % 50
        ));
    }
    s.push_str("]}}");
    Bytes::from(s)
}

fn bench_decode_1000_metrics_frames(c: &mut Criterion) {
    let payload = system_metrics_frame();

    c.bench_function("decode_1000_system_metrics_frames", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                let msg = InboundMessage::decode(black_box(payload.as_ref()))
                    .unwrap_or_else(|e| unreachable!("fixture must decode: {e}"));
                black_box(msg.invalidations());
            }
        })
    });
}

fn bench_dispatch_1000_frames(c: &mut Criterion) {
    let mut endpoint = DashboardEndpoint::new(Arc::new(CountingSink));
    let frames = [system_metrics_frame(), scaling_event_frame(8)];

    c.bench_function("parse_and_dispatch_1000_mixed_frames", |b| {
        b.iter(|| {
            for i in 0..1000 {
                let payload = &frames[i & 1];
                let msg = endpoint
                    .parse(black_box(payload.as_ref()))
                    .unwrap_or_else(|e| unreachable!("fixture must decode: {e}"));
                endpoint.handle_message(&msg);
                black_box(msg);
            }
        })
    });
}

fn bench_scaling_event_size(c: &mut Criterion) {
    for history in [1usize, 32, 256] {
        let payload = scaling_event_frame(history);
        c.bench_function(&format!("decode_scaling_event_history_{history}"), |b| {
            b.iter(|| {
                let msg = InboundMessage::decode(black_box(payload.as_ref()))
                    .unwrap_or_else(|e| unreachable!("fixture must decode: {e}"));
                black_box(msg);
            })
        });
    }
}

criterion_group!(
    benches,
    bench_decode_1000_metrics_frames,
    bench_dispatch_1000_frames,
    bench_scaling_event_size
);
criterion_main!(benches);
