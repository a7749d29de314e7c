//! Benchmarks for the hot path of a collector
//!
//! - Decoding PUB commands out of a read buffer
//! - Encoding deliveries for subscribers
//! - Matching topics against glob-built matchers

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

use logwire_protocol::{BytesMut, Frame, LogRecord, Message, Topic, TopicMatcher};

fn pub_command(line_size: usize) -> Frame {
    Frame::command([
        "PUB".to_string(),
        "1700000000000000000".to_string(),
        "x".repeat(line_size),
    ])
}

/// Decode a buffer holding many pipelined PUB commands
fn bench_parse_pub(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_pub");

    for size in [64, 1024] {
        let mut buf = BytesMut::new();
        let frame = pub_command(size);
        for _ in 0..100 {
            frame.encode(&mut buf);
        }
        let buf = buf.freeze();

        group.throughput(Throughput::Elements(100));
        group.bench_function(format!("{size}_byte_lines"), |b| {
            b.iter(|| {
                let mut offset = 0;
                while let Ok(Some((frame, consumed))) = Frame::parse(&buf[offset..]) {
                    offset += consumed;
                    black_box(frame);
                }
            })
        });
    }

    group.finish();
}

/// Encode deliveries the way a SUB drain task does
fn bench_encode_delivery(c: &mut Criterion) {
    let message = Message::new(
        Topic::unchecked("web", "api", "host-1"),
        LogRecord::new(1_700_000_000_000_000_000, "GET /health 200 1ms"),
    );

    c.bench_function("encode_delivery", |b| {
        b.iter(|| black_box(message.to_frame().to_bytes()))
    });
}

/// Match a topic against matchers of increasing specificity
fn bench_topic_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("topic_match");
    let topic = Topic::unchecked("web", "api", "host-17");

    for (name, matcher) in [
        ("firehose", TopicMatcher::default()),
        ("app_only", TopicMatcher::from_globs("web", "*", "*")),
        ("all_fields", TopicMatcher::from_globs("web", "api", "host-?7")),
    ] {
        group.bench_function(name, |b| b.iter(|| black_box(matcher.matches(&topic))));
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_parse_pub,
    bench_encode_delivery,
    bench_topic_match,
);

criterion_main!(benches);
