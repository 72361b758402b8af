/// Dispatch throughput benchmarks
///
/// Measures the full `process` path:
/// - Tag parsing
/// - Payload defaulting
/// - Store lookup/mutation
/// - Response envelope construction
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use neuromesh_engine::{DomainService, FastRandSource, ServiceKind};
use neuromesh_types::{MessageEnvelope, create_message, to_payload};
use serde_json::json;
use std::hint::black_box;
use std::time::Duration;

/// Setup an initialized service
fn setup_service(kind: ServiceKind) -> Box<dyn DomainService> {
    let mut service = kind.instantiate(Box::new(FastRandSource::seeded(7)));
    service.initialize();
    service
}

/// One representative request per service
fn representative_request(kind: ServiceKind) -> MessageEnvelope {
    let (tag, payload) = match kind {
        ServiceKind::Treasury => ("RETRIEVE_MOTOR_MEMORY", json!({"skillName": "reflex"})),
        ServiceKind::Organization => ("OPTIMIZE_ORGANIZATION", json!({})),
        ServiceKind::Development => (
            "ASSESS_QUALITY",
            json!({"scores": {"accuracy": 0.8, "reliability": 0.6}}),
        ),
        ServiceKind::Market => ("ANALYZE_TRENDS", json!({"keywords": ["ai"]})),
        ServiceKind::Sales => ("CREATE_LEAD", json!({"value": 500, "probability": 0.4})),
    };
    create_message(tag, to_payload(payload), "bench", kind.name())
}

fn bench_dispatch_per_service(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_per_service");
    group.measurement_time(Duration::from_secs(5));

    for kind in ServiceKind::ALL {
        let request = representative_request(kind);
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(kind), &request, |b, request| {
            let mut service = setup_service(kind);
            b.iter(|| black_box(service.process(black_box(request))).ok());
        });
    }

    group.finish();
}

fn bench_feedback_batches(c: &mut Criterion) {
    let mut group = c.benchmark_group("treasury_feedback_batch");

    for size in [10usize, 100, 1_000] {
        let records: Vec<_> = (0..size)
            .map(|i| json!({"success": i % 2 == 0, "score": 0.6}))
            .collect();
        let request = create_message(
            "RECORD_FEEDBACK",
            to_payload(json!({"records": records})),
            "bench",
            "treasury",
        );

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &request, |b, request| {
            b.iter_batched(
                || setup_service(ServiceKind::Treasury),
                |mut service| black_box(service.process(request)).ok(),
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_unrecognized(c: &mut Criterion) {
    let request = create_message("NOT_A_MESSAGE", Default::default(), "bench", "sales");
    let mut service = setup_service(ServiceKind::Sales);

    c.bench_function("unrecognized_type", |b| {
        b.iter(|| black_box(service.process(black_box(&request))).ok());
    });
}

criterion_group!(
    benches,
    bench_dispatch_per_service,
    bench_feedback_batches,
    bench_unrecognized
);
criterion_main!(benches);
