use apidrift::normalize::{normalize, pattern_to_template, template_params};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn sample_paths() -> Vec<&'static str> {
    vec![
        "/orgs",
        "/orgs/${orgId}",
        "/orgs/{orgId}/members/{memberId}",
        "/orgs/:orgId/kb/:kbId",
        "/chats/${chatId}/messages?limit=50",
        "/providers/${providerId}/models/${modelId}",
        "/workspaces/{workspaceId}/projects/{projectId}/kb/{kbId}/documents/{docId}",
    ]
}

/// Benchmark canonicalization across path shapes from all three layers
fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    for path in sample_paths() {
        group.bench_with_input(BenchmarkId::new("canonical", path), path, |b, path| {
            b.iter(|| normalize(black_box(path)));
        });
    }

    group.finish();
}

/// Benchmark a full-tree worth of normalizations in one pass
fn bench_normalize_batch(c: &mut Criterion) {
    let paths: Vec<String> = (0..500)
        .map(|i| format!("/orgs/{{orgId}}/resource{i}/${{itemId}}"))
        .collect();

    c.bench_function("normalize_batch_500", |b| {
        b.iter(|| {
            for path in &paths {
                black_box(normalize(black_box(path)));
            }
        });
    });
}

fn bench_template_params(c: &mut Criterion) {
    c.bench_function("template_params", |b| {
        b.iter(|| template_params(black_box("/orgs/${orgId}/members/${memberId}")));
    });
}

/// Benchmark reverse translation from a dispatch regex to a path template
fn bench_pattern_to_template(c: &mut Criterion) {
    c.bench_function("pattern_to_template", |b| {
        b.iter(|| pattern_to_template(black_box(r"^/orgs/([^/]+)/members/([^/]+)$")));
    });
}

criterion_group!(
    benches,
    bench_normalize,
    bench_normalize_batch,
    bench_template_params,
    bench_pattern_to_template
);
criterion_main!(benches);
