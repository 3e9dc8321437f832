//! Benchmarks for answer extraction and statistics aggregation

#![allow(clippy::cast_precision_loss, clippy::unwrap_used)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use reasoning_eval::{extract_answer_simple, AccuracyStatistics, Efficiency, ZeroShotCoTSinglePass};

fn create_reasoning(steps: usize, tagged: bool) -> String {
    let mut text: String = (1..=steps)
        .map(|i| format!("Step {i}: carry the {i} and add it to the running total.\n"))
        .collect();
    if tagged {
        text.push_str("**Final Answer:** 42\n");
    } else {
        text.push_str("So the result is 42");
    }
    text
}

fn benchmark_extract_answer(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_answer_simple");

    for input in [
        "Therefore, the answer is 42.",
        "The answer is: Paris",
        "42\nSome other text",
        "no recognizable prefix here",
    ] {
        group.bench_function(format!("{:.16}", input.replace('\n', " ")), |b| {
            b.iter(|| extract_answer_simple(black_box(input)));
        });
    }

    group.finish();
}

fn benchmark_parse_response(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_pass_parse");

    for steps in &[5, 50, 500] {
        let tagged = create_reasoning(*steps, true);
        let untagged = create_reasoning(*steps, false);

        group.bench_function(format!("tagged_{steps}_steps"), |b| {
            b.iter(|| ZeroShotCoTSinglePass::parse_response(black_box(&tagged)));
        });
        group.bench_function(format!("fallback_{steps}_steps"), |b| {
            b.iter(|| ZeroShotCoTSinglePass::parse_response(black_box(&untagged)));
        });
    }

    group.finish();
}

fn benchmark_aggregators(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregators");

    group.bench_function("accuracy_ci_100_runs", |b| {
        let mut stats = AccuracyStatistics::new();
        for i in 0..100 {
            stats.add_result(f64::from(i % 17).mul_add(2.0, 60.0));
        }
        b.iter(|| black_box(&stats).confidence_interval(0.95));
    });

    group.bench_function("efficiency_100x100", |b| {
        let row: Vec<f64> = (0..100).map(|j| j as f64 * 0.01).collect();
        b.iter(|| {
            let mut efficiency = Efficiency::new(100).unwrap();
            for _ in 0..100 {
                efficiency.record_sample(black_box(&row)).ok();
            }
            efficiency.average_total_time()
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_extract_answer,
    benchmark_parse_response,
    benchmark_aggregators
);
criterion_main!(benches);
