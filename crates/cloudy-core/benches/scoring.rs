//! Benchmarks for tag matching and statistics aggregation.
//!
//! Run with: cargo bench -p cloudy-core

use cloudy_core::{
    ImageRecord, MatchOutcome, Metric, RawVendorResult, ScoredTag, StandardizedResult,
    StatsAggregator, TagMatcher, VendorRecord,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::collections::BTreeSet;
use std::path::PathBuf;

const LABELS: &[&str] = &[
    "Animals", "tabby cats", "Whiskers", "indoor", "Furniture", "sofa", "Mammals", "pets",
    "close-up", "small to medium-sized cats", "Domestic short-haired cat", "carnivores",
];

fn standardized(n: usize) -> StandardizedResult {
    LABELS
        .iter()
        .cycle()
        .take(n)
        .enumerate()
        .map(|(i, label)| ScoredTag::scored(*label, 1.0 - i as f32 / n as f32))
        .collect()
}

fn benchmark_find_matches(c: &mut Criterion) {
    let matcher = TagMatcher::new();
    let truth: BTreeSet<String> = ["cat", "animal", "sofa", "mouse"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let result = standardized(40);

    c.bench_function("find_matches_40_tags", |b| {
        b.iter(|| matcher.find_matches(black_box(&truth), black_box(&result)))
    });
}

fn benchmark_summarize(c: &mut Criterion) {
    let matcher = TagMatcher::new();
    let truth: BTreeSet<String> = ["cat".to_string()].into_iter().collect();
    let vendors = ["clarifai", "google", "msft", "rekognition"];

    let images: Vec<ImageRecord> = (0..250)
        .map(|i| {
            let vendor_results = vendors
                .iter()
                .map(|vendor| {
                    let result = standardized(10 + i % 7).sorted();
                    let outcome: MatchOutcome = matcher.find_matches(&truth, &result);
                    let mut raw = RawVendorResult::default();
                    raw.set_response_time(0.2 + (i % 13) as f64 / 10.0);
                    VendorRecord::assemble(*vendor, format!("{i}.jpg.{vendor}.json"), true, raw, result, outcome)
                })
                .collect();
            ImageRecord {
                input_path: PathBuf::from(format!("input_images/{i}.jpg")),
                output_filename: format!("{i}.jpg"),
                ground_truth_tags: truth.clone(),
                vendor_results,
            }
        })
        .collect();

    let aggregator = StatsAggregator::new(&Metric::ALL, true);
    c.bench_function("summarize_250_images_4_vendors", |b| {
        b.iter(|| aggregator.summarize(vendors, black_box(&images)))
    });
}

criterion_group!(benches, benchmark_find_matches, benchmark_summarize);
criterion_main!(benches);
