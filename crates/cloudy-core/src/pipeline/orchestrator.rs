//! The benchmark loop: every image against every vendor, in a fixed order.
//!
//! For each pair the cache is consulted first; only misses reach the vendor.
//! Live results are timed, stored, then throttled through the
//! [`RateLimiter`]. Every result is normalized, sorted and matched against
//! the image's ground truth before the per-vendor statistics are computed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use super::discovery::{DiscoveredFile, FileDiscovery};
use super::ground_truth::GroundTruth;
use super::output_image::OutputImages;
use super::rate_limit::{FixedDelay, RateLimiter};
use crate::cache::ResultCache;
use crate::config::Config;
use crate::error::{CloudyError, ConfigError, VendorError};
use crate::matching::{MatchOutcome, TagMatcher};
use crate::stats::{Metric, StatsAggregator, VendorSummary};
use crate::types::{ImageRecord, RawVendorResult, RunStats, VendorRecord};
use crate::vendors::{backoff_duration, is_retryable, Credentials, VendorAdapter, VendorRegistry};

/// Everything a report sink needs from one run.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkRun {
    /// When the run finished
    pub generated_at: DateTime<Utc>,

    /// Vendors in the order they were run
    pub vendors: Vec<String>,

    /// Metrics the summaries were computed for
    pub metrics: Vec<Metric>,

    /// Whether tags were matched against ground truth
    pub ground_truth: bool,

    /// Image records sorted by output file name
    pub images: Vec<ImageRecord>,

    /// Per-vendor statistics keyed by vendor name
    pub vendor_stats: BTreeMap<String, VendorSummary>,

    #[serde(skip)]
    pub run_stats: RunStats,
}

/// Drives adapters, cache, matcher and aggregator over the corpus.
pub struct Orchestrator {
    vendors: VendorRegistry,
    credentials: Credentials,
    cache: ResultCache,
    discovery: FileDiscovery,
    input_dir: PathBuf,
    ground_truth: Option<GroundTruth>,
    matcher: TagMatcher,
    metrics: Vec<Metric>,
    rate_limiter: Arc<dyn RateLimiter>,
    output_images: OutputImages,
    retry_attempts: u32,
    retry_delay_ms: u64,
}

impl Orchestrator {
    /// Build from configuration. The cache lives in the output directory,
    /// which is created if missing.
    pub fn new(
        config: &Config,
        vendors: VendorRegistry,
        credentials: Credentials,
    ) -> Result<Self, CloudyError> {
        let output_dir = config.output_dir();
        let cache = ResultCache::new(&output_dir)?;
        Ok(Self {
            vendors,
            credentials,
            cache,
            discovery: FileDiscovery::new(config.input.clone()),
            input_dir: config.input_dir(),
            ground_truth: None,
            matcher: TagMatcher::new(),
            metrics: config.statistics.metrics.clone(),
            rate_limiter: Arc::new(FixedDelay::from_config(&config.pipeline)),
            output_images: OutputImages::new(&config.output, output_dir),
            retry_attempts: config.pipeline.retry_attempts,
            retry_delay_ms: config.pipeline.retry_delay_ms,
        })
    }

    /// Enable matching against ground truth.
    pub fn with_ground_truth(mut self, ground_truth: GroundTruth) -> Self {
        self.ground_truth = Some(ground_truth);
        self
    }

    pub fn with_rate_limiter(mut self, rate_limiter: impl RateLimiter + 'static) -> Self {
        self.rate_limiter = Arc::new(rate_limiter);
        self
    }

    pub fn vendors(&self) -> &VendorRegistry {
        &self.vendors
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Images that a run would process, in directory-listing order.
    pub fn discover(&self) -> Result<Vec<DiscoveredFile>, CloudyError> {
        if !self.input_dir.is_dir() {
            return Err(ConfigError::ValidationError(format!(
                "input directory {} does not exist",
                self.input_dir.display()
            ))
            .into());
        }
        Ok(self.discovery.discover(&self.input_dir))
    }

    /// Discover the corpus and run every pair.
    pub async fn run<F>(&self, on_image: F) -> Result<BenchmarkRun, CloudyError>
    where
        F: FnMut(&ImageRecord),
    {
        let files = self.discover()?;
        self.run_on(&files, on_image).await
    }

    /// Run every vendor over `files`, calling `on_image` as each image completes.
    ///
    /// Vendor call failures are recorded per pair; cache failures abort.
    pub async fn run_on<F>(
        &self,
        files: &[DiscoveredFile],
        mut on_image: F,
    ) -> Result<BenchmarkRun, CloudyError>
    where
        F: FnMut(&ImageRecord),
    {
        let start = Instant::now();
        let mut run_stats = RunStats::default();
        let mut images = Vec::with_capacity(files.len());

        tracing::info!(
            "Benchmarking {} images against {} vendors",
            files.len(),
            self.vendors.len()
        );

        for file in files {
            self.output_images.place(&file.path, &file.file_name);

            let truth = self.ground_truth.as_ref().map(|gt| {
                if !gt.contains(&file.file_name) {
                    tracing::warn!(image = %file.file_name, "no ground-truth tags for image");
                }
                gt.tags_for(&file.file_name)
            });
            let mut vendor_results = Vec::with_capacity(self.vendors.len());
            for adapter in self.vendors.adapters() {
                let record = self
                    .process_pair(file, adapter.as_ref(), truth.as_ref(), &mut run_stats)
                    .await?;
                vendor_results.push(record);
            }

            let record = ImageRecord {
                input_path: file.path.clone(),
                output_filename: file.file_name.clone(),
                ground_truth_tags: truth.unwrap_or_default(),
                vendor_results,
            };
            on_image(&record);
            images.push(record);
            run_stats.images += 1;
        }

        images.sort_by(|a, b| a.output_filename.cmp(&b.output_filename));

        let aggregator = StatsAggregator::new(&self.metrics, self.ground_truth.is_some());
        let vendor_stats = aggregator.summarize(self.vendors.names(), &images);
        run_stats.total_seconds = start.elapsed().as_secs_f64();

        Ok(BenchmarkRun {
            generated_at: Utc::now(),
            vendors: self.vendors.names().map(str::to_string).collect(),
            metrics: aggregator.metrics().to_vec(),
            ground_truth: self.ground_truth.is_some(),
            images,
            vendor_stats,
            run_stats,
        })
    }

    async fn process_pair(
        &self,
        file: &DiscoveredFile,
        adapter: &dyn VendorAdapter,
        truth: Option<&BTreeSet<String>>,
        run_stats: &mut RunStats,
    ) -> Result<VendorRecord, CloudyError> {
        let vendor = adapter.name();
        let image = file.file_name.as_str();
        let cache_file = ResultCache::key(image, vendor);

        let (raw, cached) = match self.cache.lookup(image, vendor)? {
            Some(raw) => {
                tracing::info!(image, vendor, "cached");
                run_stats.cache_hits += 1;
                (raw, true)
            }
            None => {
                tracing::info!(image, vendor, "calling API");
                run_stats.live_calls += 1;
                let (outcome, elapsed) = self.call_with_retry(adapter, &file.path).await;
                let raw = match outcome {
                    Ok(mut raw) => {
                        raw.set_response_time(elapsed);
                        let path = self.cache.store(image, vendor, &raw)?;
                        tracing::info!(image, vendor, "stored result in {}", path.display());
                        raw
                    }
                    Err(e) => {
                        tracing::error!(image, vendor, "vendor call failed: {e}");
                        run_stats.failed_calls += 1;
                        self.rate_limiter.after_call(vendor).await;
                        return Ok(VendorRecord::failed(vendor, cache_file, e.to_string(), elapsed));
                    }
                };
                self.rate_limiter.after_call(vendor).await;
                (raw, false)
            }
        };

        let standardized = adapter.normalize(&raw).sorted();
        let outcome = match truth {
            Some(tags) => self.matcher.find_matches(tags, &standardized),
            None => MatchOutcome::default(),
        };
        tracing::debug!(
            image,
            vendor,
            tags = standardized.len(),
            matches = outcome.tags.len(),
            "normalized"
        );
        Ok(VendorRecord::assemble(vendor, cache_file, cached, raw, standardized, outcome))
    }

    /// Call the vendor, retrying transient failures with exponential backoff.
    ///
    /// Returns the outcome and the latency of the last attempt in seconds.
    async fn call_with_retry(
        &self,
        adapter: &dyn VendorAdapter,
        path: &Path,
    ) -> (Result<RawVendorResult, VendorError>, f64) {
        let mut attempt = 0;
        loop {
            let start = Instant::now();
            let result = adapter.call(path, &self.credentials).await;
            let elapsed = start.elapsed().as_secs_f64();
            match result {
                Err(e) if attempt < self.retry_attempts && is_retryable(&e) => {
                    let delay = backoff_duration(attempt, self.retry_delay_ms);
                    attempt += 1;
                    tracing::warn!(
                        vendor = adapter.name(),
                        "{e}; retry {attempt}/{} after {delay:?}",
                        self.retry_attempts
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return (other, elapsed),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ScoredTag, StandardizedResult};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// A configurable mock vendor.
    ///
    /// Each call to `call()` invokes the response factory with the current
    /// call index, so a test can fail the first attempt and succeed later.
    struct MockAdapter {
        name: &'static str,
        response_fn: Box<dyn Fn(u32) -> Result<RawVendorResult, VendorError> + Send + Sync>,
        call_count: Arc<AtomicU32>,
    }

    impl MockAdapter {
        /// Returns `{"labels": [[label, confidence], ...]}`.
        fn labels(name: &'static str, labels: &[(&str, f64)]) -> Self {
            let body = json!({ "labels": labels.iter().map(|(l, c)| json!([l, c])).collect::<Vec<_>>() });
            Self {
                name,
                response_fn: Box::new(move |_| Ok(RawVendorResult::from_value(body.clone()))),
                call_count: Arc::new(AtomicU32::new(0)),
            }
        }

        fn failing(name: &'static str, status_code: Option<u16>) -> Self {
            Self {
                name,
                response_fn: Box::new(move |_| {
                    Err(VendorError::Call {
                        vendor: name.to_string(),
                        message: "service unavailable".to_string(),
                        status_code,
                    })
                }),
                call_count: Arc::new(AtomicU32::new(0)),
            }
        }

        fn fail_then_succeed(name: &'static str) -> Self {
            Self {
                name,
                response_fn: Box::new(move |idx| {
                    if idx == 0 {
                        Err(VendorError::Call {
                            vendor: name.to_string(),
                            message: "rate limited".to_string(),
                            status_code: Some(429),
                        })
                    } else {
                        Ok(RawVendorResult::from_value(json!({"labels": [["cat", 0.8]]})))
                    }
                }),
                call_count: Arc::new(AtomicU32::new(0)),
            }
        }

        /// Get a shared handle to the call counter (clone before moving the adapter).
        fn call_count_handle(&self) -> Arc<AtomicU32> {
            self.call_count.clone()
        }
    }

    #[async_trait]
    impl VendorAdapter for MockAdapter {
        fn name(&self) -> &str {
            self.name
        }

        async fn call(
            &self,
            _image_path: &Path,
            _credentials: &Credentials,
        ) -> Result<RawVendorResult, VendorError> {
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
            (self.response_fn)(idx)
        }

        fn standardize(&self, raw: &RawVendorResult) -> Result<StandardizedResult, VendorError> {
            let Some(labels) = raw.get("labels") else {
                return Ok(StandardizedResult::empty());
            };
            let labels = labels
                .as_array()
                .ok_or_else(|| VendorError::protocol(self.name, "labels is not an array"))?;
            Ok(labels
                .iter()
                .filter_map(|pair| {
                    let label = pair.get(0)?.as_str()?;
                    Some(match pair.get(1).and_then(|c| c.as_f64()) {
                        Some(c) => ScoredTag::scored(label, c as f32),
                        None => ScoredTag::unscored(label),
                    })
                })
                .collect())
        }
    }

    /// Counts `after_call` invocations per vendor without sleeping.
    #[derive(Clone, Default)]
    struct CountingLimiter {
        calls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl RateLimiter for CountingLimiter {
        async fn after_call(&self, vendor: &str) {
            self.calls.lock().unwrap().push(vendor.to_string());
        }
    }

    struct Fixture {
        _dir: TempDir,
        config: Config,
    }

    fn fixture(images: &[&str]) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input");
        std::fs::create_dir(&input).unwrap();
        for name in images {
            std::fs::write(input.join(name), b"fake image bytes").unwrap();
        }
        let mut config = Config::default();
        config.general.input_dir = input;
        config.general.output_dir = dir.path().join("output");
        config.pipeline.rate_limit_ms = 0;
        config.pipeline.retry_delay_ms = 1;
        Fixture { _dir: dir, config }
    }

    fn registry(adapters: Vec<MockAdapter>) -> VendorRegistry {
        let mut registry = VendorRegistry::new();
        for adapter in adapters {
            registry.register(Arc::new(adapter));
        }
        registry
    }

    fn truth(entries: &[(&str, &[&str])]) -> GroundTruth {
        GroundTruth::from_map(
            entries
                .iter()
                .map(|(name, tags)| (name.to_string(), tags.iter().map(|t| t.to_string()).collect()))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_scenario_animal_matches_animals() {
        let fx = fixture(&["cat.jpg"]);
        let orchestrator = Orchestrator::new(
            &fx.config,
            registry(vec![MockAdapter::labels("vendorA", &[("Pets", 0.4), ("Animals", 0.9)])]),
            Credentials::default(),
        )
        .unwrap()
        .with_ground_truth(truth(&[("cat.jpg", &["animal"])]));

        let run = orchestrator.run(|_| {}).await.unwrap();
        let record = &run.images[0].vendor_results[0];
        assert_eq!(record.standardized_result.tags()[0].label(), "Animals");
        assert_eq!(record.matching_tags, vec![ScoredTag::scored("Animals", 0.9)]);
        assert_eq!(record.matching_tags_count, 1);
        assert!((record.matching_confidence.unwrap() - 0.9).abs() < 1e-6);
        assert_eq!(record.tags_count, 2);
        assert!(!record.cached);
    }

    #[tokio::test]
    async fn test_second_run_is_served_from_cache() {
        let fx = fixture(&["cat.jpg", "dog.jpg"]);
        let adapter = MockAdapter::labels("vendorA", &[("cat", 0.7)]);
        let calls = adapter.call_count_handle();
        let orchestrator = Orchestrator::new(&fx.config, registry(vec![adapter]), Credentials::default())
            .unwrap()
            .with_ground_truth(truth(&[("cat.jpg", &["cat"])]));

        let first = orchestrator.run(|_| {}).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let cache_path = orchestrator.cache().path("cat.jpg", "vendorA");
        let bytes_before = std::fs::read(&cache_path).unwrap();

        let second = orchestrator.run(|_| {}).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(second.run_stats.live_calls, 0);
        assert_eq!(second.run_stats.cache_hits, 2);
        assert_eq!(std::fs::read(&cache_path).unwrap(), bytes_before);

        for (a, b) in first.images.iter().zip(&second.images) {
            let (ra, rb) = (&a.vendor_results[0], &b.vendor_results[0]);
            assert_eq!(ra.standardized_result, rb.standardized_result);
            assert_eq!(ra.matching_tags, rb.matching_tags);
            assert!((ra.response_time - rb.response_time).abs() < 1e-9);
            assert!(rb.cached);
        }

        let third = orchestrator.run(|_| {}).await.unwrap();
        assert_eq!(second.vendor_stats, third.vendor_stats);
    }

    #[tokio::test]
    async fn test_existing_cache_entry_skips_call() {
        let fx = fixture(&["cat.jpg"]);
        let cache = ResultCache::new(fx.config.output_dir()).unwrap();
        cache
            .store(
                "cat.jpg",
                "vendorA",
                &RawVendorResult::from_value(json!({"labels": [["tabby cats", 0.6]], "response_time": 2.5})),
            )
            .unwrap();

        let adapter = MockAdapter::labels("vendorA", &[("dog", 0.9)]);
        let calls = adapter.call_count_handle();
        let limiter = CountingLimiter::default();
        let orchestrator = Orchestrator::new(&fx.config, registry(vec![adapter]), Credentials::default())
            .unwrap()
            .with_ground_truth(truth(&[("cat.jpg", &["cat"])]))
            .with_rate_limiter(limiter.clone());

        let run = orchestrator.run(|_| {}).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(limiter.calls.lock().unwrap().is_empty());
        let record = &run.images[0].vendor_results[0];
        assert!(record.cached);
        assert_eq!(record.response_time, 2.5);
        assert_eq!(record.standardized_result.tags()[0].label(), "tabby cats");
        assert_eq!(record.matching_tags_count, 1);
    }

    #[tokio::test]
    async fn test_failing_vendor_does_not_abort_run() {
        let fx = fixture(&["cat.jpg"]);
        let limiter = CountingLimiter::default();
        let orchestrator = Orchestrator::new(
            &fx.config,
            registry(vec![
                MockAdapter::failing("broken", Some(401)),
                MockAdapter::labels("working", &[("cat", 0.9)]),
            ]),
            Credentials::default(),
        )
        .unwrap()
        .with_rate_limiter(limiter.clone());

        let run = orchestrator.run(|_| {}).await.unwrap();
        let results = &run.images[0].vendor_results;
        assert_eq!(results[0].vendor_name, "broken");
        assert!(results[0].is_failed());
        assert!(results[0].standardized_result.is_empty());
        assert!(!orchestrator.cache().contains("cat.jpg", "broken"));
        assert_eq!(results[1].vendor_name, "working");
        assert!(!results[1].is_failed());

        assert_eq!(run.run_stats.failed_calls, 1);
        assert_eq!(run.vendor_stats["broken"].failed_calls, 1);
        assert_eq!(*limiter.calls.lock().unwrap(), vec!["broken", "working"]);
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let mut fx = fixture(&["cat.jpg"]);
        fx.config.pipeline.retry_attempts = 2;
        let adapter = MockAdapter::fail_then_succeed("flaky");
        let calls = adapter.call_count_handle();
        let orchestrator = Orchestrator::new(&fx.config, registry(vec![adapter]), Credentials::default())
            .unwrap();

        let run = orchestrator.run(|_| {}).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!run.images[0].vendor_results[0].is_failed());
        assert!(orchestrator.cache().contains("cat.jpg", "flaky"));
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let mut fx = fixture(&["cat.jpg"]);
        fx.config.pipeline.retry_attempts = 3;
        let adapter = MockAdapter::failing("denied", Some(403));
        let calls = adapter.call_count_handle();
        let orchestrator = Orchestrator::new(&fx.config, registry(vec![adapter]), Credentials::default())
            .unwrap();

        orchestrator.run(|_| {}).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_label_field_yields_empty_result() {
        let fx = fixture(&["cat.jpg"]);
        let cache = ResultCache::new(fx.config.output_dir()).unwrap();
        cache
            .store("cat.jpg", "vendorA", &RawVendorResult::from_value(json!({"response_time": 1.0})))
            .unwrap();
        let orchestrator = Orchestrator::new(
            &fx.config,
            registry(vec![MockAdapter::labels("vendorA", &[])]),
            Credentials::default(),
        )
        .unwrap()
        .with_ground_truth(truth(&[("cat.jpg", &["cat"])]));

        let run = orchestrator.run(|_| {}).await.unwrap();
        let record = &run.images[0].vendor_results[0];
        assert_eq!(record.tags_count, 0);
        assert!(record.error.is_none());
        assert_eq!(record.matching_confidence, None);
    }

    #[tokio::test]
    async fn test_images_sorted_and_vendors_in_name_order() {
        let fx = fixture(&["zebra.jpg", "apple.png", "mango.gif", "notes.txt"]);
        let orchestrator = Orchestrator::new(
            &fx.config,
            registry(vec![
                MockAdapter::labels("msft", &[]),
                MockAdapter::labels("clarifai", &[]),
            ]),
            Credentials::default(),
        )
        .unwrap();

        let mut seen = 0;
        let run = orchestrator.run(|_| seen += 1).await.unwrap();
        assert_eq!(seen, 3);
        let names: Vec<_> = run.images.iter().map(|i| i.output_filename.as_str()).collect();
        assert_eq!(names, vec!["apple.png", "mango.gif", "zebra.jpg"]);
        let vendors: Vec<_> = run.images[0]
            .vendor_results
            .iter()
            .map(|r| r.vendor_name.as_str())
            .collect();
        assert_eq!(vendors, vec!["clarifai", "msft"]);
        assert_eq!(run.vendors, vec!["clarifai", "msft"]);
    }

    #[tokio::test]
    async fn test_without_ground_truth_skips_matching_metrics() {
        let fx = fixture(&["cat.jpg"]);
        let orchestrator = Orchestrator::new(
            &fx.config,
            registry(vec![MockAdapter::labels("vendorA", &[("cat", 0.9)])]),
            Credentials::default(),
        )
        .unwrap();

        let run = orchestrator.run(|_| {}).await.unwrap();
        assert!(!run.ground_truth);
        assert_eq!(run.metrics, vec![Metric::ResponseTime, Metric::TagsCount]);
        assert_eq!(run.images[0].vendor_results[0].matching_tags_count, 0);
        assert!(run.images[0].ground_truth_tags.is_empty());
    }

    #[tokio::test]
    async fn test_image_missing_from_ground_truth_has_no_matches() {
        let fx = fixture(&["cat.jpg", "dog.jpg"]);
        let orchestrator = Orchestrator::new(
            &fx.config,
            registry(vec![MockAdapter::labels("vendorA", &[("cat", 0.9)])]),
            Credentials::default(),
        )
        .unwrap()
        .with_ground_truth(truth(&[("cat.jpg", &["cat"])]));

        let run = orchestrator.run(|_| {}).await.unwrap();
        assert_eq!(run.images[0].output_filename, "cat.jpg");
        assert_eq!(run.images[0].vendor_results[0].matching_tags_count, 1);
        assert_eq!(run.images[1].output_filename, "dog.jpg");
        assert!(run.images[1].ground_truth_tags.is_empty());
        assert_eq!(run.images[1].vendor_results[0].matching_tags_count, 0);
        assert_eq!(run.images[1].vendor_results[0].matching_confidence, None);
    }

    #[tokio::test]
    async fn test_copies_images_into_output() {
        let fx = fixture(&["cat.jpg"]);
        let orchestrator = Orchestrator::new(
            &fx.config,
            registry(vec![MockAdapter::labels("vendorA", &[])]),
            Credentials::default(),
        )
        .unwrap();
        orchestrator.run(|_| {}).await.unwrap();
        assert!(fx.config.output_dir().join("cat.jpg").is_file());
    }

    #[tokio::test]
    async fn test_missing_input_dir_is_config_error() {
        let mut fx = fixture(&[]);
        fx.config.general.input_dir = PathBuf::from("/nonexistent/corpus");
        let orchestrator = Orchestrator::new(&fx.config, VendorRegistry::new(), Credentials::default())
            .unwrap();
        let err = orchestrator.run(|_| {}).await.unwrap_err();
        assert!(matches!(err, CloudyError::Config(ConfigError::ValidationError(_))));
    }
}
