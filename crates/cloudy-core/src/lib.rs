//! Cloudy Core - Embeddable image-tagging vendor benchmark.
//!
//! Cloudy runs a corpus of images through several third-party tagging
//! services, caches every raw response, normalizes the responses into one
//! tag schema, matches the tags against ground truth and summarizes
//! per-vendor accuracy and latency.
//!
//! # Architecture
//!
//! ```text
//! image × vendor → ResultCache ─hit──────────────┐
//!                      └─miss→ VendorAdapter.call ┴→ normalize → TagMatcher → StatsAggregator → ReportSink
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use cloudy_core::{AdapterSettings, Config, Credentials, Orchestrator, VendorRegistry};
//!
//! #[tokio::main]
//! async fn main() -> cloudy_core::Result<()> {
//!     let config = Config::load()?;
//!     let credentials = Credentials::load(&config.keys_path(), &config.regions_path())?;
//!     let vendors = VendorRegistry::builtin(&AdapterSettings::from_config(&config));
//!
//!     let run = Orchestrator::new(&config, vendors, credentials)?
//!         .run(|image| println!("{}", image.output_filename))
//!         .await?;
//!     println!("{:#?}", run.vendor_stats);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod cache;
pub mod config;
pub mod error;
pub mod matching;
pub mod output;
pub mod pipeline;
pub mod stats;
pub mod types;
pub mod vendors;

// Re-exports for convenient access
pub use cache::ResultCache;
pub use config::Config;
pub use error::{CacheError, CloudyError, ConfigError, Result, VendorError};
pub use matching::{MatchOutcome, TagMatcher};
pub use output::{CsvExport, JsonReport, OutputFormat, OutputWriter, ReportSink};
pub use pipeline::{BenchmarkRun, FixedDelay, GroundTruth, Orchestrator, RateLimiter};
pub use stats::{Metric, StatValue, StatsAggregator, VendorStat, VendorSummary};
pub use types::{ImageRecord, RawVendorResult, RunStats, ScoredTag, StandardizedResult, VendorRecord};
pub use vendors::{AdapterSettings, Credentials, VendorAdapter, VendorRegistry};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
