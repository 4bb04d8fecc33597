//! Per-vendor summary statistics across all processed images.
//!
//! Each metric is summarized by its arithmetic mean and population standard
//! deviation. A metric with no inputs is reported as [`StatValue::Undefined`]
//! rather than silently collapsing to zero or NaN.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::types::{ImageRecord, VendorRecord};

/// A metric collected from every vendor record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    ResponseTime,
    TagsCount,
    MatchingTagsCount,
    MatchingConfidence,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::ResponseTime,
        Metric::TagsCount,
        Metric::MatchingTagsCount,
        Metric::MatchingConfidence,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::ResponseTime => "response_time",
            Self::TagsCount => "tags_count",
            Self::MatchingTagsCount => "matching_tags_count",
            Self::MatchingConfidence => "matching_confidence",
        }
    }

    /// Whether the metric only makes sense when ground truth is available.
    pub fn needs_ground_truth(self) -> bool {
        matches!(self, Self::MatchingTagsCount | Self::MatchingConfidence)
    }

    /// Value of this metric for one record; `None` excludes the record.
    fn value(self, record: &VendorRecord) -> Option<f64> {
        match self {
            Self::ResponseTime => Some(record.response_time),
            Self::TagsCount => Some(record.tags_count as f64),
            Self::MatchingTagsCount => Some(record.matching_tags_count as f64),
            Self::MatchingConfidence => record.matching_confidence,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A summary value that may be undefined (empty input set).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatValue {
    Defined(f64),
    Undefined,
}

impl StatValue {
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Defined(v) => Some(v),
            Self::Undefined => None,
        }
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defined(v) => write!(f, "{v:.3}"),
            Self::Undefined => f.write_str("undefined"),
        }
    }
}

impl Serialize for StatValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Defined(v) => serializer.serialize_f64(*v),
            Self::Undefined => serializer.serialize_none(),
        }
    }
}

/// Mean and population standard deviation of one metric for one vendor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorStat {
    pub metric_name: String,
    pub mean: StatValue,
    pub stdev: StatValue,

    /// Number of values the summary was computed from
    pub samples: usize,
}

/// All statistics for one vendor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorSummary {
    pub stats: Vec<VendorStat>,

    /// Records whose vendor call failed (excluded from every metric)
    pub failed_calls: usize,
}

impl VendorSummary {
    pub fn stat(&self, metric: Metric) -> Option<&VendorStat> {
        self.stats.iter().find(|s| s.metric_name == metric.name())
    }
}

/// Arithmetic mean and population standard deviation.
pub fn mean_stdev(values: &[f64]) -> (StatValue, StatValue) {
    if values.is_empty() {
        return (StatValue::Undefined, StatValue::Undefined);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (StatValue::Defined(mean), StatValue::Defined(variance.sqrt()))
}

/// Computes per-vendor summaries for a configured set of metrics.
#[derive(Debug, Clone)]
pub struct StatsAggregator {
    metrics: Vec<Metric>,
}

impl StatsAggregator {
    /// Aggregate the given metrics. Matching metrics are dropped when ground
    /// truth is disabled.
    pub fn new(metrics: &[Metric], ground_truth_enabled: bool) -> Self {
        let metrics = metrics
            .iter()
            .copied()
            .filter(|m| ground_truth_enabled || !m.needs_ground_truth())
            .collect();
        Self { metrics }
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// Summarize every vendor in `vendors` across all image records.
    ///
    /// Vendors with no records still get an entry, with undefined values.
    pub fn summarize<'a, I>(&self, vendors: I, images: &[ImageRecord]) -> BTreeMap<String, VendorSummary>
    where
        I: IntoIterator<Item = &'a str>,
    {
        vendors
            .into_iter()
            .map(|vendor| (vendor.to_string(), self.summarize_vendor(vendor, images)))
            .collect()
    }

    fn summarize_vendor(&self, vendor: &str, images: &[ImageRecord]) -> VendorSummary {
        let records: Vec<&VendorRecord> = images
            .iter()
            .flat_map(|image| image.vendor_results.iter())
            .filter(|record| record.vendor_name == vendor)
            .collect();
        let failed_calls = records.iter().filter(|r| r.is_failed()).count();

        let stats = self
            .metrics
            .iter()
            .map(|&metric| {
                let values: Vec<f64> = records
                    .iter()
                    .filter(|r| !r.is_failed())
                    .filter_map(|r| metric.value(r))
                    .collect();
                let (mean, stdev) = mean_stdev(&values);
                VendorStat {
                    metric_name: metric.name().to_string(),
                    mean,
                    stdev,
                    samples: values.len(),
                }
            })
            .collect();

        VendorSummary {
            stats,
            failed_calls,
        }
    }
}
