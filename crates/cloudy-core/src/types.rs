//! Core data types for the Cloudy benchmarking pipeline.
//!
//! These types represent what flows between the stages: raw vendor payloads,
//! the common tag schema they normalize into, and the per-image / per-vendor
//! records the report sink consumes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::matching::MatchOutcome;

/// Key injected into every raw result with the measured call latency.
pub const RESPONSE_TIME_KEY: &str = "response_time";

/// A predicted tag with an optional confidence in `[0, 1]`.
///
/// Vendors that only return an ordinal best guess produce `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredTag {
    label: String,
    confidence: Option<f32>,
}

impl ScoredTag {
    /// Create a scored tag. The confidence is clamped into `[0, 1]`;
    /// a non-finite confidence is treated as missing.
    pub fn scored(label: impl Into<String>, confidence: f32) -> Self {
        let confidence = confidence.is_finite().then(|| confidence.clamp(0.0, 1.0));
        Self {
            label: label.into(),
            confidence,
        }
    }

    /// Create a tag without a confidence score.
    pub fn unscored(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            confidence: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn confidence(&self) -> Option<f32> {
        self.confidence
    }

    /// Identity used for set semantics (label plus exact confidence bits).
    pub(crate) fn identity(&self) -> (&str, Option<u32>) {
        (&self.label, self.confidence.map(f32::to_bits))
    }
}

/// Descending by confidence, missing confidence lowest.
fn by_confidence_desc(a: &ScoredTag, b: &ScoredTag) -> Ordering {
    match (a.confidence, b.confidence) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// The common `{tags: [(label, confidence)]}` schema every vendor normalizes into.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StandardizedResult {
    tags: Vec<ScoredTag>,
}

impl StandardizedResult {
    pub fn new(tags: Vec<ScoredTag>) -> Self {
        Self { tags }
    }

    /// An empty result (no tags detected, or the payload had no label field).
    pub fn empty() -> Self {
        Self::default()
    }

    /// A single unscored marker tag, used for status-driven vendors whose
    /// request did not produce a label.
    pub fn error_marker(marker: impl Into<String>) -> Self {
        Self::new(vec![ScoredTag::unscored(marker)])
    }

    pub fn tags(&self) -> &[ScoredTag] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Stable sort by confidence, highest first; unscored tags go last.
    pub fn sort_by_confidence(&mut self) {
        self.tags.sort_by(by_confidence_desc);
    }

    /// Consume and return the sorted result.
    pub fn sorted(mut self) -> Self {
        self.sort_by_confidence();
        self
    }
}

impl FromIterator<ScoredTag> for StandardizedResult {
    fn from_iter<I: IntoIterator<Item = ScoredTag>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A vendor's raw JSON response, opaque to the pipeline except for the
/// injected `response_time`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawVendorResult(Map<String, Value>);

impl RawVendorResult {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Wrap a JSON value. Non-object payloads are stored under `"response"`
    /// so the timing key can always be injected.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            other => {
                let mut map = Map::new();
                map.insert("response".to_string(), other);
                Self(map)
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    pub fn set_response_time(&mut self, seconds: f64) {
        self.0.insert(RESPONSE_TIME_KEY.to_string(), Value::from(seconds));
    }

    pub fn response_time(&self) -> Option<f64> {
        self.0.get(RESPONSE_TIME_KEY).and_then(Value::as_f64)
    }
}

impl From<Map<String, Value>> for RawVendorResult {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Outcome of one (image, vendor) pair.
#[derive(Debug, Clone, Serialize)]
pub struct VendorRecord {
    pub vendor_name: String,

    /// Name of the cache document backing this record
    pub cache_file: String,

    /// Whether the raw result was served from the cache
    pub cached: bool,

    pub raw_result: RawVendorResult,
    pub standardized_result: StandardizedResult,

    /// Wall-clock call latency in seconds
    pub response_time: f64,

    pub tags_count: usize,
    pub matching_tags: Vec<ScoredTag>,
    pub matching_tags_count: usize,
    pub matching_confidence: Option<f64>,

    /// Call failure, if the vendor could not be reached
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VendorRecord {
    /// Assemble a record from a successful (or cached) call.
    ///
    /// `standardized` must already be sorted; `outcome` is the match result
    /// against the image's ground truth (empty when ground truth is disabled).
    pub fn assemble(
        vendor_name: impl Into<String>,
        cache_file: impl Into<String>,
        cached: bool,
        raw_result: RawVendorResult,
        standardized: StandardizedResult,
        outcome: MatchOutcome,
    ) -> Self {
        let vendor_name = vendor_name.into();
        let response_time = raw_result.response_time().unwrap_or_else(|| {
            tracing::warn!(vendor = %vendor_name, "raw result has no response_time, using 0");
            0.0
        });
        Self {
            vendor_name,
            cache_file: cache_file.into(),
            cached,
            response_time,
            tags_count: standardized.len(),
            matching_tags_count: outcome.tags.len(),
            matching_confidence: outcome.confidence,
            matching_tags: outcome.tags,
            standardized_result: standardized,
            raw_result,
            error: None,
        }
    }

    /// Record a failed vendor call: no tags, no matches, error message kept.
    pub fn failed(
        vendor_name: impl Into<String>,
        cache_file: impl Into<String>,
        error: impl Into<String>,
        response_time: f64,
    ) -> Self {
        let error = error.into();
        let mut raw = Map::new();
        raw.insert("error".to_string(), Value::String(error.clone()));
        let mut raw_result = RawVendorResult::new(raw);
        raw_result.set_response_time(response_time);
        Self {
            vendor_name: vendor_name.into(),
            cache_file: cache_file.into(),
            cached: false,
            raw_result,
            standardized_result: StandardizedResult::empty(),
            response_time,
            tags_count: 0,
            matching_tags: Vec::new(),
            matching_tags_count: 0,
            matching_confidence: None,
            error: Some(error),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// All vendor results for one input image.
#[derive(Debug, Clone, Serialize)]
pub struct ImageRecord {
    /// Path of the source image
    pub input_path: PathBuf,

    /// File name used for the output copy and for report ordering
    pub output_filename: String,

    /// Expected tags (empty when ground truth is disabled or missing)
    pub ground_truth_tags: BTreeSet<String>,

    /// One record per vendor, in vendor-name order
    pub vendor_results: Vec<VendorRecord>,
}

/// Counters for a benchmark run.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RunStats {
    /// Images processed
    pub images: usize,

    /// Vendor calls that went to the network
    pub live_calls: usize,

    /// Pairs served from the cache
    pub cache_hits: usize,

    /// Live calls that failed
    pub failed_calls: usize,

    /// Total wall-clock time in seconds
    pub total_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scored_tag_clamps_into_unit_range() {
        assert_eq!(ScoredTag::scored("a", 1.7).confidence(), Some(1.0));
        assert_eq!(ScoredTag::scored("b", -0.2).confidence(), Some(0.0));
        assert_eq!(ScoredTag::scored("c", f32::NAN).confidence(), None);
        assert_eq!(ScoredTag::scored("d", 0.42).confidence(), Some(0.42));
    }

    #[test]
    fn test_sort_descending_with_unscored_last() {
        let result = StandardizedResult::new(vec![
            ScoredTag::unscored("guess"),
            ScoredTag::scored("low", 0.1),
            ScoredTag::scored("high", 0.9),
            ScoredTag::scored("mid", 0.5),
        ])
        .sorted();
        let labels: Vec<&str> = result.tags().iter().map(ScoredTag::label).collect();
        assert_eq!(labels, vec!["high", "mid", "low", "guess"]);
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        let result = StandardizedResult::new(vec![
            ScoredTag::scored("first", 0.5),
            ScoredTag::unscored("u1"),
            ScoredTag::scored("second", 0.5),
            ScoredTag::unscored("u2"),
        ])
        .sorted();
        let labels: Vec<&str> = result.tags().iter().map(ScoredTag::label).collect();
        assert_eq!(labels, vec!["first", "second", "u1", "u2"]);
    }

    #[test]
    fn test_raw_result_response_time() {
        let mut raw = RawVendorResult::from_value(json!({"tags": []}));
        assert_eq!(raw.response_time(), None);
        raw.set_response_time(1.25);
        assert_eq!(raw.response_time(), Some(1.25));
    }

    #[test]
    fn test_raw_result_wraps_non_objects() {
        let raw = RawVendorResult::from_value(json!([1, 2, 3]));
        assert_eq!(raw.get("response"), Some(&json!([1, 2, 3])));
    }

    #[test]
    fn test_failed_record_has_no_tags() {
        let record = VendorRecord::failed("msft", "cat.jpg.msft.json", "HTTP 500", 0.3);
        assert!(record.is_failed());
        assert_eq!(record.tags_count, 0);
        assert_eq!(record.matching_confidence, None);
        assert_eq!(record.raw_result.response_time(), Some(0.3));

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"error\":\"HTTP 500\""));
    }

    #[test]
    fn test_successful_record_omits_error() {
        let mut raw = RawVendorResult::default();
        raw.set_response_time(0.5);
        let record = VendorRecord::assemble(
            "google",
            "cat.jpg.google.json",
            true,
            raw,
            StandardizedResult::new(vec![ScoredTag::scored("cat", 0.8)]),
            MatchOutcome::default(),
        );
        assert_eq!(record.response_time, 0.5);
        assert_eq!(record.tags_count, 1);
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("\"error\""));
    }
}
