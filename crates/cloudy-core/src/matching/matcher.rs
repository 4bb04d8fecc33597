//! Lemma-based fuzzy matching of predicted tags against ground truth.

use super::lemmatize::Lemmatizer;
use crate::types::{ScoredTag, StandardizedResult};
use serde::Serialize;
use std::collections::HashSet;

/// Matches found for one (image, vendor) pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchOutcome {
    /// Deduplicated matching tags, in standardized-result order
    pub tags: Vec<ScoredTag>,

    /// Mean confidence of the matches; `None` when there are no matches or
    /// any match is unscored
    pub confidence: Option<f64>,
}

impl MatchOutcome {
    fn from_tags(tags: Vec<ScoredTag>) -> Self {
        let confidence = if tags.is_empty() {
            None
        } else {
            tags.iter()
                .map(|t| t.confidence().map(f64::from))
                .sum::<Option<f64>>()
                .map(|sum| sum / tags.len() as f64)
        };
        Self { tags, confidence }
    }
}

/// Compares ground-truth tags with a vendor's standardized tags.
///
/// A predicted label matches a ground-truth tag when any whitespace token of
/// the lowercased, lemmatized label equals the lowercased, lemmatized
/// ground-truth tag. Ground-truth tags are never tokenized.
#[derive(Debug, Clone, Default)]
pub struct TagMatcher {
    lemmatizer: Lemmatizer,
}

impl TagMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lowercase and lemmatize a ground-truth tag as one unit.
    pub fn normalize_truth(&self, tag: &str) -> String {
        self.lemmatizer.lemmatize(&tag.to_lowercase())
    }

    /// Lowercase, lemmatize and tokenize a predicted label.
    pub fn label_tokens(&self, label: &str) -> Vec<String> {
        self.lemmatizer
            .lemmatize(&label.to_lowercase())
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    /// Find every predicted tag that matches at least one ground-truth tag.
    pub fn find_matches<'a, I>(&self, ground_truth: I, result: &StandardizedResult) -> MatchOutcome
    where
        I: IntoIterator<Item = &'a String>,
    {
        let truths: HashSet<String> = ground_truth
            .into_iter()
            .map(|t| self.normalize_truth(t))
            .collect();
        if truths.is_empty() || result.is_empty() {
            return MatchOutcome::default();
        }

        let mut seen = HashSet::new();
        let mut matches = Vec::new();
        for tag in result.tags() {
            let hit = self
                .label_tokens(tag.label())
                .iter()
                .any(|token| truths.contains(token));
            if hit && seen.insert(tag.identity()) {
                matches.push(tag.clone());
            }
        }

        MatchOutcome::from_tags(matches)
    }
}
