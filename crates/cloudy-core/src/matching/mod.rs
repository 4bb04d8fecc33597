//! Ground-truth matching.
//!
//! - **lemmatize**: rule-based noun lemmatizer used to normalize tag text
//! - **matcher**: token-level comparison of predicted tags with ground truth

pub mod lemmatize;
pub mod matcher;

pub use lemmatize::Lemmatizer;
pub use matcher::{MatchOutcome, TagMatcher};
