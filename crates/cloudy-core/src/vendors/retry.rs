//! Which failed vendor calls the orchestrator may repeat, and how long it
//! waits between attempts.

use crate::error::VendorError;
use std::time::Duration;

/// Upper bound on a single wait between attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Whether repeating the same vendor call could plausibly succeed.
///
/// A call is repeated when the vendor was throttling (429) or failing on its
/// side (5xx), when a CloudSight-style poll ran out, or when the request
/// never reached the vendor. Rejected credentials, 4xx responses and image
/// read failures are final.
pub fn is_retryable(error: &VendorError) -> bool {
    match error {
        VendorError::Timeout { .. } => true,
        VendorError::Call {
            status_code: Some(code),
            ..
        } => *code == 429 || (500..=599).contains(code),
        // No response at all: reqwest reports these as connect or timeout failures
        VendorError::Call { message, .. } => {
            message.contains("timed out") || message.contains("connect")
        }
        _ => false,
    }
}

/// Wait before retry number `attempt + 1` of a vendor call: the configured
/// `retry_delay_ms` doubled per attempt, capped at thirty seconds.
pub fn backoff_duration(attempt: u32, base_delay_ms: u64) -> Duration {
    let delay = base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay).min(MAX_BACKOFF)
}
