//! Token-usage heuristics and completion-id generation.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// Characters-per-token divisor for the usage estimate.
const CHARS_PER_TOKEN: usize = 4;

/// Process-local sequence so ids stay unique within one process even when
/// two completions land in the same millisecond.
static COMPLETION_SEQ: AtomicU64 = AtomicU64::new(0);

/// Estimate a token count for a piece of text.
///
/// The heuristic is `max(1, chars / 4)`: even empty text counts as one
/// token so totals never collapse to zero.
pub fn estimate_tokens(text: &str) -> u32 {
    let estimate = text.chars().count() / CHARS_PER_TOKEN;
    u32::try_from(estimate.max(1)).unwrap_or(u32::MAX)
}

/// Generate a fresh, time-based completion id.
///
/// Unique within one process; no uniqueness guarantee across processes.
pub fn completion_id() -> String {
    let seq = COMPLETION_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("chatcmpl-{}-{seq}", Utc::now().timestamp_millis())
}
