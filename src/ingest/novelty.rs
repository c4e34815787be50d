// src/ingest/novelty.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, Utc};
use std::time::Duration;

/// Parse an RFC 2822 timestamp (`Wed, 03 Jul 2024 04:10:44 GMT`).
pub fn parse_published(raw: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc2822(raw.trim())
        .with_context(|| format!("invalid publish timestamp {raw:?}"))
}

/// An entry is new while it is strictly younger than `interval`.
/// Timestamps in the future are always new.
pub fn is_new(published: DateTime<FixedOffset>, interval: Duration, now: DateTime<Utc>) -> bool {
    let window = ChronoDuration::from_std(interval).unwrap_or(ChronoDuration::MAX);
    now.signed_duration_since(published) < window
}
