// src/ingest/mod.rs
pub mod novelty;
pub mod providers;
pub mod scheduler;
pub mod types;

use crate::ingest::types::FeedSource;
use crate::notify::{compose_status, DeliveryOutcome, StatusPublisher};
use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use std::time::Duration;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_entries_total", "Total entries parsed from the feed.");
        describe_counter!(
            "feed_entries_unparseable_total",
            "Entries skipped because their publish timestamp did not parse."
        );
        describe_counter!(
            "feed_entries_stale_total",
            "Entries older than the novelty window."
        );
        describe_counter!("feed_fetch_errors_total", "Feed fetch/parse errors.");
        describe_counter!(
            "statuses_published_total",
            "Statuses accepted by the destination server."
        );
        describe_counter!(
            "statuses_failed_total",
            "Statuses rejected by the server or lost in transport."
        );
        describe_histogram!("feed_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!(
            "poll_cycle_last_run_ts",
            "Unix ts when the poll cycle last ran."
        );
    });
}

/// Counters for one poll cycle, for logs and tests only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub fetched: usize,
    pub unparseable: usize,
    pub stale: usize,
    pub published: usize,
    pub failed: usize,
}

impl CycleSummary {
    pub fn attempted(&self) -> usize {
        self.published + self.failed
    }
}

/// Run one poll cycle against the wall clock.
pub async fn run_once(
    source: &dyn FeedSource,
    publisher: &dyn StatusPublisher,
    interval: Duration,
) -> CycleSummary {
    run_once_at(source, publisher, interval, Utc::now()).await
}

/// Fetch the feed, keep entries younger than `interval` relative to `now`,
/// and publish each of them once, in feed order.
pub async fn run_once_at(
    source: &dyn FeedSource,
    publisher: &dyn StatusPublisher,
    interval: Duration,
    now: DateTime<Utc>,
) -> CycleSummary {
    ensure_metrics_described();
    gauge!("poll_cycle_last_run_ts").set(now.timestamp() as f64);

    let mut summary = CycleSummary::default();

    tracing::info!(target: "ingest", source = source.name(), "fetching feed");
    let entries = match source.fetch_latest().await {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(target: "ingest", error = ?e, source = source.name(), "feed fetch failed, skipping cycle");
            counter!("feed_fetch_errors_total").increment(1);
            return summary;
        }
    };
    summary.fetched = entries.len();

    for entry in &entries {
        let published = match novelty::parse_published(&entry.published) {
            Ok(ts) => ts,
            Err(e) => {
                tracing::warn!(target: "ingest", error = %e, title = %entry.title, "unparseable publish time, skipping entry");
                summary.unparseable += 1;
                continue;
            }
        };

        if !novelty::is_new(published, interval, now) {
            tracing::debug!(target: "ingest", title = %entry.title, published = %published, "entry outside novelty window");
            summary.stale += 1;
            continue;
        }

        let status = compose_status(entry);
        tracing::debug!(target: "notify", status = ?status, "composed status");

        match publisher.publish(&status).await {
            DeliveryOutcome::Accepted { status: code } => {
                tracing::debug!(target: "notify", code, title = %entry.title, "status published");
                summary.published += 1;
            }
            DeliveryOutcome::Rejected { status: code } => {
                tracing::warn!(target: "notify", code, title = %entry.title, "status rejected by server");
                summary.failed += 1;
            }
            DeliveryOutcome::Transport(err) => {
                tracing::warn!(target: "notify", error = %err, title = %entry.title, "status delivery failed");
                summary.failed += 1;
            }
        }
    }

    counter!("feed_entries_unparseable_total").increment(summary.unparseable as u64);
    counter!("feed_entries_stale_total").increment(summary.stale as u64);
    counter!("statuses_published_total").increment(summary.published as u64);
    counter!("statuses_failed_total").increment(summary.failed as u64);

    tracing::info!(
        target: "ingest",
        fetched = summary.fetched,
        unparseable = summary.unparseable,
        stale = summary.stale,
        attempted = summary.attempted(),
        published = summary.published,
        failed = summary.failed,
        "poll cycle finished"
    );

    summary
}
