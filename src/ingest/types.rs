// src/ingest/types.rs
use anyhow::Result;

/// One item from the polled feed, as the source provided it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub description: String,
    pub link: String,
    /// Raw publish timestamp (RSS `pubDate`), parsed later by the novelty filter.
    pub published: String,
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// Entries in document order.
    async fn fetch_latest(&self) -> Result<Vec<FeedEntry>>;
    fn name(&self) -> &str;
}
