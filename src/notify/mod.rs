pub mod mastodon;

use serde::Serialize;

use crate::ingest::types::FeedEntry;

pub const VISIBILITY_PUBLIC: &str = "public";
pub const LANGUAGE_EN: &str = "en";

/// Form body of `POST /api/v1/statuses`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusPayload {
    pub status: String,
    pub visibility: String,
    pub language: String,
}

/// Map a feed entry to a status: title, description, blank line, link.
/// No truncation; the server enforces its own length limit.
pub fn compose_status(entry: &FeedEntry) -> StatusPayload {
    StatusPayload {
        status: format!("{}\n{}\n\n{}", entry.title, entry.description, entry.link),
        visibility: VISIBILITY_PUBLIC.to_string(),
        language: LANGUAGE_EN.to_string(),
    }
}

/// Result of a single delivery attempt. Nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Accepted { status: u16 },
    Rejected { status: u16 },
    Transport(String),
}

#[async_trait::async_trait]
pub trait StatusPublisher: Send + Sync {
    async fn publish(&self, status: &StatusPayload) -> DeliveryOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> FeedEntry {
        FeedEntry {
            title: "This is the title".into(),
            description: "This is the <b>content</b>".into(),
            link: "http://www.example.fi".into(),
            published: String::new(),
        }
    }

    #[test]
    fn status_text_is_title_description_blank_line_link() {
        let p = compose_status(&entry());
        assert_eq!(
            p.status,
            "This is the title\nThis is the <b>content</b>\n\nhttp://www.example.fi"
        );
    }

    #[test]
    fn visibility_and_language_are_fixed() {
        let p = compose_status(&entry());
        assert_eq!(p.visibility, "public");
        assert_eq!(p.language, "en");
    }

    #[test]
    fn composition_is_deterministic() {
        let e = entry();
        assert_eq!(compose_status(&e), compose_status(&e));
    }

    #[test]
    fn empty_entry_still_composes() {
        let p = compose_status(&FeedEntry::default());
        assert_eq!(p.status, "\n\n\n");
    }

    #[test]
    fn surrounding_whitespace_is_passed_through() {
        let e = FeedEntry {
            title: " Title ".into(),
            description: "\n  body\n".into(),
            link: " https://example.test/x ".into(),
            published: String::new(),
        };
        assert_eq!(
            compose_status(&e).status,
            " Title \n\n  body\n\n\n https://example.test/x "
        );
    }

    #[test]
    fn long_text_is_not_truncated() {
        let mut e = entry();
        e.description = "x".repeat(10_000);
        assert!(compose_status(&e).status.len() > 10_000);
    }
}
