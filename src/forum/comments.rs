//! Comment extraction from one page of a thread.
//!
//! Comment elements carry their site-local id in the element id attribute
//! (`Comment_<id>`); elements without one are skipped. The author's role
//! label is optional and only used by the filter chain, so it rides
//! alongside the extracted fields instead of being stored.

use chrono::{DateTime, Utc};
use scraper::{Html, Selector};

use super::parse_site_timestamp;

/// One comment lifted out of a comment page, before gating.
#[derive(Debug, Clone)]
pub struct ExtractedComment {
    /// Site-local id, from the element id attribute.
    pub local_id: String,
    pub author: String,
    /// Role label rendered next to the author, if any.
    pub role: Option<String>,
    /// Trimmed message text, not yet truncated.
    pub message: String,
    /// Strict-format timestamp; `None` when missing or malformed.
    pub created_at: Option<DateTime<Utc>>,
}

/// Extract all comments from a comment page.
#[must_use]
pub fn extract_comments(html: &str) -> Vec<ExtractedComment> {
    let document = Html::parse_document(html);
    let item_selector = Selector::parse("li.ItemComment").expect("valid selector");
    let author_selector = Selector::parse("a.Username").expect("valid selector");
    let role_selector = Selector::parse("span.RoleTitle").expect("valid selector");
    let message_selector = Selector::parse("div.Message").expect("valid selector");
    let time_selector = Selector::parse("time").expect("valid selector");

    let mut comments = Vec::new();

    for item in document.select(&item_selector) {
        // Element ids look like "Comment_123456"; the part after the
        // separator is the site-local id.
        let Some(local_id) = item
            .value()
            .id()
            .and_then(|id| id.split('_').nth(1))
            .filter(|id| !id.is_empty())
        else {
            continue;
        };

        let author = item
            .select(&author_selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        let role = item
            .select(&role_selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|r| !r.is_empty());

        let message = item
            .select(&message_selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        let created_at = item
            .select(&time_selector)
            .next()
            .and_then(|el| el.value().attr("datetime"))
            .and_then(parse_site_timestamp);

        comments.push(ExtractedComment {
            local_id: local_id.to_string(),
            author,
            role,
            message,
            created_at,
        });
    }

    comments
}
