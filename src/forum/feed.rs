//! Feed entry normalization (RSS `item` / Atom `entry` → thread record).
//!
//! `feed_rs` folds both formats into one model, so the candidate-tag
//! fallbacks reduce to field fallbacks here: first link `href` falling back
//! to the entry id (the RSS `guid`), summary falling back to content,
//! author name defaulting to `"Unknown"`, published falling back to updated
//! and finally to the ingestion time.

use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use scraper::Html;
use url::Url;

use crate::db::NewThread;

/// Derive the `(domain, category)` hints from a feed URL: first DNS label
/// as domain; second path segment (falling back to the first) as category.
/// Malformed URLs degrade to empty strings.
#[must_use]
pub fn source_hints(feed_url: &str) -> (String, String) {
    let Ok(parsed) = Url::parse(feed_url) else {
        return (String::new(), String::new());
    };

    let domain = parsed
        .host_str()
        .and_then(|host| host.split('.').next())
        .unwrap_or("")
        .to_string();

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();
    let category = segments
        .get(1)
        .or_else(|| segments.first())
        .copied()
        .unwrap_or("")
        .to_string();

    (domain, category)
}

/// Strip inline HTML down to its text content.
#[must_use]
pub fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment
        .root_element()
        .text()
        .collect::<String>()
        .trim()
        .to_string()
}

/// Convert one feed entry into a thread record. Field extraction is
/// best-effort: missing fields degrade to empty strings or defaults, an
/// unparseable publish date degrades to `now`.
#[must_use]
pub fn normalize_entry(
    entry: &Entry,
    domain: &str,
    category: &str,
    now: DateTime<Utc>,
) -> NewThread {
    let title = entry
        .title
        .as_ref()
        .map(|t| t.content.trim().to_string())
        .unwrap_or_default();

    // Prefer an explicit link; fall back to the entry id, which feed_rs
    // fills from the RSS guid.
    let link = entry
        .links
        .first()
        .map(|l| l.href.trim().to_string())
        .filter(|href| !href.is_empty())
        .unwrap_or_else(|| entry.id.trim().to_string());

    let description = entry
        .summary
        .as_ref()
        .map(|s| s.content.clone())
        .or_else(|| entry.content.as_ref().and_then(|c| c.body.clone()))
        .map(|html| strip_html(&html))
        .unwrap_or_default();

    let creator = entry
        .authors
        .first()
        .map(|a| a.name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    let pub_date = entry.published.or(entry.updated).unwrap_or(now);

    NewThread {
        domain: domain.to_string(),
        category: category.to_string(),
        title,
        link,
        description,
        creator,
        pub_date,
        created_at: now,
    }
}
