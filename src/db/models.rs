use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A top-level discussion/offer post, uniquely identified by its URL.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Thread {
    pub id: i64,
    /// Source site identifier (first DNS label for feed sources, full host
    /// for directly scraped pages).
    pub domain: String,
    /// Source-supplied classification, may be empty.
    pub category: String,
    pub title: String,
    pub link: String,
    pub description: String,
    pub creator: String,
    pub pub_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Highest comment page observed so far. Only mutated by the crawler.
    pub last_page: i64,
}

/// A reply within a thread's comment pages.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    /// `domain + "_" + site-local id`, the natural unique key.
    pub comment_id: String,
    /// Back-reference to the owning thread's link (lookup only).
    pub thread_url: String,
    pub author: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub created_at_recorded: DateTime<Utc>,
    /// Deep link to the comment.
    pub url: String,
}

/// Data for inserting a new thread. `last_page` starts at 1 via the schema
/// default.
#[derive(Debug, Clone)]
pub struct NewThread {
    pub domain: String,
    pub category: String,
    pub title: String,
    pub link: String,
    pub description: String,
    pub creator: String,
    pub pub_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Data for inserting a new comment.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub comment_id: String,
    pub thread_url: String,
    pub author: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub created_at_recorded: DateTime<Utc>,
    pub url: String,
}
