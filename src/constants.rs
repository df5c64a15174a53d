//! Shared constants used across the application.

/// User agent string used for forum HTTP requests.
///
/// A realistic browser user agent: the monitored forums sit behind
/// bot-challenge layers that reject obvious non-browser clients.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Terminator marker the AI classifier is prompted to end its reply with.
/// Everything after the first occurrence is discarded.
pub const AI_REPLY_TERMINATOR: &str = "END";

/// How many entries of a feed are considered per polling cycle. Feeds are
/// newest-first, so this bounds backfill to the most recent few items.
pub const FEED_ITEM_LIMIT: usize = 6;
