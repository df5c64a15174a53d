//! Source normalization: feed entries, scraped discussion pages, and
//! comment pages, all reduced to the records in [`crate::db`].

pub mod comments;
pub mod feed;
pub mod page;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// The fixed timestamp format the forum software renders into `datetime`
/// attributes. Anything else is a mismatch, not a parse attempt.
const SITE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S+00:00";

/// Parse a site timestamp in the strict fixed format, interpreted as UTC.
pub(crate) fn parse_site_timestamp(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, SITE_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}
