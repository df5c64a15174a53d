//! Outgoing notification text formatting.

use crate::db::{NewComment, NewThread, Thread};

/// Maximum characters for comment bodies and AI annotations, in
/// notifications and in the comment store.
pub const MESSAGE_CHAR_LIMIT: usize = 200;

/// Truncate `text` to at most `max_chars` characters, appending `...` when
/// anything was cut off. Operates on characters, not bytes, so multi-byte
/// text is never split mid-character.
#[must_use]
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    let mut chars = text.char_indices();
    match chars.nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}

/// Build the notification text for a newly seen thread.
#[must_use]
pub fn thread_message(thread: &NewThread, annotation: Option<&str>) -> String {
    let mut msg = format!(
        "{} new offer\nTitle: {}\nAuthor: {}\nPosted: {}\n\n",
        thread.domain.to_uppercase(),
        thread.title,
        thread.creator,
        thread.pub_date.format("%Y/%m/%d %H:%M"),
    );
    if let Some(annotation) = annotation {
        msg.push_str(&truncate_with_ellipsis(annotation.trim(), MESSAGE_CHAR_LIMIT));
        msg.push_str("\n\n");
    }
    msg.push_str(&thread.link);
    msg
}

/// Build the notification text for a newly seen comment. The comment body
/// was already truncated at write time.
#[must_use]
pub fn comment_message(thread: &Thread, comment: &NewComment, annotation: Option<&str>) -> String {
    let mut msg = format!(
        "{} new comment\nAuthor: {}\nPosted: {}\n\n{}\n\n",
        thread.domain.to_uppercase(),
        comment.author,
        comment.created_at.format("%Y/%m/%d %H:%M"),
        comment.message,
    );
    if let Some(annotation) = annotation {
        msg.push_str(&truncate_with_ellipsis(annotation.trim(), MESSAGE_CHAR_LIMIT));
        msg.push_str("\n\n");
    }
    msg.push_str(&comment.url);
    msg
}
