use anyhow::{Context, Result};
use sqlx::SqlitePool;

use super::models::{Comment, NewComment, NewThread, Thread};

// ========== Threads ==========

/// Get a thread by its link.
pub async fn get_thread_by_link(pool: &SqlitePool, link: &str) -> Result<Option<Thread>> {
    sqlx::query_as("SELECT * FROM threads WHERE link = ?")
        .bind(link)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch thread by link")
}

/// Insert a thread unless one with the same link already exists.
///
/// Returns `true` when the row was inserted. The conflict clause makes this
/// an atomic insert-if-absent, so it stays correct even with concurrent
/// callers.
pub async fn insert_thread_if_absent(pool: &SqlitePool, thread: &NewThread) -> Result<bool> {
    let result = sqlx::query(
        r"
        INSERT INTO threads (domain, category, title, link, description, creator, pub_date, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(link) DO NOTHING
        ",
    )
    .bind(&thread.domain)
    .bind(&thread.category)
    .bind(&thread.title)
    .bind(&thread.link)
    .bind(&thread.description)
    .bind(&thread.creator)
    .bind(thread.pub_date)
    .bind(thread.created_at)
    .execute(pool)
    .await
    .context("Failed to insert thread")?;

    Ok(result.rows_affected() > 0)
}

/// Update a thread's crawl resume point.
pub async fn update_thread_last_page(pool: &SqlitePool, link: &str, last_page: i64) -> Result<()> {
    sqlx::query("UPDATE threads SET last_page = ? WHERE link = ?")
        .bind(last_page)
        .bind(link)
        .execute(pool)
        .await
        .context("Failed to update thread last_page")?;

    Ok(())
}

// ========== Comments ==========

/// Get a comment by its domain-qualified id.
pub async fn get_comment_by_id(pool: &SqlitePool, comment_id: &str) -> Result<Option<Comment>> {
    sqlx::query_as("SELECT * FROM comments WHERE comment_id = ?")
        .bind(comment_id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch comment by id")
}

/// Get all comments belonging to a thread, oldest first.
pub async fn get_comments_for_thread(pool: &SqlitePool, thread_url: &str) -> Result<Vec<Comment>> {
    sqlx::query_as("SELECT * FROM comments WHERE thread_url = ? ORDER BY created_at ASC, id ASC")
        .bind(thread_url)
        .fetch_all(pool)
        .await
        .context("Failed to fetch comments for thread")
}

/// Insert a comment unless one with the same id already exists.
///
/// Returns `true` when the row was inserted; repeated crawls of the same
/// page hit the conflict clause and report `false`.
pub async fn insert_comment_if_absent(pool: &SqlitePool, comment: &NewComment) -> Result<bool> {
    let result = sqlx::query(
        r"
        INSERT INTO comments (comment_id, thread_url, author, message, created_at, created_at_recorded, url)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(comment_id) DO NOTHING
        ",
    )
    .bind(&comment.comment_id)
    .bind(&comment.thread_url)
    .bind(&comment.author)
    .bind(&comment.message)
    .bind(comment.created_at)
    .bind(comment.created_at_recorded)
    .bind(&comment.url)
    .execute(pool)
    .await
    .context("Failed to insert comment")?;

    Ok(result.rows_affected() > 0)
}
