//! The polling loop: walks configured sources each cycle, routes newly
//! seen threads and comments through the dedup gate and filter chain, and
//! pushes notifications for what survives.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::ai::Classifier;
use crate::config::Config;
use crate::constants::FEED_ITEM_LIMIT;
use crate::db::{
    get_thread_by_link, insert_comment_if_absent, insert_thread_if_absent,
    update_thread_last_page, Database, NewComment, NewThread, Thread,
};
use crate::filter::{within_recency_window, FilterChain, Verdict};
use crate::forum::comments::{extract_comments, ExtractedComment};
use crate::forum::feed::{normalize_entry, source_hints};
use crate::forum::page::parse_thread_page;
use crate::message::{comment_message, thread_message, truncate_with_ellipsis, MESSAGE_CHAR_LIMIT};
use crate::notify::Notifier;

pub struct Monitor {
    config: Config,
    db: Database,
    client: reqwest::Client,
    notifier: Arc<dyn Notifier>,
    classifier: Option<Arc<dyn Classifier>>,
}

impl Monitor {
    #[must_use]
    pub fn new(
        config: Config,
        db: Database,
        client: reqwest::Client,
        notifier: Arc<dyn Notifier>,
        classifier: Option<Arc<dyn Classifier>>,
    ) -> Self {
        Self {
            config,
            db,
            client,
            notifier,
            classifier,
        }
    }

    /// Run the monitoring loop forever.
    pub async fn run(&self) {
        info!("Starting monitoring loop");
        loop {
            self.run_cycle().await;
            info!(
                sleep_secs = self.config.poll_interval.as_secs(),
                "Cycle complete, sleeping"
            );
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Process every configured source once. Per-source failures are logged
    /// and never abort the cycle.
    pub async fn run_cycle(&self) {
        for url in &self.config.extra_urls {
            info!(%url, "Checking extra URL");
            if let Err(e) = self.check_extra_url(url).await {
                warn!(%url, "Extra URL check failed: {e:#}");
            }
        }

        if !self.config.only_extra {
            for url in &self.config.feed_urls {
                if let Err(e) = self.check_feed(url).await {
                    warn!(%url, "Feed check failed: {e:#}");
                }
            }
        }
    }

    /// Poll one feed: normalize the most recent entries and route each
    /// through the thread gate, crawling comments for forum domains that
    /// have paginated comment pages.
    ///
    /// # Errors
    ///
    /// Returns an error if the feed cannot be fetched or parsed.
    pub async fn check_feed(&self, url: &str) -> Result<()> {
        let (domain, category) = source_hints(url);
        info!(%domain, %category, "Checking feed");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to fetch feed")?;

        if !response.status().is_success() {
            anyhow::bail!("Feed fetch failed with status {}", response.status());
        }

        let body = response.bytes().await.context("Failed to read feed body")?;
        let feed = feed_rs::parser::parse(&body[..]).context("Failed to parse feed")?;

        let crawl_comments = self.config.comment_domains.iter().any(|d| d == &domain);

        for entry in feed.entries.iter().take(FEED_ITEM_LIMIT) {
            let thread = normalize_entry(entry, &domain, &category, Utc::now());
            self.handle_thread(&thread).await?;

            if crawl_comments {
                if let Some(stored) = get_thread_by_link(self.db.pool(), &thread.link).await? {
                    if let Err(e) = self.crawl_comments(&stored).await {
                        warn!(link = %stored.link, "Comment crawl failed: {e:#}");
                    }
                }
            }
        }

        Ok(())
    }

    /// Process one directly configured page URL. A link we already know
    /// only gets its comments re-crawled; an unknown one goes through the
    /// full page-scrape path.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure; fetch and layout problems are
    /// logged and tolerated.
    pub async fn check_extra_url(&self, url: &str) -> Result<()> {
        if let Some(thread) = get_thread_by_link(self.db.pool(), url).await? {
            self.crawl_comments(&thread).await
        } else {
            self.check_thread_page(url).await
        }
    }

    /// Fetch and scrape a single discussion page, then gate the thread and
    /// crawl its comments. Single-page fetches always want comments.
    async fn check_thread_page(&self, url: &str) -> Result<()> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url, "Failed to fetch page: {e:#}");
                return Ok(());
            }
        };
        if !response.status().is_success() {
            warn!(url, status = %response.status(), "Page fetch failed");
            return Ok(());
        }

        let body = response.text().await.context("Failed to read page body")?;
        let Some(thread) = parse_thread_page(&body, url, Utc::now()) else {
            warn!(url, "Page layout did not match, skipping");
            return Ok(());
        };

        self.handle_thread(&thread).await?;

        // The gate has run either way; the stored record carries the crawl
        // resume point.
        if let Some(stored) = get_thread_by_link(self.db.pool(), url).await? {
            self.crawl_comments(&stored).await?;
        }

        Ok(())
    }

    /// The thread gate: insert-if-absent, then recency check and filter
    /// chain, then notification. Returns whether the thread was new.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub async fn handle_thread(&self, thread: &NewThread) -> Result<bool> {
        let inserted = insert_thread_if_absent(self.db.pool(), thread).await?;
        if !inserted {
            return Ok(false);
        }
        debug!(link = %thread.link, "New thread");

        if !within_recency_window(thread.pub_date, Utc::now()) {
            debug!(link = %thread.link, "Thread outside recency window, not notifying");
            return Ok(true);
        }

        match self.filters().thread_verdict(&thread.description).await {
            Verdict::Suppress => {}
            Verdict::Notify { annotation } => {
                let text = thread_message(thread, annotation.as_deref());
                if let Err(e) = self.notifier.send(&text).await {
                    warn!(link = %thread.link, "Failed to send thread notification: {e:#}");
                }
            }
        }

        Ok(true)
    }

    /// Sequentially crawl a thread's comment pages, resuming from the
    /// stored `last_page`. The first failed fetch is the end-of-pages
    /// signal: the resume point is moved back one page and the crawl stops.
    ///
    /// # Errors
    ///
    /// Returns an error on database failure.
    pub async fn crawl_comments(&self, thread: &Thread) -> Result<()> {
        // Re-read the resume point; the caller's record may be stale.
        let mut page = get_thread_by_link(self.db.pool(), &thread.link)
            .await?
            .map_or(1, |t| t.last_page)
            .max(1);

        loop {
            let page_url = format!("{}/p{}", thread.link, page);
            let body = match self.client.get(&page_url).send().await {
                Ok(response) if response.status().is_success() => {
                    response.text().await.ok()
                }
                Ok(response) => {
                    debug!(url = %page_url, status = %response.status(), "Comment page fetch failed");
                    None
                }
                Err(e) => {
                    debug!(url = %page_url, "Comment page fetch failed: {e:#}");
                    None
                }
            };

            let Some(body) = body else {
                // The crawler overshot by one page.
                update_thread_last_page(self.db.pool(), &thread.link, (page - 1).max(0)).await?;
                debug!(link = %thread.link, last_page = page - 1, "Comment crawl ended");
                break;
            };

            for extracted in extract_comments(&body) {
                if let Err(e) = self.handle_comment(thread, extracted).await {
                    warn!(link = %thread.link, "Failed to handle comment: {e:#}");
                }
            }

            page += 1;
            tokio::time::sleep(self.config.page_delay).await;
        }

        Ok(())
    }

    /// The comment gate: build the record, insert-if-absent, then recency
    /// check and filter chain, then notification.
    async fn handle_comment(&self, thread: &Thread, extracted: ExtractedComment) -> Result<()> {
        let now = Utc::now();
        let comment = NewComment {
            comment_id: format!("{}_{}", thread.domain, extracted.local_id),
            thread_url: thread.link.clone(),
            author: extracted.author,
            message: truncate_with_ellipsis(&extracted.message, MESSAGE_CHAR_LIMIT),
            created_at: extracted.created_at.unwrap_or(now),
            created_at_recorded: now,
            url: format!(
                "{}/comment/{}/#Comment_{}",
                thread.link, extracted.local_id, extracted.local_id
            ),
        };

        let inserted = insert_comment_if_absent(self.db.pool(), &comment).await?;
        if !inserted {
            return Ok(());
        }
        debug!(comment_id = %comment.comment_id, "New comment");

        if !within_recency_window(comment.created_at, now) {
            return Ok(());
        }

        let verdict = self
            .filters()
            .comment_verdict(
                &comment.author,
                extracted.role.as_deref(),
                &comment.message,
                &thread.creator,
            )
            .await;

        match verdict {
            Verdict::Suppress => {}
            Verdict::Notify { annotation } => {
                let text = comment_message(thread, &comment, annotation.as_deref());
                if let Err(e) = self.notifier.send(&text).await {
                    warn!(comment_id = %comment.comment_id, "Failed to send comment notification: {e:#}");
                }
            }
        }

        Ok(())
    }

    fn filters(&self) -> FilterChain<'_> {
        FilterChain::new(&self.config, self.classifier.as_deref())
    }
}
