//! The decision stages applied to a newly gated item: recency window,
//! keyword / role / author filters, and the optional AI pass. Stages run in
//! a fixed order and any of them may suppress the notification.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::ai::Classifier;
use crate::config::{CommentFilter, Config};
use crate::constants::AI_REPLY_TERMINATOR;

/// Eligibility threshold for notification, in seconds.
const RECENCY_WINDOW_SECS: i64 = 86_400;

/// Whether a record timestamped `timestamp` is still fresh enough to
/// notify. The 24-hour boundary itself is inclusive.
#[must_use]
pub fn within_recency_window(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    (now - timestamp).num_seconds() <= RECENCY_WINDOW_SECS
}

/// Evaluate the keyword rule against a message.
///
/// The rule is a comma-separated list of OR-groups; each group is a
/// `+`-separated list of AND-terms. A message passes if any group's terms
/// all occur as case-insensitive substrings. An empty or whitespace-only
/// rule never matches.
#[must_use]
pub fn keywords_match(rule: &str, text: &str) -> bool {
    if rule.trim().is_empty() {
        return false;
    }
    let text_lower = text.to_lowercase();
    rule.split(',').any(|group| {
        let terms = group.split('+').map(str::trim).filter(|t| !t.is_empty());
        let mut matched_any = false;
        for term in terms {
            if !text_lower.contains(&term.to_lowercase()) {
                return false;
            }
            matched_any = true;
        }
        matched_any
    })
}

/// Outcome of the filter chain for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Notify, optionally carrying an AI annotation to append to the
    /// outgoing message.
    Notify { annotation: Option<String> },
    Suppress,
}

/// The ordered filter chain. Borrows the configuration and the optional
/// classifier; construct one per evaluation site.
pub struct FilterChain<'a> {
    config: &'a Config,
    classifier: Option<&'a dyn Classifier>,
}

impl<'a> FilterChain<'a> {
    #[must_use]
    pub fn new(config: &'a Config, classifier: Option<&'a dyn Classifier>) -> Self {
        Self { config, classifier }
    }

    /// Decide whether a newly gated thread is notified. Threads bypass the
    /// keyword and role/author stages; only the AI pass applies.
    pub async fn thread_verdict(&self, description: &str) -> Verdict {
        self.ai_verdict(description, &self.config.thread_prompt).await
    }

    /// Decide whether a newly gated comment is notified.
    pub async fn comment_verdict(
        &self,
        author: &str,
        role: Option<&str>,
        message: &str,
        thread_creator: &str,
    ) -> Verdict {
        if self.config.use_keywords_filter
            && !keywords_match(&self.config.keywords_rule, message)
        {
            debug!(author, "comment suppressed by keyword filter");
            return Verdict::Suppress;
        }

        match self.config.comment_filter {
            Some(CommentFilter::ByRole) => {
                let is_plain_member = role
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map_or(true, |r| r.to_lowercase() == "member");
                if is_plain_member {
                    debug!(author, ?role, "comment suppressed by role filter");
                    return Verdict::Suppress;
                }
            }
            Some(CommentFilter::ByAuthor) => {
                if author != thread_creator {
                    debug!(author, thread_creator, "comment suppressed by author filter");
                    return Verdict::Suppress;
                }
            }
            None => {}
        }

        self.ai_verdict(message, &self.config.comment_prompt).await
    }

    /// The AI stage. The classifier's reply is truncated at the terminator
    /// marker; the literal sentinel `FALSE` suppresses, anything else is
    /// carried forward as an annotation. A classifier failure is logged and
    /// the item proceeds on the non-AI path.
    async fn ai_verdict(&self, text: &str, prompt: &str) -> Verdict {
        if !self.config.use_ai_filter {
            return Verdict::Notify { annotation: None };
        }
        let Some(classifier) = self.classifier else {
            return Verdict::Notify { annotation: None };
        };

        match classifier.classify(text, prompt).await {
            Ok(reply) => {
                let reply = reply
                    .split(AI_REPLY_TERMINATOR)
                    .next()
                    .unwrap_or("")
                    .trim()
                    .to_string();
                if reply == "FALSE" {
                    debug!("item suppressed by AI filter");
                    Verdict::Suppress
                } else if reply.is_empty() {
                    Verdict::Notify { annotation: None }
                } else {
                    Verdict::Notify {
                        annotation: Some(reply),
                    }
                }
            }
            Err(e) => {
                warn!("classifier unavailable, skipping AI filter: {e:#}");
                Verdict::Notify { annotation: None }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::Duration;

    #[test]
    fn test_keywords_truth_table() {
        let rule = "foo+bar,baz";
        assert!(keywords_match(rule, "some FOO and BAR here"));
        assert!(keywords_match(rule, "only baz"));
        assert!(!keywords_match(rule, "foo alone"));
        assert!(!keywords_match(rule, "bar alone"));
        assert!(!keywords_match(rule, "nothing relevant"));
    }

    #[test]
    fn test_keywords_empty_rule_fails_closed() {
        assert!(!keywords_match("", "anything"));
        assert!(!keywords_match("   ", "anything"));
    }

    #[test]
    fn test_keywords_whitespace_around_terms() {
        assert!(keywords_match(" foo + bar , baz ", "foo bar"));
        assert!(keywords_match(" foo + bar , baz ", "baz"));
    }

    #[test]
    fn test_recency_boundary() {
        let now = Utc::now();
        assert!(within_recency_window(now, now));
        assert!(within_recency_window(now - Duration::seconds(86_400), now));
        assert!(!within_recency_window(now - Duration::seconds(86_401), now));
    }

    #[test]
    fn test_recency_future_timestamps_pass() {
        let now = Utc::now();
        assert!(within_recency_window(now + Duration::seconds(30), now));
    }

    struct StubClassifier {
        reply: Result<String, String>,
    }

    impl StubClassifier {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
            }
        }
    }

    #[async_trait]
    impl Classifier for StubClassifier {
        async fn classify(&self, _text: &str, _prompt: &str) -> Result<String> {
            match &self.reply {
                Ok(reply) => Ok(reply.clone()),
                Err(message) => Err(anyhow::anyhow!(message.clone())),
            }
        }
    }

    fn ai_config() -> Config {
        Config {
            use_ai_filter: true,
            ..Config::for_testing()
        }
    }

    #[tokio::test]
    async fn test_ai_false_sentinel_suppresses() {
        let config = ai_config();
        let classifier = StubClassifier::replying("FALSE");
        let chain = FilterChain::new(&config, Some(&classifier));
        assert_eq!(chain.thread_verdict("a thread").await, Verdict::Suppress);
    }

    #[tokio::test]
    async fn test_ai_reply_truncated_at_terminator() {
        let config = ai_config();
        let classifier = StubClassifier::replying("relevant offer END ignored tail");
        let chain = FilterChain::new(&config, Some(&classifier));
        assert_eq!(
            chain.thread_verdict("a thread").await,
            Verdict::Notify {
                annotation: Some("relevant offer".to_string())
            }
        );
    }

    #[tokio::test]
    async fn test_ai_failure_falls_back_to_plain_notification() {
        let config = ai_config();
        let classifier = StubClassifier::failing("timeout");
        let chain = FilterChain::new(&config, Some(&classifier));
        assert_eq!(
            chain.thread_verdict("a thread").await,
            Verdict::Notify { annotation: None }
        );
    }

    #[tokio::test]
    async fn test_ai_disabled_skips_classifier() {
        let config = Config::for_testing();
        let chain = FilterChain::new(&config, None);
        assert_eq!(
            chain.thread_verdict("a thread").await,
            Verdict::Notify { annotation: None }
        );
    }

    #[tokio::test]
    async fn test_role_filter() {
        let config = Config {
            comment_filter: Some(CommentFilter::ByRole),
            ..Config::for_testing()
        };
        let chain = FilterChain::new(&config, None);

        // No role label, empty label, or plain member: suppressed.
        assert_eq!(
            chain.comment_verdict("alice", None, "hi", "bob").await,
            Verdict::Suppress
        );
        assert_eq!(
            chain.comment_verdict("alice", Some("  "), "hi", "bob").await,
            Verdict::Suppress
        );
        assert_eq!(
            chain
                .comment_verdict("alice", Some(" Member "), "hi", "bob")
                .await,
            Verdict::Suppress
        );

        // Any other role label passes.
        assert_eq!(
            chain
                .comment_verdict("alice", Some("Provider"), "hi", "bob")
                .await,
            Verdict::Notify { annotation: None }
        );
    }

    #[tokio::test]
    async fn test_author_filter() {
        let config = Config {
            comment_filter: Some(CommentFilter::ByAuthor),
            ..Config::for_testing()
        };
        let chain = FilterChain::new(&config, None);

        assert_eq!(
            chain.comment_verdict("alice", None, "hi", "alice").await,
            Verdict::Notify { annotation: None }
        );
        assert_eq!(
            chain.comment_verdict("alice", None, "hi", "Alice").await,
            Verdict::Suppress
        );
    }

    #[tokio::test]
    async fn test_keyword_filter_runs_before_role_filter() {
        let config = Config {
            use_keywords_filter: true,
            keywords_rule: "vps".to_string(),
            comment_filter: Some(CommentFilter::ByRole),
            ..Config::for_testing()
        };
        let chain = FilterChain::new(&config, None);

        // Keyword miss suppresses even for a privileged role.
        assert_eq!(
            chain
                .comment_verdict("alice", Some("Provider"), "no match", "bob")
                .await,
            Verdict::Suppress
        );
        // Keyword hit still subject to the role stage.
        assert_eq!(
            chain
                .comment_verdict("alice", Some("Provider"), "new vps deal", "bob")
                .await,
            Verdict::Notify { annotation: None }
        );
        assert_eq!(
            chain
                .comment_verdict("alice", None, "new vps deal", "bob")
                .await,
            Verdict::Suppress
        );
    }
}
