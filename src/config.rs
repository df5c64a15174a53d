use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
}

/// Which comment filter stage is active, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentFilter {
    /// Only notify comments whose author carries a non-member role label.
    ByRole,
    /// Only notify follow-up comments written by the thread creator.
    ByAuthor,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Sources
    pub feed_urls: Vec<String>,
    pub extra_urls: Vec<String>,
    pub only_extra: bool,
    /// Domains whose threads get their comment pages crawled.
    pub comment_domains: Vec<String>,

    // Polling
    pub poll_interval: Duration,
    pub page_delay: Duration,
    pub request_timeout: Duration,

    // Database
    pub database_path: PathBuf,

    // Filters
    pub use_keywords_filter: bool,
    pub keywords_rule: String,
    pub comment_filter: Option<CommentFilter>,

    // AI classifier (Cloudflare Workers AI)
    pub use_ai_filter: bool,
    pub ai_model: String,
    pub cf_account_id: String,
    pub cf_api_token: String,
    pub thread_prompt: String,
    pub comment_prompt: String,

    // Telegram notifier
    pub telegram_bot_token: String,
    pub telegram_chat_id: String,
}

const DEFAULT_FEED_URLS: &str = "https://lowendspirit.com/categories/offers/feed.rss,https://lowendtalk.com/categories/offers/feed.rss";
const DEFAULT_COMMENT_DOMAINS: &str = "lowendtalk,lowendspirit";

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Sources
            feed_urls: parse_env_list("FEED_URLS", DEFAULT_FEED_URLS),
            extra_urls: parse_env_list("EXTRA_URLS", ""),
            only_extra: parse_env_bool("ONLY_EXTRA", false)?,
            comment_domains: parse_env_list("COMMENT_DOMAINS", DEFAULT_COMMENT_DOMAINS),

            // Polling
            poll_interval: Duration::from_secs(parse_env_u64("POLL_INTERVAL_SECS", 600)?),
            page_delay: Duration::from_secs(parse_env_u64("PAGE_DELAY_SECS", 1)?),
            request_timeout: Duration::from_secs(parse_env_u64("REQUEST_TIMEOUT_SECS", 30)?),

            // Database
            database_path: PathBuf::from(env_or_default("DATABASE_PATH", "./data/monitor.sqlite")),

            // Filters
            use_keywords_filter: parse_env_bool("USE_KEYWORDS_FILTER", false)?,
            keywords_rule: env_or_default("KEYWORDS_RULE", ""),
            comment_filter: parse_comment_filter(&env_or_default("COMMENT_FILTER", ""))?,

            // AI classifier
            use_ai_filter: parse_env_bool("USE_AI_FILTER", false)?,
            ai_model: env_or_default("AI_MODEL", "@cf/qwen/qwen1.5-14b-chat-awq"),
            cf_account_id: env_or_default("CF_ACCOUNT_ID", ""),
            cf_api_token: env_or_default("CF_API_TOKEN", ""),
            thread_prompt: env_or_default("THREAD_PROMPT", ""),
            comment_prompt: env_or_default("COMMENT_PROMPT", ""),

            // Telegram notifier
            telegram_bot_token: required_env("TELEGRAM_BOT_TOKEN")?,
            telegram_chat_id: required_env("TELEGRAM_CHAT_ID")?,
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed_urls.is_empty() && !self.only_extra {
            return Err(ConfigError::InvalidValue {
                name: "FEED_URLS".to_string(),
                message: "cannot be empty unless ONLY_EXTRA is set".to_string(),
            });
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "POLL_INTERVAL_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.use_ai_filter {
            for (name, value) in [
                ("CF_ACCOUNT_ID", &self.cf_account_id),
                ("CF_API_TOKEN", &self.cf_api_token),
                ("AI_MODEL", &self.ai_model),
            ] {
                if value.is_empty() {
                    return Err(ConfigError::InvalidValue {
                        name: name.to_string(),
                        message: "required when USE_AI_FILTER is set".to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// A minimal configuration for tests: no sources, no filters, no delays.
    /// Tests override the fields they exercise.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            feed_urls: Vec::new(),
            extra_urls: Vec::new(),
            only_extra: false,
            comment_domains: Vec::new(),
            poll_interval: Duration::from_secs(600),
            page_delay: Duration::from_millis(0),
            request_timeout: Duration::from_secs(10),
            database_path: PathBuf::from("./test.sqlite"),
            use_keywords_filter: false,
            keywords_rule: String::new(),
            comment_filter: None,
            use_ai_filter: false,
            ai_model: String::new(),
            cf_account_id: String::new(),
            cf_api_token: String::new(),
            thread_prompt: String::new(),
            comment_prompt: String::new(),
            telegram_bot_token: String::new(),
            telegram_chat_id: String::new(),
        }
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Parse a comma-separated environment variable into a list, dropping empty
/// entries.
fn parse_env_list(name: &str, default: &str) -> Vec<String> {
    env_or_default(name, default)
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::ParseBool {
                name: name.to_string(),
                value: val,
            }),
        },
        _ => Ok(default),
    }
}

fn parse_comment_filter(value: &str) -> Result<Option<CommentFilter>, ConfigError> {
    match value.to_lowercase().as_str() {
        "" => Ok(None),
        "by_role" => Ok(Some(CommentFilter::ByRole)),
        "by_author" => Ok(Some(CommentFilter::ByAuthor)),
        _ => Err(ConfigError::InvalidValue {
            name: "COMMENT_FILTER".to_string(),
            message: format!("must be 'by_role' or 'by_author', got '{value}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_comment_filter() {
        assert_eq!(parse_comment_filter("").unwrap(), None);
        assert_eq!(
            parse_comment_filter("by_role").unwrap(),
            Some(CommentFilter::ByRole)
        );
        assert_eq!(
            parse_comment_filter("BY_AUTHOR").unwrap(),
            Some(CommentFilter::ByAuthor)
        );
        assert!(parse_comment_filter("by_karma").is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_env_bool("NONEXISTENT_VAR", true).unwrap());
        assert!(!parse_env_bool("NONEXISTENT_VAR", false).unwrap());
    }

    #[test]
    fn test_parse_env_list_default() {
        let domains = parse_env_list("NONEXISTENT_VAR", "lowendtalk, lowendspirit,");
        assert_eq!(domains, vec!["lowendtalk", "lowendspirit"]);
    }

    #[test]
    fn test_validate_requires_feeds_unless_only_extra() {
        let config = Config::for_testing();
        assert!(config.validate().is_err());

        let config = Config {
            only_extra: true,
            ..Config::for_testing()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_ai_credentials() {
        let config = Config {
            only_extra: true,
            use_ai_filter: true,
            ..Config::for_testing()
        };
        assert!(config.validate().is_err());
    }
}
