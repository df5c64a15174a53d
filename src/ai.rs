//! AI relevance classification.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Classifies an item's text against a role-specific prompt. A reply of
/// exactly `"FALSE"` (after terminator truncation) is the suppression
/// sentinel; any other reply is usable annotation text.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str, prompt: &str) -> Result<String>;
}

/// Cloudflare Workers AI chat-completion client.
#[derive(Debug, Clone)]
pub struct WorkersAi {
    client: reqwest::Client,
    account_id: String,
    api_token: String,
    model: String,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct RunRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct RunResponse {
    result: RunResult,
}

#[derive(Deserialize)]
struct RunResult {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

impl WorkersAi {
    #[must_use]
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            account_id: config.cf_account_id.clone(),
            api_token: config.cf_api_token.clone(),
            model: config.ai_model.clone(),
        }
    }
}

#[async_trait]
impl Classifier for WorkersAi {
    async fn classify(&self, text: &str, prompt: &str) -> Result<String> {
        let url = format!(
            "https://api.cloudflare.com/client/v4/accounts/{}/ai/run/{}",
            self.account_id, self.model
        );
        let request = RunRequest {
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: prompt,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&request)
            .send()
            .await
            .context("Failed to reach Workers AI")?;

        if !response.status().is_success() {
            anyhow::bail!("Workers AI request failed with status {}", response.status());
        }

        let body: RunResponse = response
            .json()
            .await
            .context("Failed to parse Workers AI response")?;

        let reply = body
            .result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .context("Workers AI response contained no choices")?;

        Ok(reply)
    }
}
