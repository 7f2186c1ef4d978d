//! OpenAI-compatible chat completion provider

use async_trait::async_trait;
use chat_core::Turn;
use log::{debug, error, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::CompletionError;
use crate::provider::CompletionProvider;

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

#[derive(Serialize, Debug)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: Turn,
}

/// One round trip against an OpenAI-style `/chat/completions` endpoint.
/// Failures are not retried; the caller decides what to surface.
pub struct OpenAiProvider {
    client: Client,
    config: Config,
}

impl OpenAiProvider {
    pub fn new(config: Config) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn completions_url(&self) -> String {
        let base = self
            .config
            .api_base
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/');
        format!("{base}/chat/completions")
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, messages: &[Turn]) -> Result<Turn, CompletionError> {
        let api_key = self.config.api_key.as_deref().unwrap_or_default();
        let request = ChatCompletionRequest {
            model: self.config.model(),
            messages,
        };

        debug!(
            "sending completion request: model={} messages={}",
            request.model,
            messages.len()
        );

        let mut builder = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key)
            .json(&request);
        if let Some(org) = self.config.api_org.as_deref() {
            builder = builder.header("OpenAI-Organization", org);
        }

        let response = builder.send().await.map_err(|e| {
            error!("completion request failed: {e}");
            CompletionError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("provider returned {status}: {body}");
            return Err(CompletionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or(CompletionError::EmptyResponse)?;

        info!("completion received ({} chars)", choice.message.content.len());
        Ok(choice.message)
    }
}
