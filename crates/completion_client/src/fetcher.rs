//! CompletionFetcher - snapshot-in, message-out
//!
//! The single entry point the session layer calls from worker tasks. It
//! owns at most one provider; absent a provider `fetch_next` degrades to
//! a deterministic offline stub so the tree and controller can be
//! exercised without network access or credentials.

use std::sync::Arc;

use chat_core::{Role, Turn};
use log::debug;
use rand::Rng;

use crate::config::Config;
use crate::error::CompletionError;
use crate::provider::CompletionProvider;

/// System prompt used for the one-shot title request.
const TITLE_PROMPT: &str = "Provide a short title, less than 5 words whenever possible, \
summarizing a user-submitted conversation between a user and an AI model, provided in \
JSON form. Avoid using the user's query verbatim in your title. Respond to user queries \
with the title you are providing, without other prefixes or suffixes.";

/// A title is only requested once at least one full user+assistant
/// exchange exists beyond the system turn.
const MIN_TURNS_FOR_TITLE: usize = 3;

pub struct CompletionFetcher {
    provider: Option<Arc<dyn CompletionProvider>>,
}

impl CompletionFetcher {
    pub fn new(provider: Option<Arc<dyn CompletionProvider>>) -> Self {
        Self { provider }
    }

    /// Build a fetcher from configuration (offline stub when no API key
    /// is present).
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.provider())
    }

    pub fn is_offline(&self) -> bool {
        self.provider.is_none()
    }

    /// Fetch the next message for a conversation prefix.
    ///
    /// `truncate_before` keeps only the first N turns of the snapshot,
    /// used to regenerate a reply as if later turns did not exist.
    pub async fn fetch_next(
        &self,
        turns: &[Turn],
        truncate_before: Option<usize>,
    ) -> Result<Turn, CompletionError> {
        let prefix = match truncate_before {
            Some(limit) => &turns[..limit.min(turns.len())],
            None => turns,
        };
        debug!(
            "fetching next message for {} of {} turns",
            prefix.len(),
            turns.len()
        );

        match &self.provider {
            Some(provider) => provider.complete(prefix).await,
            None => Ok(simulated_reply()),
        }
    }

    /// Derive a short conversation title from an early prefix of the
    /// conversation. Callers swallow failures and keep the placeholder
    /// title; the call can simply be repeated later.
    pub async fn fetch_title(&self, turns: &[Turn]) -> Result<String, CompletionError> {
        if turns.len() < MIN_TURNS_FOR_TITLE {
            return Err(CompletionError::TooFewTurns);
        }
        let provider = self
            .provider
            .as_ref()
            .ok_or(CompletionError::NotConfigured)?;

        let request = vec![
            Turn::new(Role::System, TITLE_PROMPT),
            Turn::new(Role::User, serde_json::to_string(turns)?),
        ];
        let reply = provider.complete(&request).await?;
        Ok(reply.content)
    }
}

/// Offline placeholder reply, tagged so repeated calls can be told apart.
fn simulated_reply() -> Turn {
    let tag: u32 = rand::thread_rng().gen();
    Turn::new(
        Role::Assistant,
        format!("As an AI language model, simulated response {tag}"),
    )
}
