use async_trait::async_trait;
use chat_core::Turn;

use crate::error::CompletionError;

/// The capability the session layer consumes: one request/response round
/// trip against a completion model. Implementations never see tree state,
/// only an owned snapshot of the current conversation.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Produce the next message for the given conversation prefix.
    async fn complete(&self, messages: &[Turn]) -> Result<Turn, CompletionError>;
}
