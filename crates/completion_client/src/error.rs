use thiserror::Error;

/// Errors surfaced by a completion fetch. None are retried automatically;
/// the session layer reports them as transcript text and returns to idle.
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("provider returned no choices")]
    EmptyResponse,

    #[error("failed to encode conversation: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("no completion provider is configured")]
    NotConfigured,

    #[error("conversation too short to summarize")]
    TooFewTurns,
}
