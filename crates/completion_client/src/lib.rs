//! completion_client - reaching the completion model
//!
//! Exposes the `CompletionProvider` seam consumed by the session layer,
//! an OpenAI-compatible HTTP implementation, and the `CompletionFetcher`
//! that turns a conversation snapshot into the next reply or a short
//! title. With no provider configured the fetcher degrades to an offline
//! stub reply so the rest of the system stays exercisable.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod openai;
pub mod provider;

pub use config::Config;
pub use error::CompletionError;
pub use fetcher::CompletionFetcher;
pub use openai::OpenAiProvider;
pub use provider::CompletionProvider;
