use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::openai::OpenAiProvider;
use crate::provider::CompletionProvider;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_org: Option<String>,
    pub api_base: Option<String>,
    pub model: Option<String>,
}

const CONFIG_FILE_PATH: &str = "config.toml";

impl Config {
    /// Load configuration: `config.toml` in the working directory when
    /// present, then environment variable overrides.
    pub fn new() -> Self {
        let mut config = Config::default();

        if std::path::Path::new(CONFIG_FILE_PATH).exists() {
            if let Ok(content) = std::fs::read_to_string(CONFIG_FILE_PATH) {
                match toml::from_str::<Config>(&content) {
                    Ok(file_config) => config = file_config,
                    Err(err) => log::warn!("ignoring malformed {CONFIG_FILE_PATH}: {err}"),
                }
            }
        }

        // Override with environment variables if they exist
        if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            config.api_key = Some(api_key);
        }
        if let Ok(api_org) = std::env::var("OPENAI_API_ORG") {
            config.api_org = Some(api_org);
        }
        if let Ok(api_base) = std::env::var("OPENAI_API_BASE") {
            config.api_base = Some(api_base);
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            config.model = Some(model);
        }
        config
    }

    /// The model requests are issued against.
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Build the provider this configuration describes, if any. Without
    /// an API key there is no provider and the fetcher falls back to the
    /// offline stub.
    pub fn provider(&self) -> Option<Arc<dyn CompletionProvider>> {
        if self.api_key.is_none() {
            log::info!("no API key configured, completions will use the offline stub");
            return None;
        }
        Some(Arc::new(OpenAiProvider::new(self.clone())))
    }
}
