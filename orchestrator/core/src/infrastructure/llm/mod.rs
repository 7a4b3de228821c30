// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM Provider Infrastructure
//
// Each adapter translates between the domain LLMProvider interface and one
// vendor API. `create_provider` builds the configured adapter with a shared
// HTTP client carrying the connect and request timeouts.

pub mod ollama;
pub mod openai;

use std::sync::Arc;
use std::time::Duration;

use crate::domain::config::LLMProviderConfig;
use crate::domain::llm::{LLMError, LLMProvider};

pub use ollama::OllamaAdapter;
pub use openai::OpenAIAdapter;

const USER_AGENT: &str = concat!("selfheal/", env!("CARGO_PKG_VERSION"));

pub fn create_provider(config: &LLMProviderConfig) -> Result<Arc<dyn LLMProvider>, LLMError> {
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .timeout(Duration::from_secs(config.request_timeout_seconds))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| LLMError::Provider(format!("Failed to build HTTP client: {}", e)))?;

    let provider: Arc<dyn LLMProvider> = match config.provider_type.as_str() {
        "ollama" => Arc::new(OllamaAdapter::new(
            client,
            config.endpoint.clone(),
            config.model.clone(),
        )),
        "openai" => Arc::new(OpenAIAdapter::new(
            client,
            config.endpoint.clone(),
            config.resolved_api_key(),
            config.model.clone(),
        )),
        other => {
            return Err(LLMError::Provider(format!(
                "Unsupported provider type: {}",
                other
            )))
        }
    };

    tracing::info!(
        provider = provider.name(),
        model = %config.model,
        endpoint = %config.endpoint,
        "Configured LLM provider"
    );
    Ok(provider)
}
