use async_trait::async_trait;
use tracing::error;

use crate::errors::AppError;

/// Path of the system instruction document, relative to the public base URL.
pub const PROMPT_PATH: &str = "/prompt/generate-email.md";

/// Supplies the fixed system instruction sent with every completion.
#[async_trait]
pub trait PromptSource: Send + Sync {
    async fn system_prompt(&self) -> Result<String, AppError>;
}

/// Fetches the instruction document over HTTP on every turn, so edits to the
/// static file apply without a restart.
#[derive(Clone)]
pub struct HttpPromptSource {
    http: reqwest::Client,
    url: String,
}

impl HttpPromptSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: format!("{}{PROMPT_PATH}", base_url.trim_end_matches('/')),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn unavailable(&self, message: impl ToString) -> AppError {
        AppError::PromptUnavailable { url: self.url.clone(), message: message.to_string() }
    }
}

#[async_trait]
impl PromptSource for HttpPromptSource {
    async fn system_prompt(&self) -> Result<String, AppError> {
        let response = self.http.get(&self.url).send().await.map_err(|e| {
            error!("Failed to fetch system prompt from {}: {e}", self.url);
            self.unavailable(e)
        })?;

        let response = response.error_for_status().map_err(|e| {
            error!("System prompt request to {} failed: {e}", self.url);
            self.unavailable(e)
        })?;

        response.text().await.map_err(|e| self.unavailable(e))
    }
}

#[cfg(test)]
pub struct StaticPrompt(pub String);

#[cfg(test)]
#[async_trait]
impl PromptSource for StaticPrompt {
    async fn system_prompt(&self) -> Result<String, AppError> {
        Ok(self.0.clone())
    }
}
