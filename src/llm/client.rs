use crate::error::{RemoteError, Result, StatementChatError};
use crate::llm::api::ContextCacheApi;
use crate::llm::types::*;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    /// Reads `GEMINI_API_KEY`, and `GEMINI_BASE_URL` when set.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| StatementChatError::Config("GEMINI_API_KEY must be set".to_string()))?;
        let client = Self::new(api_key);
        Ok(match std::env::var("GEMINI_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => client.with_base_url(url),
            _ => client,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn post_json<B, T>(&self, url: &str, body: &B) -> std::result::Result<T, RemoteError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let res = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.without_url().to_string()))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| RemoteError::Transport(e.without_url().to_string()))?;

        if !status.is_success() {
            let err = rejection(status.as_u16(), &text);
            warn!("Gemini API error: {}", err);
            return Err(err);
        }

        serde_json::from_str(&text).map_err(|e| {
            RemoteError::MalformedResponse(format!("could not parse response body: {}", e))
        })
    }
}

#[async_trait]
impl ContextCacheApi for GeminiClient {
    async fn create_cached_content(
        &self,
        request: &CreateCacheRequest,
    ) -> std::result::Result<CachedContent, RemoteError> {
        let url = format!("{}/cachedContents", self.base_url);
        debug!("Creating cached content for {} (ttl {})", request.model, request.ttl);
        self.post_json(&url, request).await
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> std::result::Result<GenerateContentResponse, RemoteError> {
        let model = model.strip_prefix("models/").unwrap_or(model);
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        self.post_json(&url, request).await
    }
}
