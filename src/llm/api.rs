use crate::error::RemoteError;
use crate::llm::types::{
    CachedContent, CreateCacheRequest, GenerateContentRequest, GenerateContentResponse,
};
use async_trait::async_trait;

/// The two remote calls the pipeline depends on.
///
/// `GeminiClient` talks to the real service; tests substitute scripted fakes.
#[async_trait]
pub trait ContextCacheApi: Send + Sync {
    async fn create_cached_content(
        &self,
        request: &CreateCacheRequest,
    ) -> Result<CachedContent, RemoteError>;

    /// `model` is the bare model id, e.g. `gemini-1.5-flash-001`.
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, RemoteError>;
}
