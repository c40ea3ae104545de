use crate::cache::CacheManager;
use crate::error::{Result, StatementChatError};
use crate::llm::api::ContextCacheApi;
use crate::llm::prompts::query_instruction;
use crate::llm::types::GenerateContentRequest;
use crate::source::DataSource;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Answers chat questions against the cached statement of a data source.
///
/// Read-only with respect to the handle store.
pub struct QueryResolver {
    cache: Arc<CacheManager>,
    api: Arc<dyn ContextCacheApi>,
    model: String,
    request_timeout: Duration,
}

impl QueryResolver {
    pub fn new(
        cache: Arc<CacheManager>,
        api: Arc<dyn ContextCacheApi>,
        model: impl Into<String>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            cache,
            api,
            model: model.into(),
            request_timeout,
        }
    }

    /// Returns the model's answer, which may be empty.
    ///
    /// Fails with `NoCache` when nothing was uploaded for `source`, `Timeout`
    /// when the call exceeds the deadline, and `Query` when the remote call
    /// fails or answers in an unexpected shape.
    pub async fn ask(&self, source: DataSource, query: &str) -> Result<String> {
        let identity = source.identity();
        let handle = self.cache.resolve(&identity).await?;

        let request = GenerateContentRequest::grounded(
            handle.as_str(),
            query_instruction(source.kind()),
            query,
        );

        debug!("Querying {} against {}", identity, handle);
        let response = match timeout(
            self.request_timeout,
            self.api.generate_content(&self.model, &request),
        )
        .await
        {
            Err(_) => {
                warn!("Query against {} timed out", identity);
                return Err(StatementChatError::Timeout {
                    operation: "grounded query",
                    after: self.request_timeout,
                });
            }
            Ok(result) => result,
        };

        response
            .and_then(|body| body.first_text())
            .map(|text| text.trim().to_string())
            .map_err(|source| {
                warn!("Query against {} failed: {}", identity, source);
                StatementChatError::Query {
                    identity: identity.to_string(),
                    source,
                }
            })
    }
}
