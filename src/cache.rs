//! Cache lifecycle: which remote cached context, if any, backs each data
//! source.
//!
//! The local store holds at most one handle per [`DataSourceIdentity`], under
//! [`DataSourceIdentity::cache_key`]. Replacing a handle always removes the
//! old one first ([`CacheManager::refresh`]), and a handle is only written
//! after the remote service confirms the new cache. A failed or timed-out
//! creation therefore leaves the identity with no handle, never a broken one.
//!
//! Old remote caches are not revoked; they expire on their own TTL.

use crate::error::{RemoteError, Result, StatementChatError};
use crate::llm::api::ContextCacheApi;
use crate::llm::types::CreateCacheRequest;
use crate::source::DataSourceIdentity;
use crate::store::KeyValueStore;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::timeout;

/// Server-issued name of a cached context, e.g. `cachedContents/abc123`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheHandle(String);

impl CacheHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct CacheManager {
    store: Arc<dyn KeyValueStore>,
    api: Arc<dyn ContextCacheApi>,
    model: String,
    request_timeout: Duration,
    upload_locks: std::sync::Mutex<HashMap<DataSourceIdentity, Arc<AsyncMutex<()>>>>,
}

impl CacheManager {
    /// `model` is the resource name used for new caches, e.g.
    /// `models/gemini-1.5-flash-001`.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        api: Arc<dyn ContextCacheApi>,
        model: impl Into<String>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            store,
            api,
            model: model.into(),
            request_timeout,
            upload_locks: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Forgets the local handle for `identity`. Succeeds when none exists.
    pub async fn invalidate(&self, identity: &DataSourceIdentity) -> Result<()> {
        self.store.delete(&identity.cache_key()).await?;
        debug!("Invalidated cache handle for {}", identity);
        Ok(())
    }

    /// Creates a remote cache from a base64 CSV payload and records its
    /// handle for `identity`. Runs under the same per-identity lock as
    /// [`CacheManager::refresh`].
    ///
    /// Prefer `refresh`, which also invalidates the old handle first.
    pub async fn create(
        &self,
        identity: &DataSourceIdentity,
        payload_base64: &str,
        schema_description: &str,
        ttl: Duration,
    ) -> Result<CacheHandle> {
        let lock = self.upload_lock(identity);
        let _guard = lock.lock().await;
        self.create_locked(identity, payload_base64, schema_description, ttl)
            .await
    }

    async fn create_locked(
        &self,
        identity: &DataSourceIdentity,
        payload_base64: &str,
        schema_description: &str,
        ttl: Duration,
    ) -> Result<CacheHandle> {
        if ttl < Duration::from_secs(1) {
            return Err(StatementChatError::Config(format!(
                "cache ttl must be at least one second, got {:?}",
                ttl
            )));
        }

        let request = CreateCacheRequest::csv(
            self.model.clone(),
            payload_base64,
            schema_description,
            format!("{}s", ttl.as_secs()),
        );

        let cached = match timeout(self.request_timeout, self.api.create_cached_content(&request))
            .await
        {
            Err(_) => {
                warn!("Cache creation for {} timed out", identity);
                return Err(StatementChatError::Timeout {
                    operation: "cache creation",
                    after: self.request_timeout,
                });
            }
            Ok(Err(source)) => {
                warn!("Cache creation for {} failed: {}", identity, source);
                return Err(StatementChatError::CacheCreation {
                    identity: identity.to_string(),
                    source,
                });
            }
            Ok(Ok(cached)) => cached,
        };

        if cached.name.trim().is_empty() {
            return Err(StatementChatError::CacheCreation {
                identity: identity.to_string(),
                source: RemoteError::MalformedResponse(
                    "cache response has an empty name".to_string(),
                ),
            });
        }

        self.store.set(&identity.cache_key(), &cached.name).await?;
        info!(
            "Created cache {} for {} (expires {})",
            cached.name,
            identity,
            cached.expire_time.as_deref().unwrap_or("after ttl")
        );
        Ok(CacheHandle::new(cached.name))
    }

    /// The handle currently stored for `identity`.
    pub async fn resolve(&self, identity: &DataSourceIdentity) -> Result<CacheHandle> {
        self.store
            .get(&identity.cache_key())
            .await?
            .map(CacheHandle::new)
            .ok_or_else(|| StatementChatError::NoCache {
                identity: identity.to_string(),
            })
    }

    /// Replaces the cache for `identity`: invalidate, then create, with
    /// concurrent refreshes of the same identity running one at a time.
    pub async fn refresh(
        &self,
        identity: &DataSourceIdentity,
        payload_base64: &str,
        schema_description: &str,
        ttl: Duration,
    ) -> Result<CacheHandle> {
        let lock = self.upload_lock(identity);
        let _guard = lock.lock().await;

        self.invalidate(identity).await?;
        self.create_locked(identity, payload_base64, schema_description, ttl)
            .await
    }

    fn upload_lock(&self, identity: &DataSourceIdentity) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .upload_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks
            .entry(identity.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::{CachedContent, GenerateContentRequest, GenerateContentResponse};
    use crate::store::MemoryStore;
    use async_trait::async_trait;

    struct StaticApi(std::result::Result<&'static str, RemoteError>);

    #[async_trait]
    impl ContextCacheApi for StaticApi {
        async fn create_cached_content(
            &self,
            _request: &CreateCacheRequest,
        ) -> std::result::Result<CachedContent, RemoteError> {
            self.0.clone().map(|name| CachedContent {
                name: name.to_string(),
                model: None,
                expire_time: None,
            })
        }

        async fn generate_content(
            &self,
            _model: &str,
            _request: &GenerateContentRequest,
        ) -> std::result::Result<GenerateContentResponse, RemoteError> {
            Err(RemoteError::Transport("unused".to_string()))
        }
    }

    fn manager(api: StaticApi) -> CacheManager {
        CacheManager::new(
            Arc::new(MemoryStore::new()),
            Arc::new(api),
            "models/gemini-1.5-flash-001",
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_create_then_resolve() {
        let manager = manager(StaticApi(Ok("cachedContents/eco1")));
        let identity = DataSourceIdentity::new("Eco Bank");

        let handle = manager
            .create(&identity, "YQ==", "desc", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(handle.as_str(), "cachedContents/eco1");
        assert_eq!(manager.resolve(&identity).await.unwrap(), handle);
    }

    #[tokio::test]
    async fn test_empty_name_is_a_creation_error() {
        let manager = manager(StaticApi(Ok("  ")));
        let identity = DataSourceIdentity::new("Eco Bank");

        let err = manager
            .create(&identity, "YQ==", "desc", Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, StatementChatError::CacheCreation { .. }));
        assert!(matches!(
            manager.resolve(&identity).await,
            Err(StatementChatError::NoCache { .. })
        ));
    }

    #[tokio::test]
    async fn test_sub_second_ttl_is_rejected_before_any_remote_call() {
        let manager = manager(StaticApi(Ok("cachedContents/eco1")));
        let identity = DataSourceIdentity::new("Eco Bank");

        let err = manager
            .create(&identity, "YQ==", "desc", Duration::from_millis(500))
            .await
            .unwrap_err();
        assert!(matches!(err, StatementChatError::Config(_)));
        assert!(matches!(
            manager.resolve(&identity).await,
            Err(StatementChatError::NoCache { .. })
        ));
    }
}
