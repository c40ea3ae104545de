//! # Statement Chat
//!
//! Turns a bank or mobile-money statement into a Gemini cached context and
//! answers natural-language questions grounded in it.
//!
//! ## Core Concepts
//!
//! - **Normalization**: parser output (a header-first row table or a list of
//!   keyed transactions) becomes records with one fixed schema per data kind
//! - **Token Budget**: small statements are padded with empty records until
//!   the CSV approaches a target size, because cache creation needs a minimum
//!   payload. Real records are never dropped
//! - **Cache Lifecycle**: one stored cache handle per data source, always
//!   invalidated before it is replaced and only written after the remote
//!   service confirms the new cache
//! - **Grounded Queries**: chat questions reference the stored handle and a
//!   fixed set of interpretation rules for the schema
//!
//! ## Example
//!
//! ```rust,ignore
//! use statement_chat::*;
//! use std::sync::Arc;
//!
//! let store = Arc::new(FileStore::open("handles.json").await?);
//! let api = Arc::new(GeminiClient::from_env()?);
//! let chat = StatementChat::new(PipelineConfig::default(), store, api)?;
//!
//! let source: DataSource = "Eco Bank".parse()?;
//! let raw = RawStatement::from_value(&parser_rows)?;
//! let report = chat.ingestor().ingest(source, &raw).await?;
//! println!("cached {} records as {}", report.real_records, report.handle);
//!
//! let answer = chat.resolver().ask(source, "How much did I spend on airtime?").await?;
//! ```

pub mod advisor;
pub mod budget;
pub mod cache;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod llm;
#[cfg(feature = "remote")]
pub mod parser_client;
pub mod pipeline;
pub mod query;
pub mod schema;
pub mod serializer;
pub mod source;
pub mod store;

pub use advisor::{spending_total, BudgetAdvisor, BudgetLine, SpendingItem};
pub use budget::{estimate_tokens, filler_count, BudgetPlan, TokenBudget};
pub use cache::{CacheHandle, CacheManager};
pub use config::{FillerCosts, PipelineConfig};
pub use error::{RemoteError, Result, StatementChatError};
pub use ingestion::{normalize, normalize_response, RawStatement};
pub use llm::ContextCacheApi;
#[cfg(feature = "remote")]
pub use llm::GeminiClient;
#[cfg(feature = "remote")]
pub use parser_client::StatementParserClient;
pub use pipeline::{IngestReport, PreparedStatement, StatementIngestor};
pub use query::QueryResolver;
pub use schema::{RecordSet, StatementRecord};
pub use serializer::{decode_base64, deserialize, serialize, CsvPayload};
pub use source::{BankProvider, DataSource, DataSourceIdentity, MobileMoneyProvider, SourceKind};
pub use store::{FileStore, KeyValueStore, MemoryStore};

use log::info;
use std::sync::Arc;

/// The ingestion pipeline and query resolver wired to one store and one
/// remote service.
pub struct StatementChat {
    cache: Arc<CacheManager>,
    ingestor: StatementIngestor,
    resolver: QueryResolver,
    advisor: BudgetAdvisor,
}

impl StatementChat {
    pub fn new(
        config: PipelineConfig,
        store: Arc<dyn KeyValueStore>,
        api: Arc<dyn ContextCacheApi>,
    ) -> Result<Self> {
        config.validate()?;

        info!(
            "Initializing statement chat with model {} (target {} tokens, ttl {})",
            config.model,
            config.target_tokens,
            config.ttl_string()
        );

        let cache = Arc::new(CacheManager::new(
            store,
            api.clone(),
            config.model_resource(),
            config.request_timeout,
        ));
        let resolver = QueryResolver::new(
            cache.clone(),
            api.clone(),
            config.model.clone(),
            config.request_timeout,
        );
        let advisor = BudgetAdvisor::new(api, config.model.clone(), config.request_timeout);
        let ingestor = StatementIngestor::new(cache.clone(), config)?;

        Ok(Self {
            cache,
            ingestor,
            resolver,
            advisor,
        })
    }

    #[cfg(feature = "remote")]
    pub fn with_parser(mut self, parser: StatementParserClient) -> Self {
        self.ingestor = self.ingestor.with_parser(parser);
        self
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    pub fn ingestor(&self) -> &StatementIngestor {
        &self.ingestor
    }

    pub fn resolver(&self) -> &QueryResolver {
        &self.resolver
    }

    pub fn advisor(&self) -> &BudgetAdvisor {
        &self.advisor
    }
}
