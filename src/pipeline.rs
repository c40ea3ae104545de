use crate::budget::TokenBudget;
use crate::cache::{CacheHandle, CacheManager};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::ingestion::{normalize, RawStatement};
use crate::llm::prompts::schema_description;
use crate::schema::RecordSet;
use crate::serializer::{serialize, CsvPayload};
use crate::source::{DataSource, DataSourceIdentity};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

#[cfg(feature = "remote")]
use crate::parser_client::StatementParserClient;

/// A statement normalized, padded to the token budget and rendered as CSV.
#[derive(Debug, Clone)]
pub struct PreparedStatement {
    pub records: RecordSet,
    pub payload: CsvPayload,
    pub real_records: usize,
    pub filler_records: usize,
}

#[derive(Debug, Clone)]
pub struct IngestReport {
    pub identity: DataSourceIdentity,
    pub handle: CacheHandle,
    pub real_records: usize,
    pub filler_records: usize,
    pub estimated_tokens: usize,
    pub csv: String,
    pub export_path: Option<PathBuf>,
}

/// Runs one upload: normalize, budget, serialize, then replace the cache.
pub struct StatementIngestor {
    cache: Arc<CacheManager>,
    config: PipelineConfig,
    budget: TokenBudget,
    #[cfg(feature = "remote")]
    parser: Option<StatementParserClient>,
}

impl StatementIngestor {
    pub fn new(cache: Arc<CacheManager>, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let budget = TokenBudget::from_config(&config);
        Ok(Self {
            cache,
            config,
            budget,
            #[cfg(feature = "remote")]
            parser: None,
        })
    }

    /// Uploads through `parser` share the configured request timeout.
    #[cfg(feature = "remote")]
    pub fn with_parser(mut self, parser: StatementParserClient) -> Self {
        self.parser = Some(parser.with_request_timeout(self.config.request_timeout));
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The local half of an upload. Touches neither the store nor the network.
    pub fn prepare(&self, source: DataSource, raw: &RawStatement) -> Result<PreparedStatement> {
        let mut records = normalize(source, raw)?;
        let real_records = records.len();

        let unpadded = serialize(&records)?;
        let plan = self.budget.plan(source.kind(), unpadded.text());
        debug!(
            "{}: {} records, ~{} tokens, adding {} filler records toward {}",
            source,
            real_records,
            plan.current_tokens,
            plan.filler_records,
            self.budget.target()
        );

        let payload = if plan.filler_records == 0 {
            unpadded
        } else {
            records.pad(plan.filler_records);
            serialize(&records)?
        };

        Ok(PreparedStatement {
            records,
            payload,
            real_records,
            filler_records: plan.filler_records,
        })
    }

    pub async fn ingest(&self, source: DataSource, raw: &RawStatement) -> Result<IngestReport> {
        let prepared = self.prepare(source, raw)?;
        let identity = source.identity();

        let export_path = match &self.config.export_dir {
            Some(dir) => Some(self.export(dir, &identity, prepared.payload.text()).await?),
            None => None,
        };

        let handle = self
            .cache
            .refresh(
                &identity,
                prepared.payload.base64(),
                schema_description(source.kind()),
                self.config.cache_ttl,
            )
            .await?;

        info!(
            "{}: cached {} records ({} filler) as {}",
            identity,
            prepared.real_records + prepared.filler_records,
            prepared.filler_records,
            handle
        );

        Ok(IngestReport {
            identity,
            handle,
            real_records: prepared.real_records,
            filler_records: prepared.filler_records,
            estimated_tokens: prepared.payload.estimated_tokens(),
            csv: prepared.payload.into_text(),
            export_path,
        })
    }

    /// Ingests a parser service response body.
    pub async fn ingest_response(
        &self,
        source: DataSource,
        body: &serde_json::Value,
    ) -> Result<IngestReport> {
        let raw = RawStatement::from_parser_response(source, body)?;
        self.ingest(source, &raw).await
    }

    /// Sends a statement file to the parser service, then ingests the result.
    #[cfg(feature = "remote")]
    pub async fn upload(
        &self,
        source: DataSource,
        file: &Path,
        password: Option<&str>,
    ) -> Result<IngestReport> {
        let parser = self.parser.as_ref().ok_or_else(|| {
            crate::error::StatementChatError::Config(
                "no statement parser configured".to_string(),
            )
        })?;
        let body = parser.parse_statement(source, file, password).await?;
        self.ingest_response(source, &body).await
    }

    async fn export(
        &self,
        dir: &Path,
        identity: &DataSourceIdentity,
        csv: &str,
    ) -> Result<PathBuf> {
        fs::create_dir_all(dir).await?;
        let path = dir.join(format!("{}_Statement.csv", identity));
        fs::write(&path, csv).await?;
        debug!("Wrote {}", path.display());
        Ok(path)
    }
}
