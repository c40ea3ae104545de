use crate::config::DEFAULT_REQUEST_TIMEOUT;
use crate::error::{RemoteError, Result, StatementChatError};
use crate::llm::types::rejection;
use crate::source::{BankProvider, DataSource};
use log::{debug, warn};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tokio::time::timeout;

/// Client for the service that turns statement PDFs into JSON tables.
#[derive(Clone)]
pub struct StatementParserClient {
    client: Client,
    base_url: String,
    request_timeout: Duration,
}

impl StatementParserClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Deadline for one upload, covering the request and the response body.
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Reads `STATEMENT_PARSER_URL`.
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("STATEMENT_PARSER_URL").map_err(|_| {
            StatementChatError::Config("STATEMENT_PARSER_URL must be set".to_string())
        })?;
        Ok(Self::new(url))
    }

    /// Eco Bank has its own parser; every other bank shares the Stanbic one.
    pub fn endpoint(&self, source: DataSource) -> String {
        let route = match source {
            DataSource::Bank(BankProvider::EcoBank) => "eco_bank",
            DataSource::Bank(_) => "stanbic_bank",
            DataSource::MobileMoney(_) => "mobile_money",
        };
        format!("{}/{}", self.base_url, route)
    }

    /// Uploads `file` and returns the parser's JSON body. The password is
    /// only sent for Eco Bank, whose statements are encrypted.
    pub async fn parse_statement(
        &self,
        source: DataSource,
        file: &Path,
        password: Option<&str>,
    ) -> Result<serde_json::Value> {
        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StatementChatError::Config("Invalid file name".to_string()))?
            .to_string();
        let mime_type = mime_guess::from_path(file)
            .first_or_octet_stream()
            .to_string();
        let bytes = fs::read(file).await?;

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(&mime_type)
            .map_err(|e| StatementChatError::StatementSource(RemoteError::Transport(e.to_string())))?;
        let mut form = Form::new().part("file", part);
        if let (DataSource::Bank(BankProvider::EcoBank), Some(password)) = (source, password) {
            form = form.text("password", password.to_string());
        }

        let url = self.endpoint(source);
        debug!("Uploading {} statement to {}", source, url);

        let (status, text) = timeout(self.request_timeout, self.send(&url, form))
            .await
            .map_err(|_| {
                warn!("Statement parser did not answer {} upload in time", source);
                StatementChatError::Timeout {
                    operation: "statement parsing",
                    after: self.request_timeout,
                }
            })??;

        if !status.is_success() {
            let err = rejection(status.as_u16(), &text);
            warn!("Statement parser rejected {} upload: {}", source, err);
            return Err(StatementChatError::StatementSource(err));
        }

        serde_json::from_str(&text).map_err(|e| {
            StatementChatError::StatementSource(RemoteError::MalformedResponse(format!(
                "parser response is not JSON: {}",
                e
            )))
        })
    }

    async fn send(&self, url: &str, form: Form) -> Result<(StatusCode, String)> {
        let transport =
            |e: reqwest::Error| StatementChatError::StatementSource(RemoteError::Transport(e.to_string()));
        let res = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;
        let status = res.status();
        let text = res.text().await.map_err(transport)?;
        Ok((status, text))
    }
}
