#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use statement_chat::llm::types::{
    CachedContent, CreateCacheRequest, GenerateContentRequest, GenerateContentResponse,
};
use statement_chat::{
    BankProvider, ContextCacheApi, DataSource, KeyValueStore, MemoryStore, MobileMoneyProvider,
    PipelineConfig, RawStatement, RemoteError, StatementChat,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted stand-in for the Gemini service.
#[derive(Default)]
pub struct FakeGemini {
    next_id: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    create_delay: Mutex<Option<Duration>>,
    query_delay: Mutex<Option<Duration>>,
    create_failures: Mutex<VecDeque<RemoteError>>,
    answers: Mutex<VecDeque<Result<GenerateContentResponse, RemoteError>>>,
    pub create_requests: Mutex<Vec<CreateCacheRequest>>,
    pub generate_requests: Mutex<Vec<(String, GenerateContentRequest)>>,
}

impl FakeGemini {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_next_create(&self, error: RemoteError) {
        self.create_failures.lock().unwrap().push_back(error);
    }

    pub fn set_create_delay(&self, delay: Duration) {
        *self.create_delay.lock().unwrap() = Some(delay);
    }

    pub fn set_query_delay(&self, delay: Duration) {
        *self.query_delay.lock().unwrap() = Some(delay);
    }

    pub fn answer_with_text(&self, text: &str) {
        self.answer_with(Ok(text_response(text)));
    }

    pub fn answer_with(&self, answer: Result<GenerateContentResponse, RemoteError>) {
        self.answers.lock().unwrap().push_back(answer);
    }

    pub fn create_count(&self) -> usize {
        self.create_requests.lock().unwrap().len()
    }

    pub fn last_create(&self) -> CreateCacheRequest {
        self.create_requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no cache creation recorded")
    }

    pub fn last_generate(&self) -> (String, GenerateContentRequest) {
        self.generate_requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no generate call recorded")
    }
}

#[async_trait]
impl ContextCacheApi for FakeGemini {
    async fn create_cached_content(
        &self,
        request: &CreateCacheRequest,
    ) -> Result<CachedContent, RemoteError> {
        self.create_requests.lock().unwrap().push(request.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = *self.create_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(error) = self.create_failures.lock().unwrap().pop_front() {
            return Err(error);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(CachedContent {
            name: format!("cachedContents/fake-{}", id),
            model: Some(request.model.clone()),
            expire_time: None,
        })
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, RemoteError> {
        self.generate_requests
            .lock()
            .unwrap()
            .push((model.to_string(), request.clone()));

        let delay = *self.query_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(text_response("default answer")))
    }
}

pub fn text_response(text: &str) -> GenerateContentResponse {
    serde_json::from_value(json!({
        "candidates": [{ "content": { "parts": [{ "text": text }], "role": "model" } }]
    }))
    .unwrap()
}

pub fn server_error() -> RemoteError {
    RemoteError::Rejected {
        status: 500,
        message: "Internal error encountered.".to_string(),
    }
}

/// Memory store that records the order of writes.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    pub operations: Mutex<Vec<String>>,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn operations(&self) -> Vec<String> {
        self.operations.lock().unwrap().clone()
    }
}

#[async_trait]
impl KeyValueStore for RecordingStore {
    async fn get(&self, key: &str) -> statement_chat::Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> statement_chat::Result<()> {
        self.operations
            .lock()
            .unwrap()
            .push(format!("set {}={}", key, value));
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> statement_chat::Result<()> {
        self.operations.lock().unwrap().push(format!("delete {}", key));
        self.inner.delete(key).await
    }
}

pub fn chat_with(
    config: PipelineConfig,
    store: Arc<dyn KeyValueStore>,
    api: Arc<FakeGemini>,
) -> StatementChat {
    StatementChat::new(config, store, api).unwrap()
}

/// An Eco Bank style table: header row followed by `count` transactions.
pub fn eco_bank_rows(count: usize) -> RawStatement {
    let mut rows = vec![vec![
        json!("Trans Date"),
        json!("Narrative"),
        json!("Ref"),
        json!("Value Date"),
        json!("Debit"),
        json!("Credit"),
        json!("Balance"),
    ]];
    for i in 0..count {
        rows.push(vec![
            json!(format!("{:02}/03", i % 28 + 1)),
            json!("POS"),
            json!("R"),
            json!("1/3"),
            json!(i),
            json!(null),
            json!(1000 - i as i64),
        ]);
    }
    RawStatement::Rows(rows)
}

pub fn eco_bank() -> DataSource {
    DataSource::Bank(BankProvider::EcoBank)
}

pub fn mtn() -> DataSource {
    DataSource::MobileMoney(MobileMoneyProvider::MtnMobileMoney)
}
