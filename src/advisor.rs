use crate::error::{Result, StatementChatError};
use crate::llm::api::ContextCacheApi;
use crate::llm::prompts::budget_recommendation_prompt;
use crate::llm::types::GenerateContentRequest;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

const MAX_OUTPUT_TOKENS: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetLine {
    pub category: String,
    pub amount: f64,
}

/// A manually entered purchase. Quantity and amount are kept as typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingItem {
    pub name: String,
    pub quantity: String,
    pub amount: String,
}

impl SpendingItem {
    pub fn new(name: impl Into<String>, quantity: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: quantity.into(),
            amount: amount.into(),
        }
    }

    /// `quantity * amount`; text that is not a number counts as zero.
    pub fn total(&self) -> f64 {
        parse_or_zero(&self.quantity) * parse_or_zero(&self.amount)
    }

    pub fn to_budget_line(&self) -> BudgetLine {
        BudgetLine {
            category: self.name.clone(),
            amount: self.total(),
        }
    }
}

pub fn spending_total(items: &[SpendingItem]) -> f64 {
    items.iter().map(SpendingItem::total).sum()
}

fn parse_or_zero(text: &str) -> f64 {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Asks the model for expense-focused budget recommendations. No cached
/// statement is involved.
pub struct BudgetAdvisor {
    api: Arc<dyn ContextCacheApi>,
    model: String,
    request_timeout: Duration,
}

impl BudgetAdvisor {
    pub fn new(api: Arc<dyn ContextCacheApi>, model: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            api,
            model: model.into(),
            request_timeout,
        }
    }

    pub async fn recommend(&self, income: &[BudgetLine], expenses: &[BudgetLine]) -> Result<String> {
        let prompt = budget_recommendation_prompt(
            &serde_json::to_string(income)?,
            &serde_json::to_string(expenses)?,
        );
        let request = GenerateContentRequest::prompt(prompt, Some(MAX_OUTPUT_TOKENS));

        debug!(
            "Requesting budget recommendations for {} income and {} expense lines",
            income.len(),
            expenses.len()
        );
        let response = timeout(
            self.request_timeout,
            self.api.generate_content(&self.model, &request),
        )
        .await
        .map_err(|_| StatementChatError::Timeout {
            operation: "budget recommendation",
            after: self.request_timeout,
        })?;

        response
            .and_then(|body| body.first_text())
            .map(|text| text.trim().to_string())
            .map_err(|e| {
                warn!("Budget recommendation failed: {}", e);
                StatementChatError::Recommendation(e)
            })
    }
}
