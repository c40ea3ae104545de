use crate::error::RemoteError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(alias = "inlineData")]
        inline_data: InlineData,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn inline_csv(base64: impl Into<String>) -> Self {
        Self::InlineData {
            inline_data: InlineData {
                mime_type: "text/csv".to_string(),
                data: base64.into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            parts,
            role: Some("user".to_string()),
        }
    }

    /// A system instruction: text only, no role.
    pub fn instruction(text: impl Into<String>) -> Self {
        Self {
            parts: vec![Part::text(text)],
            role: None,
        }
    }
}

/// Body of `POST /cachedContents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCacheRequest {
    pub model: String,
    pub contents: Vec<Content>,
    pub system_instruction: Content,
    pub ttl: String,
}

impl CreateCacheRequest {
    pub fn csv(
        model: impl Into<String>,
        csv_base64: impl Into<String>,
        schema_description: impl Into<String>,
        ttl: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            contents: vec![Content::user(vec![Part::inline_csv(csv_base64)])],
            system_instruction: Content::instruction(schema_description),
            ttl: ttl.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedContent {
    pub name: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub expire_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// Body of `POST /models/{model}:generateContent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// A question answered against a cached context.
    pub fn grounded(
        cached_content: impl Into<String>,
        instruction: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            contents: vec![Content::user(vec![Part::text(instruction), Part::text(query)])],
            cached_content: Some(cached_content.into()),
            generation_config: None,
        }
    }

    pub fn prompt(text: impl Into<String>, max_output_tokens: Option<u32>) -> Self {
        Self {
            contents: vec![Content::user(vec![Part::text(text)])],
            cached_content: None,
            generation_config: max_output_tokens.map(|max| GenerationConfig {
                max_output_tokens: Some(max),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Option<Vec<Candidate>>,
}

impl GenerateContentResponse {
    /// Text of `candidates[0].content.parts[0]`. An empty string is a valid
    /// answer; a missing one is not.
    pub fn first_text(&self) -> Result<String, RemoteError> {
        let candidate = self
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .ok_or_else(|| RemoteError::MalformedResponse("no candidates returned".to_string()))?;

        let part = candidate
            .content
            .as_ref()
            .and_then(|c| c.parts.first())
            .ok_or_else(|| {
                RemoteError::MalformedResponse(format!(
                    "candidate has no content (finish reason: {})",
                    candidate.finish_reason.as_deref().unwrap_or("unknown")
                ))
            })?;

        match part {
            Part::Text { text } => Ok(text.clone()),
            Part::InlineData { .. } => Err(RemoteError::MalformedResponse(
                "model returned non-text content".to_string(),
            )),
        }
    }
}

/// Pulls a human-readable message out of an error body. Accepts both
/// `{"message": ...}` and `{"error": {"message": ...}}`.
pub fn remote_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .or_else(|| value.get("error").and_then(|e| e.get("message")))
        .and_then(|m| m.as_str())
        .map(str::to_string)
}

/// Builds the [`RemoteError`] for a non-success HTTP status.
pub fn rejection(status: u16, body: &str) -> RemoteError {
    let message = remote_error_message(body).unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            "no error message in response".to_string()
        } else {
            trimmed.chars().take(500).collect()
        }
    });
    RemoteError::Rejected { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_cache_request_wire_shape() {
        let request = CreateCacheRequest::csv(
            "models/gemini-1.5-flash-001",
            "YSxi",
            "columns are a and b",
            "172800s",
        );
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "models/gemini-1.5-flash-001",
                "contents": [{
                    "parts": [{ "inline_data": { "mime_type": "text/csv", "data": "YSxi" } }],
                    "role": "user"
                }],
                "systemInstruction": { "parts": [{ "text": "columns are a and b" }] },
                "ttl": "172800s"
            })
        );
    }

    #[test]
    fn test_grounded_request_wire_shape() {
        let request = GenerateContentRequest::grounded("cachedContents/x1", "rules", "how much?");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "contents": [{
                    "parts": [{ "text": "rules" }, { "text": "how much?" }],
                    "role": "user"
                }],
                "cachedContent": "cachedContents/x1"
            })
        );
    }

    #[test]
    fn test_first_text() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "You spent 20,000 UGX." }], "role": "model" } }]
        }))
        .unwrap();
        assert_eq!(response.first_text().unwrap(), "You spent 20,000 UGX.");

        let blocked: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        }))
        .unwrap();
        assert!(matches!(
            blocked.first_text(),
            Err(RemoteError::MalformedResponse(msg)) if msg.contains("SAFETY")
        ));

        let empty: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert!(empty.first_text().is_err());
    }

    #[test]
    fn test_rejection_messages() {
        let gemini = r#"{"error": {"code": 400, "message": "Cached content is too small", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(
            rejection(400, gemini),
            RemoteError::Rejected {
                status: 400,
                message: "Cached content is too small".to_string()
            }
        );

        let flat = r#"{"message": "bad password"}"#;
        assert_eq!(remote_error_message(flat).as_deref(), Some("bad password"));

        assert!(matches!(
            rejection(502, "<html>Bad Gateway</html>"),
            RemoteError::Rejected { status: 502, message } if message.contains("Bad Gateway")
        ));
    }
}
