use crate::error::{Result, StatementChatError};
use crate::source::SourceKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-001";
pub const DEFAULT_TARGET_TOKENS: usize = 32_768;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(172_800);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Estimated token cost of one filler record, per data kind.
///
/// An empty CSV line is `field_count - 1` commas plus a newline, so the
/// defaults are `field_count / 4` tokens under the character heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FillerCosts {
    pub bank_statement: f64,
    pub mobile_money: f64,
}

impl Default for FillerCosts {
    fn default() -> Self {
        Self {
            bank_statement: 1.5,
            mobile_money: 2.5,
        }
    }
}

impl FillerCosts {
    pub fn for_kind(&self, kind: SourceKind) -> f64 {
        match kind {
            SourceKind::BankStatement => self.bank_statement,
            SourceKind::MobileMoney => self.mobile_money,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Model id without the `models/` prefix.
    pub model: String,
    pub target_tokens: usize,
    #[serde(with = "seconds")]
    pub cache_ttl: Duration,
    #[serde(with = "seconds")]
    pub request_timeout: Duration,
    pub filler_costs: FillerCosts,
    /// Where padded statement CSVs are written, if anywhere.
    pub export_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            target_tokens: DEFAULT_TARGET_TOKENS,
            cache_ttl: DEFAULT_CACHE_TTL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            filler_costs: FillerCosts::default(),
            export_dir: None,
        }
    }
}

impl PipelineConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_target_tokens(mut self, target: usize) -> Self {
        self.target_tokens = target;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_filler_costs(mut self, costs: FillerCosts) -> Self {
        self.filler_costs = costs;
        self
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = Some(dir.into());
        self
    }

    /// The fully qualified model resource name used by cache creation.
    pub fn model_resource(&self) -> String {
        if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        }
    }

    /// TTL in the `"<seconds>s"` duration format the caching API expects.
    pub fn ttl_string(&self) -> String {
        format!("{}s", self.cache_ttl.as_secs())
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(StatementChatError::Config("model must not be empty".to_string()));
        }
        if self.target_tokens == 0 {
            return Err(StatementChatError::Config(
                "target_tokens must be greater than zero".to_string(),
            ));
        }
        if self.cache_ttl.as_secs() == 0 {
            return Err(StatementChatError::Config(
                "cache_ttl must be at least one second".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(StatementChatError::Config(
                "request_timeout must be greater than zero".to_string(),
            ));
        }
        for (name, cost) in [
            ("bank_statement", self.filler_costs.bank_statement),
            ("mobile_money", self.filler_costs.mobile_money),
        ] {
            if !cost.is_finite() || cost <= 0.0 {
                return Err(StatementChatError::Config(format!(
                    "filler cost for {} must be a positive number, got {}",
                    name, cost
                )));
            }
        }
        Ok(())
    }
}

/// Durations in config files are plain seconds, e.g. `"cache_ttl": 172800`
/// or `"request_timeout": 0.5`.
mod seconds {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        if value.subsec_nanos() == 0 {
            serializer.serialize_u64(value.as_secs())
        } else {
            serializer.serialize_f64(value.as_secs_f64())
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs)
            .map_err(|_| de::Error::custom(format!("invalid duration in seconds: {}", secs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ttl_string(), "172800s");
        assert_eq!(config.model_resource(), "models/gemini-1.5-flash-001");
    }

    #[test]
    fn test_model_resource_keeps_existing_prefix() {
        let config = PipelineConfig::default().with_model("models/gemini-1.5-pro-001");
        assert_eq!(config.model_resource(), "models/gemini-1.5-pro-001");
    }

    #[test]
    fn test_validate_rejects_bad_costs() {
        let config = PipelineConfig::default().with_filler_costs(FillerCosts {
            bank_statement: 0.0,
            mobile_money: 2.5,
        });
        assert!(matches!(config.validate(), Err(StatementChatError::Config(_))));

        let config = PipelineConfig::default().with_filler_costs(FillerCosts {
            bank_statement: 1.5,
            mobile_money: f64::NAN,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = PipelineConfig::default().with_request_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "target_tokens": 4096 }"#).unwrap();
        assert_eq!(config.target_tokens, 4096);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.filler_costs, FillerCosts::default());
    }

    #[test]
    fn test_durations_load_as_seconds() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "cache_ttl": 3600, "request_timeout": 0.5 }"#).unwrap();
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.request_timeout, Duration::from_millis(500));

        let json = serde_json::to_value(PipelineConfig::default()).unwrap();
        assert_eq!(json["cache_ttl"], 172_800);
        assert_eq!(json["request_timeout"], 60);

        let negative = serde_json::from_str::<PipelineConfig>(r#"{ "cache_ttl": -1 }"#);
        assert!(negative.is_err());
    }
}
