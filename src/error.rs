use std::time::Duration;
use thiserror::Error;

/// How a call to a remote collaborator went wrong.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("remote rejected the request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    MalformedResponse(String),
}

#[derive(Error, Debug)]
pub enum StatementChatError {
    #[error("Could not interpret statement data: {0}")]
    Normalization(String),

    #[error("Unknown data source: {0}")]
    UnknownSource(String),

    #[error("Failed to create context cache for {identity}: {source}")]
    CacheCreation {
        identity: String,
        #[source]
        source: RemoteError,
    },

    #[error("No cached statement for {identity}")]
    NoCache { identity: String },

    #[error("Query against {identity} failed: {source}")]
    Query {
        identity: String,
        #[source]
        source: RemoteError,
    },

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Statement parser failed: {0}")]
    StatementSource(#[source] RemoteError),

    #[error("Budget recommendation failed: {0}")]
    Recommendation(#[source] RemoteError),

    #[error("Key-value store error: {0}")]
    Store(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StatementChatError {
    /// The sentence shown to the user for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Normalization(_) | Self::Csv(_) | Self::Base64(_) => {
                "We could not read this statement. Check the file and try again."
            }
            Self::UnknownSource(_) => "Please select a supported bank or mobile money provider.",
            Self::CacheCreation { .. } => {
                "Your statement could not be prepared for chat. Please upload it again."
            }
            Self::NoCache { .. } => "No statement found for this account. Upload a statement first.",
            Self::Query { .. } => "The assistant could not answer right now. Please resend your question.",
            Self::Timeout { .. } => "The request took too long. Please try again.",
            Self::StatementSource(_) => {
                "The statement could not be processed. Check the file or password and try again."
            }
            Self::Recommendation(_) => "Budget recommendations are unavailable right now. Please try again.",
            Self::Store(_) | Self::IoError(_) | Self::SerializationError(_) => {
                "Local storage is unavailable. Please restart the app."
            }
            Self::Config(_) => "The app is misconfigured. Please contact support.",
        }
    }

    /// Whether repeating the same user action can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::CacheCreation { .. }
                | Self::Query { .. }
                | Self::Timeout { .. }
                | Self::StatementSource(_)
                | Self::Recommendation(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, StatementChatError>;
