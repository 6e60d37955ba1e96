use thiserror::Error;

/// Failure taxonomy shared by every stage of the relay.
///
/// Every variant is fatal for the invocation it occurs in; nothing is retried.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("missing 'time' in event payload")]
    MissingTime,

    #[error("failed to get parameter '{name}': {reason}")]
    Config { name: String, reason: String },

    #[error("invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("failed to query logs from '{source_id}': {reason}")]
    QueryFailed { source_id: String, reason: String },

    #[error("failed to send {entries} error log(s) to Slack")]
    DeliveryFailed { entries: usize },

    #[error("invalid relay configuration: {0}")]
    InvalidConfig(String),
}

impl RelayError {
    /// Short name of the failure class, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::MissingTime => "InputError",
            RelayError::Config { .. } => "ConfigError",
            RelayError::InvalidTimestamp { .. } => "InvalidTimestamp",
            RelayError::QueryFailed { .. } => "QueryFailed",
            RelayError::DeliveryFailed { .. } => "DeliveryFailed",
            RelayError::InvalidConfig(_) => "InvalidConfig",
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
