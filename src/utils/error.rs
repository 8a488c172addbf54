use crate::domain::source::Source;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    // Configuration: detected while assembling or selecting, never retried.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("No gateway bound for source '{source_kind}'")]
    UnboundSource { source_kind: Source },

    #[error("Gateway bindings are incomplete, unbound sources: {}", join_sources(.missing))]
    IncompleteBindings { missing: Vec<Source> },

    #[error("Source '{source_kind}' is bound more than once")]
    DuplicateBinding { source_kind: Source },

    // Caller supplied a discriminator outside the declared set.
    #[error("Invalid source '{value}', expected one of: {}", join_sources(&Source::ALL))]
    InvalidSource { value: String },

    // Business / domain
    #[error("Test case not found: {id}")]
    NotFound { id: String },

    #[error("Conflict on test case {id}: {message}")]
    Conflict { id: String, message: String },

    #[error("Rule violated: {message}")]
    RuleViolated { message: String },

    // Integration
    #[error("{backend} backend failed: {message}")]
    Integration { backend: Source, message: String },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

fn join_sources(sources: &[Source]) -> String {
    sources
        .iter()
        .map(Source::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    InvalidSource,
    Business,
    Integration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ServiceError {
    pub fn not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound { id: id.to_string() }
    }

    pub fn conflict(id: impl std::fmt::Display, message: impl Into<String>) -> Self {
        Self::Conflict {
            id: id.to_string(),
            message: message.into(),
        }
    }

    pub fn rule_violated(message: impl Into<String>) -> Self {
        Self::RuleViolated {
            message: message.into(),
        }
    }

    pub fn integration(backend: Source, message: impl Into<String>) -> Self {
        Self::Integration {
            backend,
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::UnboundSource { .. }
            | Self::IncompleteBindings { .. }
            | Self::DuplicateBinding { .. } => ErrorCategory::Configuration,
            Self::InvalidSource { .. } => ErrorCategory::InvalidSource,
            Self::NotFound { .. } | Self::Conflict { .. } | Self::RuleViolated { .. } => {
                ErrorCategory::Business
            }
            Self::Integration { .. }
            | Self::ApiError(_)
            | Self::CsvError(_)
            | Self::IoError(_)
            | Self::DatabaseError(_)
            | Self::SerializationError(_) => ErrorCategory::Integration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Business => ErrorSeverity::Low,
            ErrorCategory::Integration => ErrorSeverity::Medium,
            ErrorCategory::InvalidSource => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    /// Only integration failures are worth retrying, and only the caller decides to.
    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Integration
    }

    /// Transport status hint for an outer HTTP layer.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Conflict { .. } => 409,
            Self::RuleViolated { .. } => 422,
            Self::InvalidSource { .. } => 400,
            _ => match self.category() {
                ErrorCategory::Integration => 503,
                _ => 500,
            },
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::UnboundSource { source_kind } => format!(
                "Add a [sources.{}] section to the router configuration",
                source_kind
            ),
            Self::IncompleteBindings { missing } => format!(
                "Configure the missing sources ({}) or set router.require_all_sources = false",
                join_sources(missing)
            ),
            Self::DuplicateBinding { .. } => {
                "Bind each source exactly once when assembling the router".to_string()
            }
            Self::InvalidSource { .. } => format!(
                "Use one of the supported sources: {}",
                join_sources(&Source::ALL)
            ),
            Self::NotFound { .. } => "Check the test case id and the selected source".to_string(),
            Self::Conflict { .. } => "Reload the test case and retry with its current state".to_string(),
            Self::RuleViolated { .. } => "Adjust the request to satisfy the rule".to_string(),
            Self::ApiError(_) | Self::Integration { .. } => {
                "Check connectivity and credentials of the backing system, then retry".to_string()
            }
            Self::CsvError(_) => "Check the CSV file for malformed rows".to_string(),
            Self::IoError(_) => "Check that the file exists and is accessible".to_string(),
            Self::DatabaseError(_) => "Check the database file and its schema".to_string(),
            Self::SerializationError(_) => "Check the payload returned by the backend".to_string(),
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => "Fix the configuration file and restart".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::InvalidSource => self.to_string(),
            ErrorCategory::Business => format!("Request rejected: {}", self),
            ErrorCategory::Integration => format!("Backing system unavailable: {}", self),
        }
    }
}
