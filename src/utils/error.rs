use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Upstream request timed out after {timeout:?}")]
    UpstreamTimeout { timeout: Duration },

    #[error("Upstream request failed: {0}")]
    UpstreamTransport(#[from] reqwest::Error),

    #[error("Upstream returned HTTP {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Upstream reply could not be used: {message}")]
    UpstreamMalformed { message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Upstream,
    Data,
    Config,
}

impl AdvisorError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::UpstreamMalformed {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput { .. } => ErrorCategory::Input,
            Self::UpstreamTimeout { .. }
            | Self::UpstreamTransport(_)
            | Self::UpstreamStatus { .. }
            | Self::UpstreamMalformed { .. } => ErrorCategory::Upstream,
            Self::CsvError(_) | Self::IoError(_) => ErrorCategory::Data,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => ErrorCategory::Config,
        }
    }

    pub fn is_upstream(&self) -> bool {
        self.category() == ErrorCategory::Upstream
    }

    /// Failures worth a second attempt against the provider. Replies that
    /// arrived but could not be parsed are never transient.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::UpstreamTimeout { .. } => true,
            Self::UpstreamTransport(e) => e.is_timeout() || e.is_connect(),
            Self::UpstreamStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => self.to_string(),
            ErrorCategory::Upstream => {
                "The analysis service is unavailable right now".to_string()
            }
            ErrorCategory::Data => format!("Could not read the practitioner dataset: {}", self),
            ErrorCategory::Config => format!("Invalid configuration: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "Send a base64 encoded JPEG, PNG, WEBP or HEIC image",
            Self::UpstreamTimeout { .. } => "Raise --timeout-seconds or retry later",
            Self::UpstreamTransport(_) => "Check network connectivity to the provider",
            Self::UpstreamStatus { status: 401 | 403, .. } => "Check GEMINI_API_KEY",
            Self::UpstreamStatus { .. } => "Retry later",
            Self::UpstreamMalformed { .. } => "Retry with another picture",
            Self::CsvError(_) => "Check the dataset file is valid CSV with a header row",
            Self::IoError(_) => "Check the dataset path and file permissions",
            Self::MissingConfigError { .. } => "Provide the value by flag, environment or config file",
            _ => "Review the configuration values",
        }
    }
}

pub type Result<T> = std::result::Result<T, AdvisorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            AdvisorError::invalid_input("x").category(),
            ErrorCategory::Input
        );
        assert!(AdvisorError::malformed("bad json").is_upstream());
        assert!(AdvisorError::UpstreamTimeout {
            timeout: Duration::from_secs(30)
        }.is_upstream());
        assert_eq!(
            AdvisorError::MissingConfigError {
                field: "api_key".to_string()
            }
            .category(),
            ErrorCategory::Config
        );
    }

    #[test]
    fn test_transient_classification() {
        assert!(AdvisorError::UpstreamTimeout {
            timeout: Duration::from_secs(1)
        }.is_transient());
        assert!(AdvisorError::UpstreamStatus {
            status: 503,
            body: String::new()
        }
        .is_transient());
        assert!(AdvisorError::UpstreamStatus {
            status: 429,
            body: String::new()
        }
        .is_transient());
        assert!(!AdvisorError::UpstreamStatus {
            status: 400,
            body: String::new()
        }
        .is_transient());
        assert!(!AdvisorError::malformed("not json").is_transient());
        assert!(!AdvisorError::invalid_input("missing").is_transient());
    }
}
