use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Marketplace request to {url} failed with status {status}")]
    ScrapeTransport { status: u16, url: String },

    #[error("HTML extraction error: {message}")]
    HtmlParse { message: String },

    #[error("Generative model quota exceeded: {message}")]
    QuotaExceeded { message: String },

    #[error("Generative model API error (status {status}): {message}")]
    ModelApi { status: u16, message: String },

    #[error("Unusable model response: {message}")]
    ModelResponse { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

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

    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Quota,
    Parse,
    Configuration,
    Input,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EnrichError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EnrichError::Http(_)
            | EnrichError::ScrapeTransport { .. }
            | EnrichError::ModelApi { .. } => ErrorCategory::Network,
            EnrichError::QuotaExceeded { .. } => ErrorCategory::Quota,
            EnrichError::HtmlParse { .. }
            | EnrichError::ModelResponse { .. }
            | EnrichError::Serialization(_) => ErrorCategory::Parse,
            EnrichError::ConfigValidationError { .. }
            | EnrichError::InvalidConfigValueError { .. }
            | EnrichError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EnrichError::InvalidQuery { .. } => ErrorCategory::Input,
            EnrichError::Io(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Parse => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Quota => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, EnrichError::QuotaExceeded { .. })
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check network connectivity and that the remote service is reachable",
            ErrorCategory::Quota => "Wait before retrying or check the billing of the generative model account",
            ErrorCategory::Parse => "The remote service returned unexpected content; retry later or enter the value manually",
            ErrorCategory::Configuration => "Fix the configuration file or the environment variables it references",
            ErrorCategory::Input => "Provide at least a producer name for the wine",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EnrichError::QuotaExceeded { .. } => {
                "API quota exceeded. Please try again later.".to_string()
            }
            EnrichError::InvalidQuery { message } => format!("Invalid wine details: {}", message),
            EnrichError::MissingConfigError { field } => {
                format!("Missing configuration value: {}", field)
            }
            EnrichError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid configuration value for {}: {}", field, reason)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EnrichError>;
