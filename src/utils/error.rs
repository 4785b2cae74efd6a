use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Source error: {message}")]
    SourceError { message: String },

    #[error("Transform error: {message}")]
    TransformError { message: String },

    #[error("Store error: {message}")]
    StoreError { message: String },

    #[error("Store timed out after {after_ms}ms")]
    StoreTimeout { after_ms: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Source,
    Transform,
    Store,
    Io,
    Serialization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            EtlError::ApiError(_) | EtlError::SourceError { .. } => ErrorCategory::Source,
            EtlError::TransformError { .. } => ErrorCategory::Transform,
            EtlError::StoreError { .. } | EtlError::StoreTimeout { .. } => ErrorCategory::Store,
            EtlError::IoError(_) => ErrorCategory::Io,
            EtlError::CsvError(_) | EtlError::SerializationError(_) => {
                ErrorCategory::Serialization
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 批次錯誤已在 pipeline 內部隔離
            ErrorCategory::Transform => ErrorSeverity::Low,
            ErrorCategory::Store | ErrorCategory::Source => ErrorSeverity::Medium,
            ErrorCategory::Serialization => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Source => format!("Could not read input records: {}", self),
            ErrorCategory::Transform => format!("A record could not be transformed: {}", self),
            ErrorCategory::Store => format!("Records could not be stored: {}", self),
            ErrorCategory::Io => format!("File system error: {}", self),
            ErrorCategory::Serialization => format!("Malformed data: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::InvalidConfigValueError { field, .. } if field.ends_with("batch_size") => {
                "Use a batch size of at least 1"
            }
            EtlError::MissingConfigError { .. } => "Provide the missing setting in the config file or via flags",
            EtlError::StoreTimeout { .. } => "Increase the store timeout or reduce the batch size",
            EtlError::ApiError(_) => "Check that the API endpoint is reachable",
            _ => match self.category() {
                ErrorCategory::Configuration => "Check the configuration values and try again",
                ErrorCategory::Source => "Check the input source and its format",
                ErrorCategory::Transform => "Inspect the offending records for unexpected field types",
                ErrorCategory::Store => "Check the output destination and retry",
                ErrorCategory::Io => "Check file paths and permissions",
                ErrorCategory::Serialization => "Make sure the input is valid JSON or CSV",
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
