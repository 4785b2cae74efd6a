#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, InputFormat};

/// 輸入來源種類
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Json { path: String },
    Csv { path: String },
    Api { endpoint: String },
}

impl SourceKind {
    pub const TYPES: [&'static str; 3] = ["json", "csv", "api"];

    /// 由型別名稱與路徑/端點建立
    pub fn from_parts(
        kind: &str,
        path: Option<&str>,
        endpoint: Option<&str>,
    ) -> crate::utils::error::Result<Self> {
        use crate::utils::validation::validate_required_field;

        let path = path.map(str::to_string);
        let endpoint = endpoint.map(str::to_string);
        match kind {
            "json" => Ok(SourceKind::Json {
                path: validate_required_field("source.path", &path)?.clone(),
            }),
            "csv" => Ok(SourceKind::Csv {
                path: validate_required_field("source.path", &path)?.clone(),
            }),
            "api" => Ok(SourceKind::Api {
                endpoint: validate_required_field("source.endpoint", &endpoint)?.clone(),
            }),
            other => Err(crate::utils::error::EtlError::InvalidConfigValueError {
                field: "source.type".to_string(),
                value: other.to_string(),
                reason: format!("Expected one of: {}", Self::TYPES.join(", ")),
            }),
        }
    }

    pub fn validate(&self) -> crate::utils::error::Result<()> {
        use crate::utils::validation::{validate_file_extension, validate_path, validate_url};

        match self {
            SourceKind::Json { path } => {
                validate_path("source.path", path)?;
                validate_file_extension("source.path", path, &["json", "jsonl", "ndjson"])
            }
            SourceKind::Csv { path } => {
                validate_path("source.path", path)?;
                validate_file_extension("source.path", path, &["csv"])
            }
            SourceKind::Api { endpoint } => validate_url("source.endpoint", endpoint),
        }
    }
}
