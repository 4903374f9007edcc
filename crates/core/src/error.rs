use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Computation error: {0}")]
    Computation(String),

    #[error("Pedigree error: {0}")]
    Pedigree(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl AnalysisError {
    /// Stable machine-readable name of the error category.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::InvalidArgument(_) => "invalid_argument",
            AnalysisError::Computation(_) => "computation_error",
            AnalysisError::Pedigree(_) => "pedigree_error",
            AnalysisError::Config(_) => "config_error",
            AnalysisError::Io(_) => "io_error",
            AnalysisError::Csv(_) => "csv_error",
            AnalysisError::Json(_) => "json_error",
            AnalysisError::Toml(_) => "toml_error",
        }
    }

    /// Whether the error was caused by the caller's input rather than by
    /// the engine or the underlying data.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            AnalysisError::InvalidArgument(_) | AnalysisError::Json(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
