// src/error.rs
use thiserror::Error;

/// Errors raised while loading the dataset or editing dashboard state.
#[derive(Debug, Error)]
pub enum DashboardError {
    // Loading
    #[error("Network error: {0}")]
    Network(String),

    #[error("CSV parse error: {0}")]
    Parse(String),

    #[error("Failed to read data file: {0}")]
    Io(String),

    #[error("Dataset contains no rows")]
    EmptyDataset,

    // State
    #[error("Invalid value for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Unknown field: {0}")]
    UnknownField(String),

    // Configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DashboardError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        DashboardError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// True for failures of the data loader (as opposed to bad user input).
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            DashboardError::Network(_)
                | DashboardError::Parse(_)
                | DashboardError::Io(_)
                | DashboardError::EmptyDataset
        )
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        DashboardError::Network(err.to_string())
    }
}

impl From<csv::Error> for DashboardError {
    fn from(err: csv::Error) -> Self {
        DashboardError::Parse(err.to_string())
    }
}

impl From<std::io::Error> for DashboardError {
    fn from(err: std::io::Error) -> Self {
        DashboardError::Io(err.to_string())
    }
}
