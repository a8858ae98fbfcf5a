//! Error types for rusty-fundamentals
//!
//! Missing inputs, degenerate math and insufficient history are not errors:
//! they surface as `None` on the affected field. This enum covers what the
//! caller must act on.

use crate::types::CompanyId;
use thiserror::Error;

/// Main error type for rusty-fundamentals
#[derive(Error, Debug)]
pub enum FundamentalsError {
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Company not found: {0}")]
    CompanyNotFound(CompanyId),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Batch cancelled after {completed} of {total} companies")]
    Cancelled { completed: usize, total: usize },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Result type alias for rusty-fundamentals operations
pub type Result<T> = std::result::Result<T, FundamentalsError>;
