//! Error types for primer library construction

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrimerError {
    #[error("Invalid symbol '{symbol}' at position {position}; only A, C, G, T are allowed")]
    InvalidSymbol { symbol: char, position: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Length mismatch: {left} bp vs {right} bp")]
    LengthMismatch { left: usize, right: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error(
        "Worker {worker} exhausted its attempt budget: found {found} of {requested} candidates after {attempts} attempts"
    )]
    GenerationExhausted {
        worker: usize,
        requested: usize,
        found: usize,
        attempts: u64,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse parameters: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Failed to serialize parameters: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, PrimerError>;
