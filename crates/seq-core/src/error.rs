//! Error types for the SimpleEQ core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum SeqError {
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    #[error("Invalid FFT order {0} (supported: 11..=15)")]
    InvalidFftOrder(u32),

    #[error("Invalid block size: {0}")]
    InvalidBlockSize(usize),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias
pub type SeqResult<T> = Result<T, SeqError>;
