//! Error types for reservoir.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReservoirError>;

#[derive(Error, Debug)]
pub enum ReservoirError {
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("unsupported platform: {message}")]
    UnsupportedPlatform { message: String },

    #[error("operation timed out")]
    Timeout,
}

impl ReservoirError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig { message: message.into() }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedPlatform { message: message.into() }
    }
}
