//! Error types for tallychain

use std::fmt;

#[derive(Debug, Clone)]
pub enum LedgerError {
    InvalidTransaction(String),
    InvalidBlock(String),
    ConservationViolation(String),
    ParseError(String),
    ConfigError(String),
    IoError(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LedgerError::InvalidTransaction(msg) => write!(f, "Invalid transaction: {}", msg),
            LedgerError::InvalidBlock(msg) => write!(f, "Invalid block: {}", msg),
            LedgerError::ConservationViolation(msg) => {
                write!(f, "Conservation violation: {}", msg)
            }
            LedgerError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            LedgerError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            LedgerError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::IoError(err.to_string())
    }
}

impl From<std::num::ParseIntError> for LedgerError {
    fn from(err: std::num::ParseIntError) -> Self {
        LedgerError::ParseError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, LedgerError>;
