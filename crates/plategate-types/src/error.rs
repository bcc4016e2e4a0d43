//! Error types for plategate

use std::path::PathBuf;

use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration not found")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),

    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Ledger storage errors
///
/// Every variant is fatal for the operation that raised it. Callers that
/// mutate the ledger retry once before giving up.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger file not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("Timed out after {waited_ms}ms waiting for ledger lock {}", .path.display())]
    LockTimeout { path: PathBuf, waited_ms: u64 },

    #[error("Ledger row {row} is corrupted: {reason}")]
    Corrupted { row: usize, reason: String },

    #[error("Failed to replace ledger file: {0}")]
    Persist(String),

    #[error("Ledger CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Ledger IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the gate board and the proximity sensor
#[derive(Debug, Error)]
pub enum HardwareError {
    #[error("Gate write failed on {device}: {source}")]
    GateWrite {
        device: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Sensor read failed: {0}")]
    Sensor(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    #[error("Frame capture failed: {0}")]
    Capture(String),

    #[error("Invalid plate: {0}")]
    InvalidPlate(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("No open visit for plate {0}")]
    NoOpenVisit(String),

    #[error("Station task failed: {0}")]
    Station(String),
}

pub type Result<T> = std::result::Result<T, Error>;
