//! Core types for the plate gate stations

mod error;

pub use error::*;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Output format for results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Which side of the lane a station guards
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StationKind {
    Entry,
    Exit,
}

impl std::fmt::Display for StationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StationKind::Entry => write!(f, "entry"),
            StationKind::Exit => write!(f, "exit"),
        }
    }
}

/// Single-byte commands understood by the gate controller board
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GateCommand {
    Open,
    Close,
    Alarm,
}

impl GateCommand {
    /// Wire byte sent over the serial link
    pub fn as_byte(self) -> u8 {
        match self {
            GateCommand::Open => b'1',
            GateCommand::Close => b'0',
            GateCommand::Alarm => b'2',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GateCommand::Open => "Opening gate",
            GateCommand::Close => "Closing gate",
            GateCommand::Alarm => "Sounding alarm",
        }
    }
}
