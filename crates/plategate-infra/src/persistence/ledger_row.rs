//! CSV row layout of the visit ledger
//!
//! Column names are those of the gate log the stations have always written,
//! so existing `plates_log.csv` files load unchanged.

use std::str::FromStr;

use chrono::{NaiveDateTime, Timelike};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use plategate_domain::model::{PaymentStatus, VisitRecord, TIMESTAMP_FORMAT};
use plategate_types::LedgerError;

pub const LEDGER_HEADER: [&str; 6] = [
    "Plate Number",
    "Entry Timestamp",
    "Exit Timestamp",
    "Payment Status",
    "Payment Timestamp",
    "Amount Paid",
];

/// One ledger line as text. Empty string means "absent".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    #[serde(rename = "Plate Number")]
    pub plate: String,
    #[serde(rename = "Entry Timestamp")]
    pub entry_time: String,
    #[serde(rename = "Exit Timestamp")]
    pub exit_time: String,
    #[serde(rename = "Payment Status")]
    pub payment_status: String,
    #[serde(rename = "Payment Timestamp")]
    pub payment_time: String,
    #[serde(rename = "Amount Paid")]
    pub amount_paid: String,
}

impl From<&VisitRecord> for LedgerRow {
    fn from(record: &VisitRecord) -> Self {
        Self {
            plate: record.plate.clone(),
            entry_time: format_time(record.entry_time),
            exit_time: record.exit_time.map(format_time).unwrap_or_default(),
            payment_status: record.payment_status.as_flag().to_string(),
            payment_time: record.payment_time.map(format_time).unwrap_or_default(),
            amount_paid: record
                .amount_paid
                .map(|amount| amount.to_string())
                .unwrap_or_default(),
        }
    }
}

impl LedgerRow {
    /// Parse into a visit. `row` is the 1-based file line, for error messages.
    pub fn into_record(self, row: usize) -> Result<VisitRecord, LedgerError> {
        if self.plate.is_empty() {
            return Err(corrupted(row, "empty plate number"));
        }

        let entry_time = parse_time(&self.entry_time, row, "Entry Timestamp")?
            .ok_or_else(|| corrupted(row, "missing entry timestamp"))?;
        let exit_time = parse_time(&self.exit_time, row, "Exit Timestamp")?;
        let payment_status = PaymentStatus::from_flag(&self.payment_status).ok_or_else(|| {
            corrupted(
                row,
                format!("invalid payment status '{}'", self.payment_status),
            )
        })?;
        let payment_time = parse_time(&self.payment_time, row, "Payment Timestamp")?;
        let amount_paid = parse_amount(&self.amount_paid, row)?;

        Ok(VisitRecord {
            plate: self.plate,
            entry_time,
            exit_time,
            payment_status,
            payment_time,
            amount_paid,
        })
    }
}

/// The ledger stores whole seconds; drop anything finer so a record reads
/// back exactly as it was written.
pub(crate) fn truncate_to_seconds(time: NaiveDateTime) -> NaiveDateTime {
    time.with_nanosecond(0).unwrap_or(time)
}

fn format_time(time: NaiveDateTime) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_time(
    value: &str,
    row: usize,
    column: &str,
) -> Result<Option<NaiveDateTime>, LedgerError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map(Some)
        .map_err(|_| corrupted(row, format!("invalid {column} '{value}'")))
}

fn parse_amount(value: &str, row: usize) -> Result<Option<Decimal>, LedgerError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    Decimal::from_str(value)
        .map(Some)
        .map_err(|_| corrupted(row, format!("invalid amount '{value}'")))
}

fn corrupted(row: usize, reason: impl Into<String>) -> LedgerError {
    LedgerError::Corrupted {
        row,
        reason: reason.into(),
    }
}
