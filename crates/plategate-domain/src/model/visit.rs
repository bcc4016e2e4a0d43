//! Visit record type definitions

use chrono::{Duration, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Timestamp layout used in the ledger and in console output
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Payment state of a visit. Only ever moves from `Unpaid` to `Paid`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
}

impl PaymentStatus {
    /// Ledger encoding: `0` unpaid, `1` paid
    pub fn as_flag(self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "0",
            PaymentStatus::Paid => "1",
        }
    }

    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag.trim() {
            "0" => Some(PaymentStatus::Unpaid),
            "1" => Some(PaymentStatus::Paid),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Unpaid => write!(f, "unpaid"),
            PaymentStatus::Paid => write!(f, "paid"),
        }
    }
}

/// One vehicle visit, from entry to (paid) exit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitRecord {
    /// Validated plate, e.g. "RAB123C"
    pub plate: String,
    pub entry_time: NaiveDateTime,
    /// Absent while the vehicle is still inside
    pub exit_time: Option<NaiveDateTime>,
    pub payment_status: PaymentStatus,
    pub payment_time: Option<NaiveDateTime>,
    pub amount_paid: Option<Decimal>,
}

impl VisitRecord {
    /// A fresh, unpaid, open visit
    pub fn new(plate: impl Into<String>, entry_time: NaiveDateTime) -> Self {
        Self {
            plate: plate.into(),
            entry_time,
            exit_time: None,
            payment_status: PaymentStatus::Unpaid,
            payment_time: None,
            amount_paid: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.exit_time.is_none()
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }

    /// Stamp the exit time. Returns false and leaves the record untouched
    /// when it was already closed.
    pub fn close_at(&mut self, exit_time: NaiveDateTime) -> bool {
        if self.exit_time.is_some() {
            return false;
        }
        self.exit_time = Some(exit_time);
        true
    }

    /// Record a payment. Returns false when the visit is already paid.
    pub fn mark_paid(&mut self, amount: Decimal, paid_at: NaiveDateTime) -> bool {
        if self.is_paid() {
            return false;
        }
        self.payment_status = PaymentStatus::Paid;
        self.payment_time = Some(paid_at);
        self.amount_paid = Some(amount);
        true
    }

    /// Time spent inside, once the visit is closed
    pub fn stay_duration(&self) -> Option<Duration> {
        self.exit_time.map(|exit| exit - self.entry_time)
    }
}
