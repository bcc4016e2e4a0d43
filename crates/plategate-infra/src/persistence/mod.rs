//! Persistence implementations
//!
//! This module provides the file-based implementation of the ledger trait.

mod csv_visit_ledger;
mod ledger_lock;
mod ledger_row;

pub use csv_visit_ledger::{CsvVisitLedger, LedgerOptions};
pub use ledger_row::{LedgerRow, LEDGER_HEADER};
