//! Repository trait definitions for the visit ledger

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::model::VisitRecord;
use plategate_types::Error;

/// Durable store of visits shared by the entry and exit stations.
///
/// Implementations must make every mutation all-or-nothing and must not lose
/// updates committed concurrently by another station process.
pub trait VisitLedger {
    /// Create an unpaid, open visit. Callers check `find_open` first; the
    /// ledger itself does not enforce one open visit per plate.
    fn append(&self, plate: &str, entry_time: NaiveDateTime) -> Result<VisitRecord, Error>;

    /// The open visit of a plate, paid or not
    fn find_open(&self, plate: &str) -> Result<Option<VisitRecord>, Error>;

    /// The open visit of a plate that has been paid
    fn find_open_paid(&self, plate: &str) -> Result<Option<VisitRecord>, Error>;

    /// Stamp `exit_time` on every open visit of the plate. Returns how many
    /// visits were closed.
    fn close(&self, plate: &str, exit_time: NaiveDateTime) -> Result<usize, Error>;

    /// Mark the open visit of a plate as paid. Returns the updated visit, or
    /// `None` when there is no open unpaid visit for the plate.
    fn record_payment(
        &self,
        plate: &str,
        amount: Decimal,
        paid_at: NaiveDateTime,
    ) -> Result<Option<VisitRecord>, Error>;

    /// Every visit, in ledger order
    fn find_all(&self) -> Result<Vec<VisitRecord>, Error>;
}

impl<T: VisitLedger + ?Sized> VisitLedger for &T {
    fn append(&self, plate: &str, entry_time: NaiveDateTime) -> Result<VisitRecord, Error> {
        (**self).append(plate, entry_time)
    }

    fn find_open(&self, plate: &str) -> Result<Option<VisitRecord>, Error> {
        (**self).find_open(plate)
    }

    fn find_open_paid(&self, plate: &str) -> Result<Option<VisitRecord>, Error> {
        (**self).find_open_paid(plate)
    }

    fn close(&self, plate: &str, exit_time: NaiveDateTime) -> Result<usize, Error> {
        (**self).close(plate, exit_time)
    }

    fn record_payment(
        &self,
        plate: &str,
        amount: Decimal,
        paid_at: NaiveDateTime,
    ) -> Result<Option<VisitRecord>, Error> {
        (**self).record_payment(plate, amount, paid_at)
    }

    fn find_all(&self) -> Result<Vec<VisitRecord>, Error> {
        (**self).find_all()
    }
}
