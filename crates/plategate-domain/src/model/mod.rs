//! Domain model types

pub mod plate;
pub mod visit;

pub use plate::PlateCandidate;
pub use visit::{PaymentStatus, VisitRecord, TIMESTAMP_FORMAT};
