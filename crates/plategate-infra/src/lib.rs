//! Infrastructure layer: the CSV visit ledger and the adapters that talk to
//! the gate board, the proximity sensor and the plate detector.

pub mod clock;
pub mod hardware;
pub mod persistence;

pub use clock::SystemClock;
