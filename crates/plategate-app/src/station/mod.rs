//! Station controllers and the control loop that feeds them

mod entry;
mod exit;
mod gate;
mod runner;

pub use entry::{DoubleEntryPolicy, EntryController, EntryOutcome, EntrySettings};
pub use exit::{DenialReason, ExitController, ExitOutcome, ExitSettings};
pub use gate::{actuate, cycle_gate};
pub use runner::{Station, StationSettings, StationStats, TickOutcome};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::warn;

use plategate_types::Result;

/// Receives each stabilized plate decision
pub trait DecisionHandler {
    fn on_decision(&mut self, plate: &str) -> Result<()>;
}

impl<T: DecisionHandler + ?Sized> DecisionHandler for Box<T> {
    fn on_decision(&mut self, plate: &str) -> Result<()> {
        (**self).on_decision(plate)
    }
}

/// Shared stop flag; raised from the signal side, polled by the loop
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Run a ledger operation, retrying once after a failure. The second error
/// is returned as is.
pub(crate) fn retry_once<T>(what: &str, mut op: impl FnMut() -> Result<T>) -> Result<T> {
    match op() {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!(operation = what, error = %e, "ledger operation failed, retrying once");
            op()
        }
    }
}
