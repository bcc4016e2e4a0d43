//! Gate actuation shared by both controllers

use std::time::Duration;

use tracing::{info, warn};

use plategate_domain::port::{Clock, GateActuator};
use plategate_types::GateCommand;

/// Send one command. A write failure is logged and reported as `false`;
/// it never ends the station.
pub fn actuate<G: GateActuator + ?Sized>(gate: &mut G, command: GateCommand) -> bool {
    match gate.send(command) {
        Ok(()) => true,
        Err(e) => {
            warn!(device = %gate.describe(), ?command, error = %e, "gate command failed");
            false
        }
    }
}

/// Open, hold for `dwell`, close. The close is sent even if the open failed.
pub fn cycle_gate<G, C>(gate: &mut G, clock: &C, dwell: Duration) -> bool
where
    G: GateActuator + ?Sized,
    C: Clock + ?Sized,
{
    let opened = actuate(gate, GateCommand::Open);
    info!(dwell_secs = dwell.as_secs(), "gate open, waiting for vehicle to pass");
    clock.sleep(dwell);
    let closed = actuate(gate, GateCommand::Close);
    opened && closed
}
