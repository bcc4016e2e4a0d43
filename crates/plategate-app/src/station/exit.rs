//! Exit station: release paid vehicles, alarm on everything else

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use chrono::NaiveDateTime;
use tracing::{info, warn};

use plategate_domain::model::VisitRecord;
use plategate_domain::port::{Clock, GateActuator};
use plategate_domain::repository::VisitLedger;
use plategate_types::{GateCommand, Result};

use super::gate::{actuate, cycle_gate};
use super::{retry_once, DecisionHandler};

#[derive(Debug, Clone)]
pub struct ExitSettings {
    pub dwell: Duration,
    /// Suppress repeated alarms for one plate within this window; zero
    /// alarms on every denial
    pub alarm_cooldown: chrono::Duration,
}

impl Default for ExitSettings {
    fn default() -> Self {
        Self {
            dwell: Duration::from_secs(15),
            alarm_cooldown: chrono::Duration::zero(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// No visit on record, or it was already closed
    NoOpenVisit,
    /// Inside but not paid
    Unpaid,
    /// The ledger could not be read to tell which
    Unverified,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::NoOpenVisit => write!(f, "no open visit"),
            DenialReason::Unpaid => write!(f, "payment pending"),
            DenialReason::Unverified => write!(f, "ledger unreadable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExitOutcome {
    Granted { visit: VisitRecord },
    Denied { reason: DenialReason, alarm_sent: bool },
}

pub struct ExitController<L, G, C> {
    ledger: L,
    gate: G,
    clock: C,
    settings: ExitSettings,
    last_alarm: HashMap<String, NaiveDateTime>,
}

impl<L, G, C> ExitController<L, G, C>
where
    L: VisitLedger,
    G: GateActuator,
    C: Clock,
{
    pub fn new(ledger: L, gate: G, clock: C, settings: ExitSettings) -> Self {
        Self {
            ledger,
            gate,
            clock,
            settings,
            last_alarm: HashMap::new(),
        }
    }

    pub fn handle_decision(&mut self, plate: &str) -> Result<ExitOutcome> {
        let now = self.clock.now();
        let ledger = &self.ledger;

        if let Some(paid) = retry_once("find_open_paid", || ledger.find_open_paid(plate))? {
            let closed = retry_once("close", || ledger.close(plate, now))?;
            if closed > 0 {
                let mut visit = paid;
                visit.close_at(now);
                info!(
                    plate,
                    entered = %visit.entry_time,
                    exit_time = %now,
                    "[ACCESS GRANTED] payment verified"
                );
                self.last_alarm.remove(plate);
                cycle_gate(&mut self.gate, &self.clock, self.settings.dwell);
                return Ok(ExitOutcome::Granted { visit });
            }
            // Closed by someone else between the lookup and the close
            warn!(plate, "visit was closed concurrently");
        }

        self.deny(plate, now)
    }

    fn deny(&mut self, plate: &str, now: NaiveDateTime) -> Result<ExitOutcome> {
        let alarm_sent = self.raise_alarm(plate, now);

        let ledger = &self.ledger;
        let reason = match retry_once("find_open", || ledger.find_open(plate)) {
            Ok(Some(_)) => DenialReason::Unpaid,
            Ok(None) => DenialReason::NoOpenVisit,
            Err(e) => {
                warn!(plate, error = %e, "cannot tell why access is denied");
                DenialReason::Unverified
            }
        };
        warn!(plate, %reason, alarm_sent, "[ACCESS DENIED]");

        Ok(ExitOutcome::Denied { reason, alarm_sent })
    }

    /// Sound the alarm unless this plate already triggered one inside the
    /// cooldown. Only alarms that reached the board open a window.
    fn raise_alarm(&mut self, plate: &str, now: NaiveDateTime) -> bool {
        let cooldown = self.settings.alarm_cooldown;
        if cooldown.is_zero() {
            return actuate(&mut self.gate, GateCommand::Alarm);
        }

        self.last_alarm.retain(|_, at| now - *at < cooldown);
        if self.last_alarm.contains_key(plate) {
            info!(plate, "alarm already raised for this vehicle, not repeating");
            return false;
        }

        let sent = actuate(&mut self.gate, GateCommand::Alarm);
        if sent {
            self.last_alarm.insert(plate.to_string(), now);
        }
        sent
    }

    pub fn settings(&self) -> &ExitSettings {
        &self.settings
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn gate(&self) -> &G {
        &self.gate
    }
}

impl<L, G, C> DecisionHandler for ExitController<L, G, C>
where
    L: VisitLedger,
    G: GateActuator,
    C: Clock,
{
    fn on_decision(&mut self, plate: &str) -> Result<()> {
        self.handle_decision(plate).map(|_| ())
    }
}
