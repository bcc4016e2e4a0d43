//! Entry station: log arrivals, suppress repeated sightings of one car

use std::fmt;
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use plategate_domain::model::VisitRecord;
use plategate_domain::port::{Clock, GateActuator};
use plategate_domain::repository::VisitLedger;
use plategate_types::Result;

use super::gate::cycle_gate;
use super::{retry_once, DecisionHandler};

/// What to do when a plate arrives while its previous visit is still open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoubleEntryPolicy {
    /// Close the stale visit at the new arrival time, then log the arrival
    #[default]
    AutoClose,
    /// Keep the gate shut and write nothing
    Reject,
}

impl fmt::Display for DoubleEntryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DoubleEntryPolicy::AutoClose => write!(f, "auto_close"),
            DoubleEntryPolicy::Reject => write!(f, "reject"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntrySettings {
    /// Same plate within this window is the same car still at the gate
    pub cooldown: chrono::Duration,
    pub dwell: Duration,
    pub double_entry: DoubleEntryPolicy,
}

impl Default for EntrySettings {
    fn default() -> Self {
        Self {
            cooldown: chrono::Duration::seconds(300),
            dwell: Duration::from_secs(15),
            double_entry: DoubleEntryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryOutcome {
    /// Arrival logged and gate cycled
    Committed {
        visit: VisitRecord,
        /// Open visit closed by the auto-close policy
        superseded: Option<VisitRecord>,
    },
    /// Within the cooldown of the last commit for this plate
    Skipped { last_commit: NaiveDateTime },
    /// Open visit exists and the policy is `Reject`
    Rejected { open_visit: VisitRecord },
}

pub struct EntryController<L, G, C> {
    ledger: L,
    gate: G,
    clock: C,
    settings: EntrySettings,
    last_commit: Option<(String, NaiveDateTime)>,
}

impl<L, G, C> EntryController<L, G, C>
where
    L: VisitLedger,
    G: GateActuator,
    C: Clock,
{
    pub fn new(ledger: L, gate: G, clock: C, settings: EntrySettings) -> Self {
        Self {
            ledger,
            gate,
            clock,
            settings,
            last_commit: None,
        }
    }

    pub fn handle_decision(&mut self, plate: &str) -> Result<EntryOutcome> {
        let now = self.clock.now();

        if let Some((last_plate, last_at)) = &self.last_commit {
            if last_plate == plate && now - *last_at <= self.settings.cooldown {
                info!(plate, last_commit = %last_at, "[SKIPPED] same vehicle within cooldown");
                return Ok(EntryOutcome::Skipped {
                    last_commit: *last_at,
                });
            }
        }

        let ledger = &self.ledger;
        let superseded = match retry_once("find_open", || ledger.find_open(plate))? {
            None => None,
            Some(open_visit) => match self.settings.double_entry {
                DoubleEntryPolicy::Reject => {
                    warn!(
                        plate,
                        entered = %open_visit.entry_time,
                        "[REJECTED] vehicle already inside, gate stays shut"
                    );
                    return Ok(EntryOutcome::Rejected { open_visit });
                }
                DoubleEntryPolicy::AutoClose => {
                    retry_once("close", || ledger.close(plate, now))?;
                    warn!(
                        plate,
                        entered = %open_visit.entry_time,
                        "closed visit that was never checked out"
                    );
                    let mut closed = open_visit;
                    closed.close_at(now);
                    Some(closed)
                }
            },
        };

        let visit = retry_once("append", || ledger.append(plate, now))?;
        self.last_commit = Some((plate.to_string(), now));
        info!(plate, entry_time = %visit.entry_time, "[ENTRY] vehicle logged");

        cycle_gate(&mut self.gate, &self.clock, self.settings.dwell);

        Ok(EntryOutcome::Committed { visit, superseded })
    }

    pub fn settings(&self) -> &EntrySettings {
        &self.settings
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn gate(&self) -> &G {
        &self.gate
    }
}

impl<L, G, C> DecisionHandler for EntryController<L, G, C>
where
    L: VisitLedger,
    G: GateActuator,
    C: Clock,
{
    fn on_decision(&mut self, plate: &str) -> Result<()> {
        self.handle_decision(plate).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_display_matches_config_names() {
        assert_eq!(DoubleEntryPolicy::AutoClose.to_string(), "auto_close");
        assert_eq!(DoubleEntryPolicy::Reject.to_string(), "reject");
        assert_eq!(DoubleEntryPolicy::default(), DoubleEntryPolicy::AutoClose);
    }

    #[test]
    fn test_default_settings() {
        let settings = EntrySettings::default();
        assert_eq!(settings.cooldown, chrono::Duration::seconds(300));
        assert_eq!(settings.dwell, Duration::from_secs(15));
    }
}
