//! Entry controller against a real ledger file: cooldown dedup, double
//! entry policies, gate failures.

mod common;

use std::time::Duration;

use tempfile::{tempdir, TempDir};

use plategate_app::station::{DoubleEntryPolicy, EntryController, EntryOutcome, EntrySettings};
use plategate_domain::repository::VisitLedger;
use plategate_infra::persistence::CsvVisitLedger;
use plategate_types::GateCommand;

use common::{t0, ManualClock, RecordingGate};

struct Fixture {
    _dir: TempDir,
    ledger: CsvVisitLedger,
    gate: RecordingGate,
    clock: ManualClock,
    controller: EntryController<CsvVisitLedger, RecordingGate, ManualClock>,
}

fn fixture(policy: DoubleEntryPolicy) -> Fixture {
    let dir = tempdir().unwrap();
    let ledger = CsvVisitLedger::open(dir.path().join("plates_log.csv")).unwrap();
    let gate = RecordingGate::new();
    let clock = ManualClock::at(t0());
    let settings = EntrySettings {
        dwell: Duration::ZERO,
        double_entry: policy,
        ..EntrySettings::default()
    };
    let controller = EntryController::new(ledger.clone(), gate.clone(), clock.clone(), settings);
    Fixture {
        _dir: dir,
        ledger,
        gate,
        clock,
        controller,
    }
}

#[test]
fn test_cooldown_skips_then_commits_after_window() {
    let mut f = fixture(DoubleEntryPolicy::AutoClose);

    let first = f.controller.handle_decision("RAA123A").unwrap();
    assert!(matches!(first, EntryOutcome::Committed { superseded: None, .. }));
    assert_eq!(f.gate.commands(), vec![GateCommand::Open, GateCommand::Close]);

    // t0 + 100s: same car still at the barrier
    f.gate.clear();
    f.clock.set(t0() + chrono::Duration::seconds(100));
    let second = f.controller.handle_decision("RAA123A").unwrap();
    assert_eq!(second, EntryOutcome::Skipped { last_commit: t0() });
    assert!(f.gate.commands().is_empty());
    assert_eq!(f.ledger.find_all().unwrap().len(), 1);

    // t0 + 400s: outside the window, a new arrival
    f.clock.set(t0() + chrono::Duration::seconds(400));
    let third = f.controller.handle_decision("RAA123A").unwrap();
    match third {
        EntryOutcome::Committed { visit, superseded } => {
            assert_eq!(visit.entry_time, t0() + chrono::Duration::seconds(400));
            let stale = superseded.expect("first visit was still open");
            assert_eq!(stale.entry_time, t0());
            assert_eq!(stale.exit_time, Some(t0() + chrono::Duration::seconds(400)));
        }
        other => panic!("expected commit, got {other:?}"),
    }
    assert_eq!(f.gate.commands(), vec![GateCommand::Open, GateCommand::Close]);

    let all = f.ledger.find_all().unwrap();
    assert_eq!(all.len(), 2);
    assert!(!all[0].is_open());
    assert!(all[1].is_open());
    // one open visit per plate
    assert_eq!(all.iter().filter(|r| r.is_open()).count(), 1);
}

#[test]
fn test_cooldown_boundary_is_inclusive() {
    let mut f = fixture(DoubleEntryPolicy::AutoClose);
    f.controller.handle_decision("RAA123A").unwrap();

    f.clock.set(t0() + chrono::Duration::seconds(300));
    assert!(matches!(
        f.controller.handle_decision("RAA123A").unwrap(),
        EntryOutcome::Skipped { .. }
    ));

    f.clock.set(t0() + chrono::Duration::seconds(301));
    assert!(matches!(
        f.controller.handle_decision("RAA123A").unwrap(),
        EntryOutcome::Committed { .. }
    ));
}

#[test]
fn test_different_plate_is_not_deduplicated() {
    let mut f = fixture(DoubleEntryPolicy::AutoClose);
    f.controller.handle_decision("RAA123A").unwrap();

    f.clock.advance_secs(5);
    assert!(matches!(
        f.controller.handle_decision("RAB456B").unwrap(),
        EntryOutcome::Committed { .. }
    ));

    // only the last commit counts: the first plate is new again
    f.clock.advance_secs(5);
    assert!(matches!(
        f.controller.handle_decision("RAA123A").unwrap(),
        EntryOutcome::Committed { .. }
    ));
    assert_eq!(f.ledger.find_all().unwrap().len(), 3);
}

#[test]
fn test_reject_policy_keeps_gate_shut() {
    let mut f = fixture(DoubleEntryPolicy::Reject);
    f.ledger.append("RAA123A", t0()).unwrap();

    f.clock.advance_secs(1000);
    let outcome = f.controller.handle_decision("RAA123A").unwrap();
    match outcome {
        EntryOutcome::Rejected { open_visit } => assert_eq!(open_visit.entry_time, t0()),
        other => panic!("expected rejection, got {other:?}"),
    }
    assert!(f.gate.commands().is_empty());

    let all = f.ledger.find_all().unwrap();
    assert_eq!(all.len(), 1);
    assert!(all[0].is_open());
}

#[test]
fn test_gate_failure_does_not_roll_back_commit() {
    let mut f = fixture(DoubleEntryPolicy::AutoClose);
    f.gate.set_failing(true);

    assert!(matches!(
        f.controller.handle_decision("RAA123A").unwrap(),
        EntryOutcome::Committed { .. }
    ));
    assert!(f.ledger.find_open("RAA123A").unwrap().is_some());

    // cooldown state survived the actuator failure
    f.gate.set_failing(false);
    f.clock.advance_secs(10);
    assert!(matches!(
        f.controller.handle_decision("RAA123A").unwrap(),
        EntryOutcome::Skipped { .. }
    ));
    assert!(f.gate.commands().is_empty());
}

#[test]
fn test_dwell_is_spent_on_the_clock() {
    let dir = tempdir().unwrap();
    let ledger = CsvVisitLedger::open(dir.path().join("plates_log.csv")).unwrap();
    let clock = ManualClock::at(t0());
    let mut controller = EntryController::new(
        ledger,
        RecordingGate::new(),
        clock.clone(),
        EntrySettings::default(),
    );

    controller.handle_decision("RAA123A").unwrap();
    assert_eq!(clock_now(&clock), t0() + chrono::Duration::seconds(15));
}

fn clock_now(clock: &ManualClock) -> chrono::NaiveDateTime {
    use plategate_domain::port::Clock;
    clock.now()
}

#[test]
fn test_missing_ledger_is_fatal_after_retry() {
    let mut f = fixture(DoubleEntryPolicy::AutoClose);
    std::fs::remove_file(f.ledger.path()).unwrap();

    let err = f.controller.handle_decision("RAA123A").unwrap_err();
    assert!(err.to_string().contains("not found"), "{err}");
    assert!(f.gate.commands().is_empty());
}
