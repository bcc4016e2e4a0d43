//! Scripted collaborators for driving stations without hardware

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};

use plategate_app::station::{DecisionHandler, StopSignal};
use plategate_domain::model::PlateCandidate;
use plategate_domain::port::{Clock, DistanceSensor, GateActuator, PlateDetector};
use plategate_types::{Error, GateCommand, HardwareError, Result};

pub fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

/// Clock that only moves when told to, or when something sleeps on it
#[derive(Debug, Clone)]
pub struct ManualClock(Rc<Cell<NaiveDateTime>>);

impl ManualClock {
    pub fn at(start: NaiveDateTime) -> Self {
        Self(Rc::new(Cell::new(start)))
    }

    pub fn set(&self, at: NaiveDateTime) {
        self.0.set(at);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.0.set(self.0.get() + chrono::Duration::seconds(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        self.0.get()
    }

    fn sleep(&self, duration: Duration) {
        let step = chrono::Duration::from_std(duration).unwrap();
        self.0.set(self.0.get() + step);
    }
}

/// Gate that records every command it is sent
#[derive(Debug, Clone, Default)]
pub struct RecordingGate {
    commands: Rc<RefCell<Vec<GateCommand>>>,
    failing: Rc<Cell<bool>>,
}

impl RecordingGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<GateCommand> {
        self.commands.borrow().clone()
    }

    pub fn clear(&self) {
        self.commands.borrow_mut().clear();
    }

    /// Make every following write fail, as an unplugged board would
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }
}

impl GateActuator for RecordingGate {
    fn send(&mut self, command: GateCommand) -> std::result::Result<(), HardwareError> {
        if self.failing.get() {
            return Err(HardwareError::GateWrite {
                device: "test-gate".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "unplugged"),
            });
        }
        self.commands.borrow_mut().push(command);
        Ok(())
    }

    fn describe(&self) -> String {
        "test-gate".to_string()
    }
}

/// Plays back distances; raises the stop signal once the script runs out
pub struct ScriptedSensor {
    script: VecDeque<std::result::Result<f32, HardwareError>>,
    stop: StopSignal,
}

impl ScriptedSensor {
    pub fn new(
        script: impl IntoIterator<Item = std::result::Result<f32, HardwareError>>,
        stop: StopSignal,
    ) -> Self {
        Self {
            script: script.into_iter().collect(),
            stop,
        }
    }

    /// `n` readings of a vehicle right at the barrier
    pub fn present(n: usize, stop: StopSignal) -> Self {
        Self::new((0..n).map(|_| Ok(20.0)), stop)
    }
}

impl DistanceSensor for ScriptedSensor {
    fn read_distance_cm(&mut self) -> std::result::Result<f32, HardwareError> {
        match self.script.pop_front() {
            Some(reading) => {
                if self.script.is_empty() {
                    self.stop.stop();
                }
                reading
            }
            None => {
                self.stop.stop();
                Ok(f32::MAX)
            }
        }
    }
}

/// Plays back frames; empty frames once the script runs out
#[derive(Default)]
pub struct ScriptedDetector {
    frames: VecDeque<Result<Vec<PlateCandidate>>>,
    pub calls: usize,
}

impl ScriptedDetector {
    pub fn new(frames: impl IntoIterator<Item = Result<Vec<PlateCandidate>>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            calls: 0,
        }
    }

    /// One frame per text, each holding a single candidate
    pub fn reading(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(vec![PlateCandidate::new(*t)])))
    }
}

impl PlateDetector for ScriptedDetector {
    fn detect(&mut self) -> Result<Vec<PlateCandidate>> {
        self.calls += 1;
        self.frames.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Handler that just remembers the decisions it got
#[derive(Debug, Clone, Default)]
pub struct RecordingHandler {
    pub decisions: Rc<RefCell<Vec<String>>>,
    pub fail_with: Option<String>,
}

impl DecisionHandler for RecordingHandler {
    fn on_decision(&mut self, plate: &str) -> Result<()> {
        self.decisions.borrow_mut().push(plate.to_string());
        match &self.fail_with {
            Some(reason) => Err(Error::Capture(reason.clone())),
            None => Ok(()),
        }
    }
}
