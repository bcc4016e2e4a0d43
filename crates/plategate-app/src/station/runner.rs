//! The station control loop: sensor gates recognition, readings are
//! validated and stabilized, decisions go to the controller

use std::time::Duration;

use tracing::{debug, info, warn};

use plategate_domain::port::{Clock, DistanceSensor, PlateDetector};
use plategate_domain::service::{FrameReadingStabilizer, PlateValidator};
use plategate_types::{Result, StationKind};

use super::{DecisionHandler, StopSignal};

#[derive(Debug, Clone)]
pub struct StationSettings {
    /// Vehicle present when the sensor reads at or below this
    pub presence_threshold_cm: f32,
    pub poll_interval: Duration,
}

impl Default for StationSettings {
    fn default() -> Self {
        Self {
            presence_threshold_cm: 50.0,
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Counters reported when the loop stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StationStats {
    pub ticks: u64,
    pub sensor_faults: u64,
    pub frames: u64,
    pub readings: u64,
    pub decisions: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Sensor could not be read; try again next tick
    SensorFault,
    NoVehicle,
    /// A frame was processed
    Scanned { readings: usize, decisions: usize },
}

pub struct Station<S, D, H, C> {
    kind: StationKind,
    sensor: S,
    detector: D,
    handler: H,
    clock: C,
    validator: PlateValidator,
    stabilizer: FrameReadingStabilizer,
    settings: StationSettings,
    stats: StationStats,
}

impl<S, D, H, C> Station<S, D, H, C>
where
    S: DistanceSensor,
    D: PlateDetector,
    H: DecisionHandler,
    C: Clock,
{
    pub fn new(kind: StationKind, sensor: S, detector: D, handler: H, clock: C) -> Self {
        Self {
            kind,
            sensor,
            detector,
            handler,
            clock,
            validator: PlateValidator::default(),
            stabilizer: FrameReadingStabilizer::default(),
            settings: StationSettings::default(),
            stats: StationStats::default(),
        }
    }

    pub fn with_validator(mut self, validator: PlateValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_stabilizer(mut self, stabilizer: FrameReadingStabilizer) -> Self {
        self.stabilizer = stabilizer;
        self
    }

    pub fn with_settings(mut self, settings: StationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn kind(&self) -> StationKind {
        self.kind
    }

    pub fn stats(&self) -> StationStats {
        self.stats
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// One pass of the loop. Errors are fatal: capture failures and ledger
    /// failures that survived their retry.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        self.stats.ticks += 1;

        let distance = match self.sensor.read_distance_cm() {
            Ok(distance) => distance,
            Err(e) => {
                self.stats.sensor_faults += 1;
                warn!(station = %self.kind, error = %e, "sensor read failed");
                return Ok(TickOutcome::SensorFault);
            }
        };

        if distance > self.settings.presence_threshold_cm {
            return Ok(TickOutcome::NoVehicle);
        }
        debug!(station = %self.kind, distance, "[SENSOR] vehicle detected");

        let candidates = self.detector.detect()?;
        self.stats.frames += 1;

        let mut readings = 0;
        let mut decisions = 0;
        for candidate in candidates {
            let Some(plate) = self.validator.validate(&candidate.text) else {
                debug!(raw = %candidate.text, "reading rejected");
                continue;
            };
            readings += 1;
            self.stats.readings += 1;
            info!(station = %self.kind, plate = %plate, "[DETECTED] plate reading");

            if let Some(decision) = self.stabilizer.observe(plate) {
                decisions += 1;
                self.stats.decisions += 1;
                info!(station = %self.kind, plate = %decision, "[STABLE] plate decision");
                self.handler.on_decision(&decision)?;
            }
        }

        Ok(TickOutcome::Scanned {
            readings,
            decisions,
        })
    }

    /// Loop until `stop` is raised or a tick fails
    pub fn run(&mut self, stop: &StopSignal) -> Result<StationStats> {
        info!(
            station = %self.kind,
            marker = self.validator.marker(),
            threshold = self.stabilizer.threshold(),
            "[READY] station running"
        );

        let result = loop {
            if stop.is_stopped() {
                break Ok(());
            }
            if let Err(e) = self.tick() {
                break Err(e);
            }
            self.clock.sleep(self.settings.poll_interval);
        };

        match &result {
            Ok(()) => info!(station = %self.kind, stats = ?self.stats, "station stopped"),
            Err(e) => warn!(station = %self.kind, error = %e, stats = ?self.stats, "station stopped on error"),
        }
        result.map(|()| self.stats)
    }
}
