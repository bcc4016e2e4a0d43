//! Port traits: the boundary between station logic and the hardware
//! collaborators (sensor, camera + detector, gate board) and time.
//!
//! Adapters in `plategate-infra` implement these; tests substitute scripted
//! versions so the controllers never touch real devices.

use std::time::Duration;

use chrono::NaiveDateTime;

use crate::model::PlateCandidate;
use plategate_types::{Error, GateCommand, HardwareError};

/// Proximity sensor in front of the barrier
pub trait DistanceSensor {
    /// Current distance to the nearest object, in centimetres
    fn read_distance_cm(&mut self) -> Result<f32, HardwareError>;
}

/// Camera plus plate detector and OCR
pub trait PlateDetector {
    /// Capture the current frame and return every plate-like text found in
    /// it. An empty list is a normal outcome. A capture failure is returned
    /// as [`Error::Capture`] and ends the station loop.
    fn detect(&mut self) -> Result<Vec<PlateCandidate>, Error>;
}

/// Gate controller board
pub trait GateActuator {
    fn send(&mut self, command: GateCommand) -> Result<(), HardwareError>;

    /// Human-readable name of the connected device
    fn describe(&self) -> String;
}

/// Wall clock and sleeping, so dwell and cooldown logic can be driven in tests
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
    fn sleep(&self, duration: Duration);
}

impl<T: DistanceSensor + ?Sized> DistanceSensor for Box<T> {
    fn read_distance_cm(&mut self) -> Result<f32, HardwareError> {
        (**self).read_distance_cm()
    }
}

impl<T: PlateDetector + ?Sized> PlateDetector for Box<T> {
    fn detect(&mut self) -> Result<Vec<PlateCandidate>, Error> {
        (**self).detect()
    }
}

impl<T: GateActuator + ?Sized> GateActuator for Box<T> {
    fn send(&mut self, command: GateCommand) -> Result<(), HardwareError> {
        (**self).send(command)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}
