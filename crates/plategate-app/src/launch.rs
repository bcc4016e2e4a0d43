//! Wire configured hardware, ledger and controllers into runnable stations

use tracing::{info, warn};

use plategate_domain::port::{DistanceSensor, GateActuator, PlateDetector};
use plategate_domain::service::{FrameReadingStabilizer, PlateValidator};
use plategate_infra::hardware::{connect_gate, AbsentSensor, CommandDetector, CommandSensor};
use plategate_infra::persistence::CsvVisitLedger;
use plategate_infra::SystemClock;
use plategate_types::{ConfigError, Result, StationKind};

use crate::config::Config;
use crate::repository::open_ledger;
use crate::station::{
    EntryController, EntrySettings, ExitController, ExitSettings, Station, StationSettings,
};

pub type DynSensor = Box<dyn DistanceSensor + Send>;
pub type DynDetector = Box<dyn PlateDetector + Send>;
pub type DynGate = Box<dyn GateActuator + Send>;

pub type EntryStation =
    Station<DynSensor, DynDetector, EntryController<CsvVisitLedger, DynGate, SystemClock>, SystemClock>;
pub type ExitStation =
    Station<DynSensor, DynDetector, ExitController<CsvVisitLedger, DynGate, SystemClock>, SystemClock>;

/// The configured sensor command, or camera-only mode when none is set
pub fn build_sensor(config: &Config) -> Result<DynSensor> {
    match config.sensor.command.as_deref() {
        Some(command) => {
            info!(command, "using proximity sensor");
            Ok(Box::new(CommandSensor::from_command_line(command)?))
        }
        None => {
            warn!("no sensor configured, running camera-only");
            Ok(Box::new(AbsentSensor))
        }
    }
}

pub fn build_detector(config: &Config) -> Result<DynDetector> {
    let command = config
        .detector
        .command
        .as_deref()
        .ok_or(ConfigError::Missing("detector.command"))?;
    Ok(Box::new(CommandDetector::from_command_line(command)?))
}

pub fn entry_settings(config: &Config) -> EntrySettings {
    EntrySettings {
        cooldown: config.entry_cooldown(),
        dwell: config.dwell(),
        double_entry: config.entry.double_entry,
    }
}

pub fn exit_settings(config: &Config) -> ExitSettings {
    ExitSettings {
        dwell: config.dwell(),
        alarm_cooldown: config.alarm_cooldown(),
    }
}

fn station_settings(config: &Config) -> StationSettings {
    StationSettings {
        presence_threshold_cm: config.sensor.presence_threshold_cm,
        poll_interval: config.poll_interval(),
    }
}

/// Everything a station needs before the gate is connected. The gate comes
/// last so a bad config never holds the port open.
struct Parts {
    ledger: CsvVisitLedger,
    sensor: DynSensor,
    detector: DynDetector,
}

fn prepare(config: &Config) -> Result<Parts> {
    config.validate()?;
    let ledger = open_ledger(config)?;
    info!(ledger = %ledger.path().display(), "ledger ready");
    Ok(Parts {
        ledger,
        sensor: build_sensor(config)?,
        detector: build_detector(config)?,
    })
}

fn finish<H>(
    kind: StationKind,
    config: &Config,
    sensor: DynSensor,
    detector: DynDetector,
    handler: H,
) -> Station<DynSensor, DynDetector, H, SystemClock>
where
    H: crate::station::DecisionHandler,
{
    Station::new(kind, sensor, detector, handler, SystemClock)
        .with_validator(PlateValidator::new(config.validator.marker.trim()))
        .with_stabilizer(FrameReadingStabilizer::new(config.stabilizer.threshold))
        .with_settings(station_settings(config))
}

pub fn build_entry_station(config: &Config) -> Result<EntryStation> {
    let parts = prepare(config)?;
    let gate = connect_gate(&config.gate_discovery());
    let controller = EntryController::new(parts.ledger, gate, SystemClock, entry_settings(config));
    Ok(finish(
        StationKind::Entry,
        config,
        parts.sensor,
        parts.detector,
        controller,
    ))
}

pub fn build_exit_station(config: &Config) -> Result<ExitStation> {
    let parts = prepare(config)?;
    let gate = connect_gate(&config.gate_discovery());
    let controller = ExitController::new(parts.ledger, gate, SystemClock, exit_settings(config));
    Ok(finish(
        StationKind::Exit,
        config,
        parts.sensor,
        parts.detector,
        controller,
    ))
}
