//! Proximity sensor read through an external command

use std::process::Command;

use tracing::debug;

use plategate_domain::port::DistanceSensor;
use plategate_types::{ConfigError, HardwareError};

use super::split_command;

/// Runs the configured command once per poll; stdout is the distance in cm.
#[derive(Debug, Clone)]
pub struct CommandSensor {
    program: String,
    args: Vec<String>,
}

impl CommandSensor {
    pub fn from_command_line(command_line: &str) -> Result<Self, ConfigError> {
        let (program, args) = split_command(command_line, "sensor.command")?;
        Ok(Self { program, args })
    }
}

impl DistanceSensor for CommandSensor {
    fn read_distance_cm(&mut self) -> Result<f32, HardwareError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|e| HardwareError::Sensor(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HardwareError::Sensor(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_distance(&stdout)
    }
}

/// Stand-in when no sensor is wired: a vehicle is always reported present,
/// so the camera alone drives recognition.
#[derive(Debug, Default, Clone, Copy)]
pub struct AbsentSensor;

impl DistanceSensor for AbsentSensor {
    fn read_distance_cm(&mut self) -> Result<f32, HardwareError> {
        Ok(0.0)
    }
}

fn parse_distance(stdout: &str) -> Result<f32, HardwareError> {
    let value = stdout.trim();
    let distance: f32 = value
        .parse()
        .map_err(|_| HardwareError::Sensor(format!("unreadable distance '{}'", value)))?;
    if !distance.is_finite() || distance < 0.0 {
        return Err(HardwareError::Sensor(format!("distance out of range: {}", distance)));
    }
    debug!(distance, "sensor reading");
    Ok(distance)
}
