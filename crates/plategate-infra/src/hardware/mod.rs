//! Hardware adapters
//!
//! The gate board is reached through a serial device node. The proximity
//! sensor and the camera/plate detector are external programs, run once per
//! poll and per frame respectively.

mod command_detector;
mod command_sensor;
mod serial_gate;

pub use command_detector::{parse_detector_output, CommandDetector};
pub use command_sensor::{AbsentSensor, CommandSensor};
pub use serial_gate::{
    candidate_ports, connect_gate, discover_gate, GateDiscovery, NoopGate, SerialGate,
    DEFAULT_DEVICE_PATTERNS,
};

use plategate_types::ConfigError;

/// Split a configured command line into program and arguments
pub(crate) fn split_command(
    command_line: &str,
    key: &'static str,
) -> Result<(String, Vec<String>), ConfigError> {
    let mut parts = shell_words::split(command_line).map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })?;
    if parts.is_empty() {
        return Err(ConfigError::Missing(key));
    }
    let program = parts.remove(0);
    Ok((program, parts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_command_with_quotes() {
        let (program, args) =
            split_command("python3 detect.py --weights 'models/best plate.pt'", "detector.command")
                .unwrap();
        assert_eq!(program, "python3");
        assert_eq!(args, vec!["detect.py", "--weights", "models/best plate.pt"]);
    }

    #[test]
    fn test_split_command_empty() {
        assert!(matches!(
            split_command("   ", "sensor.command"),
            Err(ConfigError::Missing("sensor.command"))
        ));
    }

    #[test]
    fn test_split_command_unbalanced_quote() {
        assert!(matches!(
            split_command("run 'oops", "sensor.command"),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
