//! Camera capture + plate detection + OCR through an external command
//!
//! The command grabs the current frame, runs the detector and OCR, and
//! prints JSON: either a list of candidates or `{"plates": [...]}`, each
//! `{"text": "...", "bbox": [x1, y1, x2, y2]}`. A non-zero exit status means
//! the camera could not be read.

use std::process::Command;

use serde::Deserialize;
use tracing::{debug, warn};

use plategate_domain::model::PlateCandidate;
use plategate_domain::port::PlateDetector;
use plategate_types::{ConfigError, Error};

use super::split_command;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DetectorOutput {
    List(Vec<PlateCandidate>),
    Wrapped { plates: Vec<PlateCandidate> },
}

#[derive(Debug, Clone)]
pub struct CommandDetector {
    program: String,
    args: Vec<String>,
}

impl CommandDetector {
    pub fn from_command_line(command_line: &str) -> Result<Self, ConfigError> {
        let (program, args) = split_command(command_line, "detector.command")?;
        Ok(Self { program, args })
    }
}

impl PlateDetector for CommandDetector {
    fn detect(&mut self) -> Result<Vec<PlateCandidate>, Error> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|e| Error::Capture(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Capture(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_detector_output(&stdout))
    }
}

/// Parse detector stdout. Anything unreadable counts as "no plate in this
/// frame" and is only logged.
pub fn parse_detector_output(stdout: &str) -> Vec<PlateCandidate> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let json = extract_json(trimmed);
    match serde_json::from_str::<DetectorOutput>(json) {
        Ok(DetectorOutput::List(plates)) | Ok(DetectorOutput::Wrapped { plates }) => {
            debug!(count = plates.len(), "detector candidates");
            plates
        }
        Err(e) => {
            warn!(error = %e, output = json, "detector output is not valid JSON");
            Vec::new()
        }
    }
}

/// Cut the JSON payload out of output that may carry log lines around it
fn extract_json(text: &str) -> &str {
    let start = text.find(|c| c == '[' || c == '{');
    let end = text.rfind(|c| c == ']' || c == '}');
    match (start, end) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        let plates = parse_detector_output(r#"[{"text": "RAB123C", "bbox": [1, 2, 3, 4]}]"#);
        assert_eq!(plates.len(), 1);
        assert_eq!(plates[0].text, "RAB123C");
        assert_eq!(plates[0].bbox, Some(vec![1, 2, 3, 4]));
    }

    #[test]
    fn test_parse_wrapped_without_bbox() {
        let plates = parse_detector_output(r#"{"plates": [{"text": "RAB"}, {"text": "x"}]}"#);
        assert_eq!(plates.len(), 2);
        assert_eq!(plates[0].bbox, None);
    }

    #[test]
    fn test_parse_with_log_noise() {
        let out = "loading model...\n[{\"text\": \"RAC456D\"}]\ndone in 42ms";
        let plates = parse_detector_output(out);
        assert_eq!(plates, vec![PlateCandidate::new("RAC456D")]);
    }

    #[test]
    fn test_parse_garbage_is_empty() {
        assert!(parse_detector_output("").is_empty());
        assert!(parse_detector_output("segfault").is_empty());
        assert!(parse_detector_output("{not json}").is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_capture_is_fatal_error() {
        let mut detector = CommandDetector::from_command_line("false").unwrap();
        assert!(matches!(detector.detect(), Err(Error::Capture(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_detector_reads_stdout() {
        let mut detector =
            CommandDetector::from_command_line(r#"echo '[{"text": "RAB123C"}]'"#).unwrap();
        assert_eq!(detector.detect().unwrap(), vec![PlateCandidate::new("RAB123C")]);
    }
}
