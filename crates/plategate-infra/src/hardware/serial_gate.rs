//! Gate controller board over a serial device node
//!
//! The board understands single bytes: `1` open, `0` close, `2` alarm. The
//! port is opened as a plain device file; line settings (9600 8N1) are left
//! to the board's udev rule / `stty` profile.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use plategate_domain::port::GateActuator;
use plategate_types::{GateCommand, HardwareError};

/// Device name fragments of the USB serial adapters the boards ship with
pub const DEFAULT_DEVICE_PATTERNS: [&str; 4] = ["ttyUSB", "ttyACM", "wchusbmodem", "COM"];

/// Where and how to look for the gate board
#[derive(Debug, Clone)]
pub struct GateDiscovery {
    /// Explicit device; skips scanning when set
    pub device: Option<PathBuf>,
    pub scan_dir: PathBuf,
    pub patterns: Vec<String>,
    /// Wait after opening; the board resets when the port opens
    pub settle: Duration,
}

impl Default for GateDiscovery {
    fn default() -> Self {
        Self {
            device: None,
            scan_dir: PathBuf::from("/dev"),
            patterns: DEFAULT_DEVICE_PATTERNS.iter().map(|p| p.to_string()).collect(),
            settle: Duration::from_secs(2),
        }
    }
}

/// Connected gate board
#[derive(Debug)]
pub struct SerialGate {
    device: PathBuf,
    port: File,
}

impl SerialGate {
    pub fn open(device: &Path) -> io::Result<Self> {
        let port = OpenOptions::new().read(true).write(true).open(device)?;
        Ok(Self {
            device: device.to_path_buf(),
            port,
        })
    }

    pub fn device(&self) -> &Path {
        &self.device
    }
}

impl GateActuator for SerialGate {
    fn send(&mut self, command: GateCommand) -> Result<(), HardwareError> {
        self.port
            .write_all(&[command.as_byte()])
            .and_then(|_| self.port.flush())
            .map_err(|source| HardwareError::GateWrite {
                device: self.device.display().to_string(),
                source,
            })?;
        info!(device = %self.device.display(), ?command, "[GATE] {}", command.label());
        Ok(())
    }

    fn describe(&self) -> String {
        self.device.display().to_string()
    }
}

impl Drop for SerialGate {
    fn drop(&mut self) {
        info!(device = %self.device.display(), "closing gate connection");
    }
}

/// Stand-in when no board is connected: decisions are still made and
/// logged, the barrier just is not driven.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopGate;

impl GateActuator for NoopGate {
    fn send(&mut self, command: GateCommand) -> Result<(), HardwareError> {
        info!(?command, "[GATE] not connected, skipped: {}", command.label());
        Ok(())
    }

    fn describe(&self) -> String {
        "not connected".to_string()
    }
}

/// Device nodes in `scan_dir` whose name contains one of `patterns`, sorted
pub fn candidate_ports(scan_dir: &Path, patterns: &[String]) -> io::Result<Vec<PathBuf>> {
    let mut ports: Vec<PathBuf> = fs::read_dir(scan_dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            patterns.iter().any(|p| name.contains(p.as_str()))
        })
        .map(|entry| entry.path())
        .collect();
    ports.sort();
    Ok(ports)
}

/// Find and open the gate board. First device that opens wins; `None` when
/// nothing answers, which callers treat as a valid degraded setup.
pub fn discover_gate(discovery: &GateDiscovery) -> Option<SerialGate> {
    let candidates = match &discovery.device {
        Some(device) => vec![device.clone()],
        None => candidate_ports(&discovery.scan_dir, &discovery.patterns).unwrap_or_else(|e| {
            warn!(dir = %discovery.scan_dir.display(), error = %e, "cannot scan for gate ports");
            Vec::new()
        }),
    };

    for device in candidates {
        match SerialGate::open(&device) {
            Ok(gate) => {
                if !discovery.settle.is_zero() {
                    thread::sleep(discovery.settle);
                }
                info!(device = %device.display(), "[CONNECTED] gate controller");
                return Some(gate);
            }
            Err(e) => debug!(device = %device.display(), error = %e, "port did not open"),
        }
    }

    warn!("[ERROR] gate controller not detected, running without gate control");
    None
}

/// Discover the board, falling back to [`NoopGate`]
pub fn connect_gate(discovery: &GateDiscovery) -> Box<dyn GateActuator + Send> {
    match discover_gate(discovery) {
        Some(gate) => Box::new(gate),
        None => Box::new(NoopGate),
    }
}
