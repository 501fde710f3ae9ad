//! Batch execution over the device list.
//!
//! Iterates the parsed device list strictly sequentially, establishes a
//! session per device through an injected connector, and runs either the
//! backup workflow or a broadcast command. Every device's outcome is
//! recorded independently: a failure (including a failed connection) is
//! caught at this boundary and never prevents later devices from being
//! attempted.

use std::fmt;
use std::time::Instant;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::backup::{backup_device, BackupOutcome};
use crate::config::{DeviceEntry, RunContext};
use crate::error::{BackupError, Result};
use crate::session::BoxedSession;

/// What a run did with each device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Backup,
    Exec,
}

/// Final status of one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Ok,
    Error,
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Outcome of one device in the run.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceResult {
    /// Device address from the list.
    pub address: String,
    /// Device identity name, when it could be resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub status: DeviceStatus,
    /// Backup outcome for successful backup runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<BackupOutcome>,
    /// Captured command output for broadcast runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Error message for failed devices.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeviceResult {
    fn ok_backup(address: &str, name: Option<String>, outcome: BackupOutcome) -> Self {
        Self {
            address: address.to_string(),
            name,
            status: DeviceStatus::Ok,
            outcome: Some(outcome),
            output: None,
            error: None,
        }
    }

    fn ok_exec(address: &str, output: String) -> Self {
        Self {
            address: address.to_string(),
            name: None,
            status: DeviceStatus::Ok,
            outcome: None,
            output: Some(output),
            error: None,
        }
    }

    fn failed(address: &str, error: &BackupError) -> Self {
        Self {
            address: address.to_string(),
            name: None,
            status: DeviceStatus::Error,
            outcome: None,
            output: None,
            error: Some(error.to_string()),
        }
    }
}

/// Run result map: one entry per device, in device-list order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub mode: RunMode,
    pub results: Vec<DeviceResult>,
    pub ok_count: usize,
    pub error_count: usize,
    pub elapsed_ms: u64,
}

impl RunReport {
    #[must_use]
    pub fn new(mode: RunMode) -> Self {
        Self {
            mode,
            results: Vec::new(),
            ok_count: 0,
            error_count: 0,
            elapsed_ms: 0,
        }
    }

    fn push(&mut self, result: DeviceResult) {
        match result.status {
            DeviceStatus::Ok => self.ok_count += 1,
            DeviceStatus::Error => self.error_count += 1,
        }
        self.results.push(result);
    }

    /// Returns true if every device succeeded.
    #[must_use]
    pub fn all_ok(&self) -> bool {
        self.error_count == 0
    }

    /// Ordered `address = OK|ERROR` summary lines.
    #[must_use]
    pub fn summary_lines(&self) -> Vec<String> {
        self.results
            .iter()
            .map(|r| format!("{} = {}", r.address, r.status))
            .collect()
    }
}

/// Run the backup workflow over every device in the list.
///
/// The connector is injected so tests can supply mock sessions; production
/// passes [`crate::session::connect_boxed`]. The session is dropped, and
/// with it the connection closed, before the next device is attempted,
/// on success and failure alike.
pub fn run_backups<C>(entries: &[DeviceEntry], ctx: &RunContext, mut connector: C) -> RunReport
where
    C: FnMut(&DeviceEntry) -> Result<BoxedSession>,
{
    let start = Instant::now();
    let mut report = RunReport::new(RunMode::Backup);

    for entry in entries {
        info!(address = %entry.address, "working with device");

        let outcome = connector(entry).and_then(|session| {
            // Identity resolution is display-only; failure is not a device failure.
            let name = session.identity().ok().filter(|n| !n.is_empty());
            backup_device(session.as_ref(), ctx).map(|o| (name, o))
        });

        match outcome {
            Ok((name, outcome)) => {
                info!(address = %entry.address, archived = outcome.archived(), "device done");
                report.push(DeviceResult::ok_backup(&entry.address, name, outcome));
            }
            Err(e) => {
                record_failure(&mut report, entry, &e);
            }
        }
    }

    report.elapsed_ms = elapsed_ms(start);
    report
}

/// Execute one command on every device in the list, capturing output.
pub fn run_broadcast<C>(
    entries: &[DeviceEntry],
    command: &str,
    mut connector: C,
) -> RunReport
where
    C: FnMut(&DeviceEntry) -> Result<BoxedSession>,
{
    let start = Instant::now();
    let mut report = RunReport::new(RunMode::Exec);

    for entry in entries {
        info!(address = %entry.address, command = %command, "executing on device");

        match connector(entry).and_then(|session| session.execute(command)) {
            Ok(output) => report.push(DeviceResult::ok_exec(&entry.address, output)),
            Err(e) => record_failure(&mut report, entry, &e),
        }
    }

    report.elapsed_ms = elapsed_ms(start);
    report
}

fn record_failure(report: &mut RunReport, entry: &DeviceEntry, e: &BackupError) {
    if e.is_device_scoped() {
        warn!(address = %entry.address, error = %e, "device failed, continuing");
    } else {
        error!(address = %entry.address, error = %e, "device failed unexpectedly, continuing");
    }
    report.push(DeviceResult::failed(&entry.address, e));
}

#[allow(clippy::cast_possible_truncation)] // Run durations are far below u64::MAX ms
fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
