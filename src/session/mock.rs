//! Mock session implementation for unit testing.
//!
//! This module provides a mock device session that records all operations,
//! simulates a remote filesystem, and supports error injection for testing
//! the backup workflow without reachable devices.
//!
//! # Example
//!
//! ```rust,ignore
//! use rosbackup::session::mock::{MockSession, Operation};
//! use rosbackup::session::SessionOps;
//!
//! let mock = MockSession::new("10.0.0.1").with_export("/ip address add\n");
//!
//! mock.export_config("current.rsc").unwrap();
//! mock.fetch_file("current.rsc", local_path).unwrap();
//!
//! mock.assert_contains(&Operation::ExportConfig {
//!     remote_name: "current.rsc".into(),
//! });
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::trace;

use super::{DeviceInfo, SessionOps};
use crate::error::{BackupError, Result};

/// Recorded operation for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Execute { command: String },
    ExportConfig { remote_name: String },
    SaveBinaryBackup { remote_name: String },
    FetchFile { remote: String, local: PathBuf },
}

/// Configuration for mock failure behavior.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Fail the export command.
    pub fail_export: bool,
    /// Fail the binary backup command.
    pub fail_backup: bool,
    /// Fail `execute` calls.
    pub fail_execute: bool,
    /// Remote names whose fetch should fail.
    pub failing_fetches: Vec<String>,
}

/// Mock session for testing without reachable devices.
///
/// Maintains a virtual remote filesystem: `export_config` writes the
/// scripted export content under the requested remote name, and
/// `save_binary_backup` writes an opaque binary payload, so a subsequent
/// `fetch_file` behaves like a real download.
pub struct MockSession {
    info: DeviceInfo,
    export_content: Mutex<String>,
    binary_content: Vec<u8>,
    exec_output: Mutex<String>,
    remote_files: Mutex<HashMap<String, Vec<u8>>>,
    operation_log: Mutex<Vec<Operation>>,
    config: MockConfig,
}

impl MockSession {
    /// Create a new mock session for the given address.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            info: DeviceInfo {
                address: address.into(),
                username: "admin".to_string(),
            },
            export_content: Mutex::new("# mock export\n/ip address add\n".to_string()),
            binary_content: b"\x00MOCKBAK\x01".to_vec(),
            exec_output: Mutex::new(String::new()),
            remote_files: Mutex::new(HashMap::new()),
            operation_log: Mutex::new(Vec::new()),
            config: MockConfig::default(),
        }
    }

    // === Configuration ===

    /// Configure mock failure behavior.
    #[must_use]
    pub fn with_config(mut self, config: MockConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the configuration export content the device will produce.
    #[must_use]
    pub fn with_export(self, content: impl Into<String>) -> Self {
        *self.export_content.lock().unwrap() = content.into();
        self
    }

    /// Set the output returned from `execute`.
    #[must_use]
    pub fn with_exec_output(self, output: impl Into<String>) -> Self {
        *self.exec_output.lock().unwrap() = output.into();
        self
    }

    /// Change the export content between runs, simulating an on-device
    /// configuration change (or the absence of one).
    pub fn set_export_content(&self, content: impl Into<String>) {
        *self.export_content.lock().unwrap() = content.into();
    }

    // === Assertions ===

    /// Get all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        self.operation_log.lock().unwrap().clone()
    }

    /// Get the number of operations performed.
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.operation_log.lock().unwrap().len()
    }

    /// Assert specific operations were performed, in order.
    ///
    /// # Panics
    ///
    /// Panics if the operations don't match.
    pub fn assert_operations(&self, expected: &[Operation]) {
        let actual = self.operations();
        assert_eq!(
            actual, expected,
            "Operation mismatch.\nExpected: {expected:#?}\nActual: {actual:#?}",
        );
    }

    /// Assert a specific operation was performed at least once.
    ///
    /// # Panics
    ///
    /// Panics if the operation was not found.
    pub fn assert_contains(&self, expected: &Operation) {
        let ops = self.operations();
        assert!(
            ops.contains(expected),
            "Expected operation {expected:?} not found in: {ops:#?}",
        );
    }

    /// Clear the operation log for fresh assertions.
    pub fn clear_operations(&self) {
        self.operation_log.lock().unwrap().clear();
    }

    // === Internal Helpers ===

    fn record_op(&self, op: Operation) {
        trace!(?op, "recording operation");
        self.operation_log.lock().unwrap().push(op);
    }

    fn command_failed(&self, command: &str, reason: &str) -> BackupError {
        BackupError::CommandFailed {
            address: self.info.address.clone(),
            command: command.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl SessionOps for MockSession {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn execute(&self, command: &str) -> Result<String> {
        self.record_op(Operation::Execute {
            command: command.to_string(),
        });

        if self.config.fail_execute {
            return Err(self.command_failed(command, "mock execute failure"));
        }

        Ok(self.exec_output.lock().unwrap().clone())
    }

    fn export_config(&self, remote_name: &str) -> Result<()> {
        self.record_op(Operation::ExportConfig {
            remote_name: remote_name.to_string(),
        });

        if self.config.fail_export {
            return Err(self.command_failed("/export", "mock export failure"));
        }

        let content = self.export_content.lock().unwrap().clone();
        self.remote_files
            .lock()
            .unwrap()
            .insert(remote_name.to_string(), content.into_bytes());
        Ok(())
    }

    fn save_binary_backup(&self, remote_name: &str) -> Result<()> {
        self.record_op(Operation::SaveBinaryBackup {
            remote_name: remote_name.to_string(),
        });

        if self.config.fail_backup {
            return Err(self.command_failed("/system backup save", "mock backup failure"));
        }

        // The device stores the backup under "<name>.backup".
        self.remote_files.lock().unwrap().insert(
            format!("{remote_name}.backup"),
            self.binary_content.clone(),
        );
        Ok(())
    }

    fn fetch_file(&self, remote: &str, local: &Path) -> Result<()> {
        self.record_op(Operation::FetchFile {
            remote: remote.to_string(),
            local: local.to_path_buf(),
        });

        let transfer_failed = |reason: String| BackupError::TransferFailed {
            address: self.info.address.clone(),
            remote: remote.to_string(),
            reason,
        };

        if self.config.failing_fetches.iter().any(|r| r == remote) {
            return Err(transfer_failed("mock transfer failure".to_string()));
        }

        let files = self.remote_files.lock().unwrap();
        let content = files
            .get(remote)
            .ok_or_else(|| transfer_failed("no such remote file".to_string()))?;
        std::fs::write(local, content).map_err(|e| transfer_failed(e.to_string()))
    }
}
