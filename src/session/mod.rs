//! Remote device session abstraction.
//!
//! This module provides a trait-based abstraction over real SSH sessions
//! and mock implementations, enabling the backup workflow to be tested
//! without reachable devices.

pub mod mock;
mod real;

pub use real::SshSession;

use std::path::Path;

use serde::Serialize;

use crate::config::{DeviceEntry, RunContext};
use crate::error::Result;

/// Information about a connected device.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceInfo {
    /// Address the session was opened against.
    pub address: String,
    /// SSH username used for authentication.
    pub username: String,
}

/// Core session operations trait.
///
/// Implementations own an established, authenticated connection to one
/// device and close it on drop. Every remote operation is a blocking call;
/// the engine advances only after each call returns.
///
/// # Implementation Notes
///
/// - `export_config` and `save_binary_backup` must wait a settling delay
///   after the shell command returns: the device may still be writing the
///   file at that point, and there is no completion signal to wait on.
/// - Remote file names are relative to the device user's root.
pub trait SessionOps {
    /// Get session information.
    fn info(&self) -> &DeviceInfo;

    /// Device address this session is connected to.
    fn address(&self) -> &str {
        &self.info().address
    }

    /// Execute a command on the device and capture its output.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel cannot be opened or the command
    /// fails to run.
    fn execute(&self, command: &str) -> Result<String>;

    /// Instruct the device to export its running configuration to
    /// `remote_name`, then wait for the export to settle.
    ///
    /// Only one copy is stored on the device: the current one.
    fn export_config(&self, remote_name: &str) -> Result<()>;

    /// Instruct the device to save a full binary backup under
    /// `remote_name` (the device appends `.backup`), then wait for it to
    /// settle.
    ///
    /// Restore with: `/system backup load name=<remote_name>`.
    fn save_binary_backup(&self, remote_name: &str) -> Result<()>;

    /// Download `remote` from the device to `local`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transfer channel cannot be opened, the
    /// remote file is missing, or the local file cannot be written.
    fn fetch_file(&self, remote: &str, local: &Path) -> Result<()>;

    /// Resolve the device's configured identity name.
    ///
    /// Best-effort: callers treat a failure as "no name", never as a
    /// device failure.
    fn identity(&self) -> Result<String> {
        let output = self.execute("/system identity print")?;
        Ok(parse_identity(&output))
    }
}

/// Type alias for boxed trait object.
pub type BoxedSession = Box<dyn SessionOps>;

/// Connect to a device and return the session as a boxed trait object.
///
/// This is the production connector handed to the batch runner; tests
/// inject a connector that returns mock sessions instead.
///
/// # Errors
///
/// Returns an error if the TCP connection, SSH handshake, or
/// authentication fails.
pub fn connect_boxed(entry: &DeviceEntry, ctx: &RunContext) -> Result<BoxedSession> {
    Ok(Box::new(SshSession::connect(entry, ctx)?))
}

/// Extract the identity name from `/system identity print` output.
///
/// RouterOS prints a single `name: <value>` line. Names are truncated to
/// 14 characters, matching the device's own display width.
#[must_use]
pub fn parse_identity(output: &str) -> String {
    let name = output
        .lines()
        .find_map(|line| line.trim().strip_prefix("name:"))
        .map(str::trim)
        .unwrap_or_default();

    name.chars().take(14).collect()
}
