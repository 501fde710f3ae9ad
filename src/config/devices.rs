//! Device list parsing.
//!
//! The device list is a plain text file with one device per line, fields
//! separated by `;`: address, username, password. The password field may be
//! empty or missing entirely. Lines whose first field starts with `#` are
//! comments and skipped.

use std::io::{self, BufRead};
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, trace};

/// One row of the device list, immutable for the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEntry {
    /// Address to connect to (IP or hostname).
    pub address: String,
    /// SSH username.
    pub username: String,
    /// SSH password. An absent field is normalized to empty, never an error.
    pub password: String,
}

impl DeviceEntry {
    #[must_use]
    pub fn new(
        address: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Errors that can occur while reading the device list.
#[derive(Debug, Error)]
pub enum DeviceListError {
    /// The list file could not be opened.
    #[error("failed to open device list {0}: {1}")]
    OpenError(String, #[source] io::Error),

    /// A line could not be read.
    #[error("failed to read device list line {0}: {1}")]
    ReadError(usize, #[source] io::Error),

    /// A non-comment line had no address field.
    #[error("line {0}: missing device address")]
    MissingAddress(usize),

    /// A non-comment line had no username field.
    #[error("line {0}: missing username for {1}")]
    MissingUsername(usize, String),
}

/// Parse a device list from any line-oriented reader.
///
/// Comment rows (first field starting with `#`) and blank lines are skipped
/// entirely; everything else must carry at least an address and a username.
/// Order is preserved: the batch runner processes devices in list order.
pub fn parse_device_list<R: BufRead>(reader: R) -> Result<Vec<DeviceEntry>, DeviceListError> {
    let mut entries = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let lineno = idx + 1;
        let line = line.map_err(|e| DeviceListError::ReadError(lineno, e))?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            trace!(lineno, "skipping blank line");
            continue;
        }
        if trimmed.starts_with('#') {
            trace!(lineno, "skipping comment line");
            continue;
        }

        let mut fields = trimmed.split(';');
        let address = fields
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(DeviceListError::MissingAddress(lineno))?
            .to_string();
        let username = fields
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| DeviceListError::MissingUsername(lineno, address.clone()))?
            .to_string();
        let password = fields.next().map(str::trim).unwrap_or_default().to_string();

        debug!(lineno, address = %address, username = %username, "parsed device entry");
        entries.push(DeviceEntry {
            address,
            username,
            password,
        });
    }

    info!(devices = entries.len(), "device list parsed");
    Ok(entries)
}

/// Load and parse the device list at `path`.
pub fn load_device_list(path: &Path) -> Result<Vec<DeviceEntry>, DeviceListError> {
    let file = std::fs::File::open(path)
        .map_err(|e| DeviceListError::OpenError(path.display().to_string(), e))?;
    parse_device_list(io::BufReader::new(file))
}
