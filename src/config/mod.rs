//! Run configuration for the backup CLI.
//!
//! Consolidates everything a run needs into one immutable [`RunContext`]
//! constructed at process start: the backup root, the run timestamp shared
//! by every device, and the transport timings. Device list parsing lives
//! in [`devices`].

mod devices;

pub use devices::{load_device_list, parse_device_list, DeviceEntry, DeviceListError};

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{BackupError, Result};

/// Environment variable naming the backup root directory.
pub const BACKUP_ROOT_ENV: &str = "ROSBACKUP_ROOT";

/// Timestamp format used for archive file names. Sorts lexicographically.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Immutable per-run configuration.
///
/// The timestamp is generated once and shared by all devices processed in
/// the run, so a single pass never produces archives with mixed timestamps.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Root directory under which per-device backup folders live.
    pub backup_root: PathBuf,
    /// Run timestamp in [`TIMESTAMP_FORMAT`].
    pub timestamp: String,
    /// Wait after issuing an on-device export/backup command.
    pub settle: Duration,
    /// SSH connection timeout.
    pub connect_timeout: Duration,
}

impl RunContext {
    /// Build a run context, resolving the backup root from the `--root`
    /// flag or the `ROSBACKUP_ROOT` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::MissingBackupRoot`] when neither source
    /// provides a root. This is a fatal startup condition: the caller must
    /// exit before any device is contacted.
    pub fn resolve(
        root: Option<&Path>,
        settle_secs: u64,
        connect_timeout_secs: u64,
    ) -> Result<Self> {
        let backup_root = match root {
            Some(p) => p.to_path_buf(),
            None => std::env::var_os(BACKUP_ROOT_ENV)
                .map(PathBuf::from)
                .ok_or(BackupError::MissingBackupRoot)?,
        };

        Ok(Self {
            backup_root,
            timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
            settle: Duration::from_secs(settle_secs),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
        })
    }

    /// Context with a caller-supplied timestamp, used by tests to pin
    /// archive names.
    #[must_use]
    pub fn with_timestamp(backup_root: impl Into<PathBuf>, timestamp: impl Into<String>) -> Self {
        Self {
            backup_root: backup_root.into(),
            timestamp: timestamp.into(),
            settle: Duration::ZERO,
            connect_timeout: Duration::from_secs(10),
        }
    }
}
