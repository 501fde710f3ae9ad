//! Per-device backup orchestration.
//!
//! Sequences the remote commands and file transfers for one device:
//! export the running configuration, rotate the local snapshot pair,
//! download, compare with the previous run, and archive a timestamped
//! copy plus a binary backup only when the configuration changed.
//!
//! Remote command and transfer failures abort the device; local
//! folder-creation, rotation, and archive-copy failures are logged and
//! tolerated, proceeding with whatever state resulted.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::config::RunContext;
use crate::diff;
use crate::error::Result;
use crate::session::SessionOps;

/// Remote file name the device exports its configuration to.
pub const EXPORT_REMOTE_NAME: &str = "current.rsc";

/// Name passed to `/system backup save`; the device appends `.backup`.
pub const BINARY_BACKUP_NAME: &str = "current";

/// Remote file name the binary backup lands under.
pub const BINARY_REMOTE_FILE: &str = "current.backup";

/// Local rotating snapshot file names.
pub const CURRENT_FILE: &str = "current.rsc";
pub const PREVIOUS_FILE: &str = "previous.rsc";

/// Outcome of one device's backup run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum BackupOutcome {
    /// Export matched the previous run; nothing archived.
    Unchanged,
    /// Configuration changed; export and binary archives were written.
    Archived {
        export: PathBuf,
        binary: PathBuf,
    },
}

impl BackupOutcome {
    /// Returns true if this run archived new backups.
    pub const fn archived(&self) -> bool {
        matches!(self, Self::Archived { .. })
    }
}

/// On-disk layout of one device's backup folder.
///
/// Layout under the backup root:
/// `{root}/{address}/current.rsc`, `{root}/{address}/previous.rsc`, and
/// timestamped `{address}-{timestamp}.rsc` / `.backup` archives.
#[derive(Debug, Clone)]
pub struct DevicePaths {
    /// Per-device backup folder.
    pub folder: PathBuf,
    /// Most recent export, just downloaded.
    pub current: PathBuf,
    /// Export from the prior run, rotated in before the download.
    pub previous: PathBuf,
}

impl DevicePaths {
    #[must_use]
    pub fn new(backup_root: &Path, address: &str) -> Self {
        let folder = backup_root.join(address);
        Self {
            current: folder.join(CURRENT_FILE),
            previous: folder.join(PREVIOUS_FILE),
            folder,
        }
    }

    /// Archive path for the export file of this run.
    #[must_use]
    pub fn archive_export(&self, address: &str, timestamp: &str) -> PathBuf {
        self.folder.join(format!("{address}-{timestamp}.rsc"))
    }

    /// Archive path for the binary backup of this run.
    #[must_use]
    pub fn archive_binary(&self, address: &str, timestamp: &str) -> PathBuf {
        self.folder.join(format!("{address}-{timestamp}.backup"))
    }
}

/// Back up one device over an established session.
///
/// Step order matters: the old `current.rsc` must be rotated to
/// `previous.rsc` before the new download overwrites it, otherwise change
/// detection compares the new export against itself and always reports
/// "no change".
///
/// # Errors
///
/// Returns a device-scoped error on any remote command or transfer
/// failure. The batch runner catches these at its iteration boundary.
#[instrument(skip_all, fields(address = %session.address()))]
pub fn backup_device(session: &dyn SessionOps, ctx: &RunContext) -> Result<BackupOutcome> {
    let address = session.address().to_string();

    // 1. Export the running configuration on the device.
    session.export_config(EXPORT_REMOTE_NAME)?;

    // 2. Resolve the device's backup folder. Creation failure is tolerated.
    let paths = DevicePaths::new(&ctx.backup_root, &address);
    if !paths.folder.exists() {
        info!(folder = %paths.folder.display(), "creating backup folder");
        if let Err(e) = fs::create_dir_all(&paths.folder) {
            warn!(folder = %paths.folder.display(), error = %e, "failed to create backup folder");
        }
    }

    // 3. Rotate current -> previous, overwriting any stale previous.
    if paths.current.exists() {
        if let Err(e) = fs::rename(&paths.current, &paths.previous) {
            warn!(
                current = %paths.current.display(),
                previous = %paths.previous.display(),
                error = %e,
                "failed to rotate current export to previous"
            );
        }
    }

    // 4. Download the fresh export.
    session.fetch_file(EXPORT_REMOTE_NAME, &paths.current)?;

    // 5. Compare against the previous run.
    if diff::exports_identical(&paths.current, &paths.previous)? {
        info!("no configuration changes");
        return Ok(BackupOutcome::Unchanged);
    }

    info!("configuration changed, archiving");

    // 6a. Archive the export. Copy failure is tolerated; the binary backup
    //     is still attempted.
    let export_archive = paths.archive_export(&address, &ctx.timestamp);
    info!(archive = %export_archive.display(), "archiving export");
    if let Err(e) = fs::copy(&paths.current, &export_archive) {
        warn!(archive = %export_archive.display(), error = %e, "failed to archive export");
    }

    // 6b. Create and download the binary backup.
    session.save_binary_backup(BINARY_BACKUP_NAME)?;
    let binary_archive = paths.archive_binary(&address, &ctx.timestamp);
    session.fetch_file(BINARY_REMOTE_FILE, &binary_archive)?;

    Ok(BackupOutcome::Archived {
        export: export_archive,
        binary: binary_archive,
    })
}
