//! Error types for RouterOS backup operations.

use thiserror::Error;

/// Primary error type for backup operations.
#[derive(Error, Debug)]
pub enum BackupError {
    // Startup errors
    #[error("Backup root not configured: set ROSBACKUP_ROOT or pass --root")]
    MissingBackupRoot,

    #[error("Device list not found: {path}")]
    DeviceListNotFound { path: String },

    #[error("Device list parse error: {0}")]
    DeviceListParse(String),

    // Session errors
    #[error("Authentication failed for {address}")]
    AuthFailed { address: String },

    #[error("Failed to connect to {address}: {reason}")]
    ConnectFailed { address: String, reason: String },

    #[error("Remote command failed on {address}: {command}: {reason}")]
    CommandFailed {
        address: String,
        command: String,
        reason: String,
    },

    #[error("Transfer of {remote} from {address} failed: {reason}")]
    TransferFailed {
        address: String,
        remote: String,
        reason: String,
    },

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl BackupError {
    /// Returns true if the error is recoverable by the user.
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MissingBackupRoot
                | Self::DeviceListNotFound { .. }
                | Self::DeviceListParse(..)
                | Self::AuthFailed { .. }
        )
    }

    /// Returns true if the error is scoped to a single device.
    ///
    /// Device-scoped errors are caught at the batch boundary and recorded
    /// in the run report; they never abort the remaining devices.
    pub const fn is_device_scoped(&self) -> bool {
        matches!(
            self,
            Self::AuthFailed { .. }
                | Self::ConnectFailed { .. }
                | Self::CommandFailed { .. }
                | Self::TransferFailed { .. }
        )
    }

    /// Returns a suggestion for how to fix the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::MissingBackupRoot => Some("Export ROSBACKUP_ROOT=/path/to/backups"),
            Self::DeviceListNotFound { .. } => {
                Some("Create a device list or pass --devices <FILE>")
            }
            Self::DeviceListParse(..) => Some("Expected one 'address;username;password' per line"),
            Self::AuthFailed { .. } => Some("Check the username and password in the device list"),
            _ => None,
        }
    }
}

/// Convenience type alias for Results using BackupError.
pub type Result<T> = std::result::Result<T, BackupError>;

/// Extension trait for adding context to errors.
pub trait ResultExt<T> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E: std::error::Error> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| BackupError::Other(format!("{}: {e}", f().into())))
    }
}
