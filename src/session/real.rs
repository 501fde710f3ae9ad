//! Real SSH session implementation.
//!
//! This module wraps the `ssh2` crate to provide the concrete session
//! implementation: password-authenticated SSH with command execution over
//! exec channels and file retrieval over SFTP.

use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use ssh2::Session;
use tracing::{debug, info, trace, warn};

use super::{DeviceInfo, SessionOps};
use crate::config::{DeviceEntry, RunContext};
use crate::error::{BackupError, Result};

/// Default SSH port when the device address carries none.
const SSH_PORT: u16 = 22;

/// Keepalive interval, matching what the devices tolerate on long exports.
const KEEPALIVE_SECS: u32 = 30;

/// Password-authenticated SSH session to one device.
///
/// The connection is opened at construction and closed on drop, so the
/// batch runner can rely on release happening on every exit path.
pub struct SshSession {
    session: Session,
    info: DeviceInfo,
    settle: Duration,
}

impl SshSession {
    /// Connect and authenticate to the device described by `entry`.
    ///
    /// An absent password in the device list has already been normalized
    /// to an empty string by the parser; it is passed through as an empty
    /// credential, not treated as an error.
    pub fn connect(entry: &DeviceEntry, ctx: &RunContext) -> Result<Self> {
        info!(address = %entry.address, "connecting");

        let tcp = open_tcp(&entry.address, ctx.connect_timeout)?;

        let mut session = Session::new().map_err(|e| BackupError::ConnectFailed {
            address: entry.address.clone(),
            reason: e.to_string(),
        })?;
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| BackupError::ConnectFailed {
                address: entry.address.clone(),
                reason: format!("handshake failed: {e}"),
            })?;

        session
            .userauth_password(&entry.username, &entry.password)
            .map_err(|_| BackupError::AuthFailed {
                address: entry.address.clone(),
            })?;
        if !session.authenticated() {
            return Err(BackupError::AuthFailed {
                address: entry.address.clone(),
            });
        }

        session.set_keepalive(true, KEEPALIVE_SECS);

        debug!(address = %entry.address, "connected and authenticated");
        Ok(Self {
            session,
            info: DeviceInfo {
                address: entry.address.clone(),
                username: entry.username.clone(),
            },
            settle: ctx.settle,
        })
    }

    /// Wait for an on-device export/backup command to finish writing.
    ///
    /// The device gives no completion signal; the shell command returns
    /// while the file may still be in flight.
    fn settle_wait(&self) {
        if !self.settle.is_zero() {
            trace!(secs = self.settle.as_secs(), "settling after remote command");
            std::thread::sleep(self.settle);
        }
    }
}

impl SessionOps for SshSession {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn execute(&self, command: &str) -> Result<String> {
        debug!(address = %self.info.address, command = %command, "executing remote command");

        let map_err = |e: ssh2::Error| BackupError::CommandFailed {
            address: self.info.address.clone(),
            command: command.to_string(),
            reason: e.to_string(),
        };

        let mut channel = self.session.channel_session().map_err(map_err)?;
        channel.exec(command).map_err(map_err)?;

        let mut output = String::new();
        channel
            .read_to_string(&mut output)
            .map_err(|e| BackupError::CommandFailed {
                address: self.info.address.clone(),
                command: command.to_string(),
                reason: e.to_string(),
            })?;

        // Best-effort close; output is already captured.
        if let Err(e) = channel.wait_close() {
            warn!(address = %self.info.address, error = %e, "channel close failed");
        }

        trace!(address = %self.info.address, bytes = output.len(), "command output captured");
        Ok(output)
    }

    fn export_config(&self, remote_name: &str) -> Result<()> {
        info!(address = %self.info.address, file = %remote_name, "creating export backup");
        self.execute(&format!("/export file={remote_name}"))?;
        self.settle_wait();
        Ok(())
    }

    fn save_binary_backup(&self, remote_name: &str) -> Result<()> {
        info!(address = %self.info.address, name = %remote_name, "creating binary backup");
        self.execute(&format!("/system backup save name={remote_name}"))?;
        self.settle_wait();
        Ok(())
    }

    fn fetch_file(&self, remote: &str, local: &Path) -> Result<()> {
        info!(
            address = %self.info.address,
            remote = %remote,
            local = %local.display(),
            "downloading file"
        );

        let map_err = |reason: String| BackupError::TransferFailed {
            address: self.info.address.clone(),
            remote: remote.to_string(),
            reason,
        };

        let sftp = self.session.sftp().map_err(|e| map_err(e.to_string()))?;
        let mut remote_file = sftp
            .open(Path::new(remote))
            .map_err(|e| map_err(e.to_string()))?;

        let mut local_file = std::fs::File::create(local).map_err(|e| map_err(e.to_string()))?;
        let bytes = std::io::copy(&mut remote_file, &mut local_file)
            .map_err(|e| map_err(e.to_string()))?;

        debug!(address = %self.info.address, remote = %remote, bytes, "file downloaded");
        Ok(())
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        let _ = self
            .session
            .disconnect(None, "rosbackup session closed", None);
    }
}

/// Open a TCP connection to `address`, defaulting the port to 22.
fn open_tcp(address: &str, timeout: Duration) -> Result<TcpStream> {
    let target = if address.contains(':') {
        address.to_string()
    } else {
        format!("{address}:{SSH_PORT}")
    };

    let connect_failed = |reason: String| BackupError::ConnectFailed {
        address: address.to_string(),
        reason,
    };

    let mut addrs = target
        .to_socket_addrs()
        .map_err(|e| connect_failed(format!("address resolution failed: {e}")))?;
    let sock_addr = addrs
        .next()
        .ok_or_else(|| connect_failed("address resolved to nothing".to_string()))?;

    TcpStream::connect_timeout(&sock_addr, timeout).map_err(|e| connect_failed(e.to_string()))
}
