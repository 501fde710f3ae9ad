//! Integration tests for device list parsing scenarios.

use std::io::Cursor;

use rosbackup::batch;
use rosbackup::config::{parse_device_list, DeviceEntry, RunContext};
use rosbackup::error::Result;
use rosbackup::session::mock::MockSession;
use rosbackup::session::BoxedSession;
use tempfile::TempDir;

#[test]
fn commented_device_is_never_contacted() {
    // One live device with an empty password, one commented-out device.
    let list = "10.0.0.1;admin;\n#10.0.0.2;admin;secret\n";
    let entries = parse_device_list(Cursor::new(list)).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries[0],
        DeviceEntry::new("10.0.0.1", "admin", "")
    );

    let tmp = TempDir::new().unwrap();
    let ctx = RunContext::with_timestamp(tmp.path(), "20260806-120000");

    let mut contacted = Vec::new();
    let report = batch::run_backups(&entries, &ctx, |entry| {
        contacted.push(entry.address.clone());
        // Empty password arrives as an empty credential, not an error.
        assert_eq!(entry.password, "");
        Ok(Box::new(MockSession::new(&entry.address)) as BoxedSession)
    });

    assert_eq!(contacted, ["10.0.0.1"]);
    assert_eq!(report.results.len(), 1);
}

#[test]
fn whitespace_around_fields_is_trimmed() {
    let entries = parse_device_list(Cursor::new("  10.0.0.1 ; admin ; pw \n")).unwrap();
    assert_eq!(entries[0], DeviceEntry::new("10.0.0.1", "admin", "pw"));
}

#[test]
fn extra_fields_are_ignored() {
    // A stray trailing field (e.g., a note column) must not break parsing.
    let entries = parse_device_list(Cursor::new("10.0.0.1;admin;pw;core switch\n")).unwrap();
    assert_eq!(entries[0].password, "pw");
}

#[test]
fn mixed_list_preserves_live_device_order() {
    let list = "#header\n10.0.0.3;admin;a\n\n10.0.0.1;admin;b\n#10.0.0.9;x;y\n10.0.0.2;admin;c\n";
    let entries = parse_device_list(Cursor::new(list)).unwrap();
    let addrs: Vec<_> = entries.iter().map(|e| e.address.as_str()).collect();
    assert_eq!(addrs, ["10.0.0.3", "10.0.0.1", "10.0.0.2"]);
}

#[test]
fn connector_failure_for_parsed_entry_is_contained() {
    let entries = parse_device_list(Cursor::new("10.0.0.1;admin;\n")).unwrap();
    let tmp = TempDir::new().unwrap();
    let ctx = RunContext::with_timestamp(tmp.path(), "20260806-120000");

    let connector = |entry: &DeviceEntry| -> Result<BoxedSession> {
        Err(rosbackup::error::BackupError::AuthFailed {
            address: entry.address.clone(),
        })
    };

    let report = batch::run_backups(&entries, &ctx, connector);
    assert_eq!(report.error_count, 1);
    assert!(report.results[0]
        .error
        .as_deref()
        .unwrap()
        .contains("Authentication failed"));
}
