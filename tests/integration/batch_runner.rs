//! Failure isolation and result map ordering across a batch.

use rosbackup::batch::{run_backups, run_broadcast, DeviceStatus};
use rosbackup::config::{DeviceEntry, RunContext};
use rosbackup::error::BackupError;
use rosbackup::session::mock::{MockConfig, MockSession};
use rosbackup::session::BoxedSession;
use tempfile::TempDir;

fn entries(n: usize) -> Vec<DeviceEntry> {
    (1..=n)
        .map(|i| DeviceEntry::new(format!("10.0.0.{i}"), "admin", ""))
        .collect()
}

#[test]
fn connect_failure_does_not_reduce_devices_attempted() {
    // Device k fails to connect; devices k+1..N are still attempted and
    // the result map holds exactly N entries.
    let tmp = TempDir::new().unwrap();
    let ctx = RunContext::with_timestamp(tmp.path(), "20260806-120000");
    let devices = entries(5);
    let failing = "10.0.0.3";

    let report = run_backups(&devices, &ctx, |entry| {
        if entry.address == failing {
            Err(BackupError::ConnectFailed {
                address: entry.address.clone(),
                reason: "connection timed out".into(),
            })
        } else {
            Ok(Box::new(MockSession::new(&entry.address)) as BoxedSession)
        }
    });

    assert_eq!(report.results.len(), 5);
    assert_eq!(report.ok_count, 4);
    assert_eq!(report.error_count, 1);

    let addrs: Vec<_> = report.results.iter().map(|r| r.address.as_str()).collect();
    assert_eq!(
        addrs,
        ["10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.4", "10.0.0.5"]
    );

    for result in &report.results {
        let expected = if result.address == failing {
            DeviceStatus::Error
        } else {
            DeviceStatus::Ok
        };
        assert_eq!(result.status, expected, "device {}", result.address);
    }
}

#[test]
fn mid_backup_failure_is_contained_to_its_device() {
    let tmp = TempDir::new().unwrap();
    let ctx = RunContext::with_timestamp(tmp.path(), "20260806-120000");
    let devices = entries(3);

    let report = run_backups(&devices, &ctx, |entry| {
        let mock = MockSession::new(&entry.address).with_config(MockConfig {
            fail_backup: entry.address == "10.0.0.2",
            ..Default::default()
        });
        Ok(Box::new(mock) as BoxedSession)
    });

    assert_eq!(report.results[0].status, DeviceStatus::Ok);
    assert_eq!(report.results[1].status, DeviceStatus::Error);
    assert_eq!(report.results[2].status, DeviceStatus::Ok);

    // Healthy devices still wrote their archives.
    assert!(tmp
        .path()
        .join("10.0.0.1")
        .join("10.0.0.1-20260806-120000.rsc")
        .exists());
    assert!(tmp
        .path()
        .join("10.0.0.3")
        .join("10.0.0.3-20260806-120000.rsc")
        .exists());
}

#[test]
fn every_device_failing_still_yields_full_report() {
    let tmp = TempDir::new().unwrap();
    let ctx = RunContext::with_timestamp(tmp.path(), "20260806-120000");
    let devices = entries(4);

    let report = run_backups(&devices, &ctx, |entry| {
        Err(BackupError::ConnectFailed {
            address: entry.address.clone(),
            reason: "no route to host".into(),
        })
    });

    assert_eq!(report.results.len(), 4);
    assert_eq!(report.error_count, 4);
    assert!(!report.all_ok());
    assert!(report
        .summary_lines()
        .iter()
        .all(|line| line.ends_with("= ERROR")));
}

#[test]
fn devices_share_one_run_timestamp() {
    let tmp = TempDir::new().unwrap();
    let ctx = RunContext::with_timestamp(tmp.path(), "20260806-120000");
    let devices = entries(2);

    run_backups(&devices, &ctx, |entry| {
        Ok(Box::new(MockSession::new(&entry.address)) as BoxedSession)
    });

    for addr in ["10.0.0.1", "10.0.0.2"] {
        assert!(
            tmp.path()
                .join(addr)
                .join(format!("{addr}-20260806-120000.rsc"))
                .exists(),
            "archive for {addr} must use the shared run timestamp"
        );
    }
}

#[test]
fn broadcast_reports_in_list_order_with_outputs() {
    let devices = entries(3);

    let report = run_broadcast(&devices, "/system resource print", |entry| {
        let mock = MockSession::new(&entry.address)
            .with_exec_output(format!("uptime: 1w (reported by {})", entry.address));
        Ok(Box::new(mock) as BoxedSession)
    });

    assert_eq!(report.results.len(), 3);
    for (i, result) in report.results.iter().enumerate() {
        assert_eq!(result.address, format!("10.0.0.{}", i + 1));
        assert!(result
            .output
            .as_deref()
            .unwrap()
            .contains(&result.address));
    }
}
