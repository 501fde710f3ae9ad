//! Properties of the comment-aware export comparator.

use std::path::PathBuf;

use rosbackup::diff::exports_identical;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn identical_non_comment_content_always_matches() {
    let body = "/interface bridge add name=lan\n/ip address add address=10.0.0.1/24\n";
    let header_variants = [
        "",
        "# 2026-08-06 12:00:00 by RouterOS 7.15\n",
        "# exported\n# by someone\n# three headers\n",
    ];

    let tmp = TempDir::new().unwrap();
    for (i, h1) in header_variants.iter().enumerate() {
        for (j, h2) in header_variants.iter().enumerate() {
            let a = write(&tmp, &format!("a-{i}-{j}.rsc"), &format!("{h1}{body}"));
            let b = write(&tmp, &format!("b-{i}-{j}.rsc"), &format!("{h2}{body}"));
            assert!(
                exports_identical(&a, &b).unwrap(),
                "headers {i}/{j} should not affect comparison"
            );
        }
    }
}

#[test]
fn any_non_comment_difference_is_detected() {
    let tmp = TempDir::new().unwrap();
    let base = "/ip address add address=10.0.0.1/24\n/ip route add gateway=10.0.0.254\n";
    let variants = [
        "/ip address add address=10.0.0.2/24\n/ip route add gateway=10.0.0.254\n",
        "/ip address add address=10.0.0.1/24\n",
        "/ip address add address=10.0.0.1/24\n/ip route add gateway=10.0.0.254\n/extra\n",
        "",
    ];

    let a = write(&tmp, "base.rsc", base);
    for (i, variant) in variants.iter().enumerate() {
        let b = write(&tmp, &format!("variant-{i}.rsc"), variant);
        assert!(
            !exports_identical(&a, &b).unwrap(),
            "variant {i} should differ from base"
        );
    }
}

#[test]
fn absent_previous_always_reports_changed() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("previous.rsc");

    for (i, content) in ["", "# only a comment\n", "/ip address add\n"]
        .iter()
        .enumerate()
    {
        let current = write(&tmp, &format!("current-{i}.rsc"), content);
        assert!(
            !exports_identical(&current, &missing).unwrap(),
            "missing previous must force a backup regardless of current content"
        );
    }
}

#[test]
fn comparison_is_symmetric() {
    let tmp = TempDir::new().unwrap();
    let a = write(&tmp, "a.rsc", "# h1\n/ip address add\n");
    let b = write(&tmp, "b.rsc", "# h2\n# h3\n/ip address add\n");
    let c = write(&tmp, "c.rsc", "/ip route add\n");

    assert!(exports_identical(&a, &b).unwrap());
    assert!(exports_identical(&b, &a).unwrap());
    assert!(!exports_identical(&a, &c).unwrap());
    assert!(!exports_identical(&c, &a).unwrap());
}
