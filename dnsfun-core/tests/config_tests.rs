//! Config loading: multi-file merge, skipped files, parse error context.

use assert_fs::prelude::*;
use dnsfun_core::{Config, ConfigError, SnapshotSettings};
use predicates::prelude::*;

const BASE: &str = r#"
[server]
address = ":5354"
domain = "localhost"

[dice]
enabled = true

[fx]
enabled = false
snapshot_enabled = true
snapshot_file = "fx.snapshot"
"#;

const OVERRIDE: &str = r#"
[server]
domain = "dns.example"

[fx]
enabled = true
"#;

// ---------------------------------------------------------------------------
// 1. Merge order
// ---------------------------------------------------------------------------

#[test]
fn later_files_override_earlier_keys() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let base = dir.child("base.toml");
    base.write_str(BASE).expect("write base");
    let overlay = dir.child("override.toml");
    overlay.write_str(OVERRIDE).expect("write override");

    let config = Config::load_files(&[base.path(), overlay.path()]).expect("load");
    assert_eq!(config.server.domain, "dns.example");
    assert_eq!(config.server.address, ":5354", "untouched keys survive the merge");
    assert!(config.is_enabled("fx"));
    assert_eq!(
        config.service("fx").unwrap().snapshot(),
        SnapshotSettings::at("fx.snapshot")
    );
}

#[test]
fn unreadable_file_is_skipped() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let base = dir.child("base.toml");
    base.write_str(BASE).expect("write base");
    let missing = dir.child("nope.toml");

    let config = Config::load_files(&[missing.path(), base.path()]).expect("load");
    assert!(config.is_enabled("dice"));
}

// ---------------------------------------------------------------------------
// 2. Errors
// ---------------------------------------------------------------------------

#[test]
fn corrupt_file_reports_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let broken = dir.child("broken.toml");
    broken.write_str("[server\naddress = ").expect("write");

    let err = Config::load_files(&[broken.path()]).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(predicate::str::contains("broken.toml").eval(&err.to_string()));
}

#[test]
fn no_files_at_all_is_missing_server() {
    let paths: [&std::path::Path; 0] = [];
    let err = Config::load_files(&paths).unwrap_err();
    assert!(matches!(err, ConfigError::MissingKey { .. }));
    assert!(predicate::str::contains("server").eval(&err.to_string()));
}

#[test]
fn wrong_value_type_is_invalid() {
    let err = Config::from_toml_str(
        "[server]\naddress = \":53\"\ndomain = \"x\"\n[dice]\nenabled = \"yes\"\n",
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)), "got: {err}");
}
