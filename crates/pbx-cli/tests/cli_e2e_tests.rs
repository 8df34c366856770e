//! CLI end-to-end tests that invoke the compiled `pbx-sync` binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use pbx_core::{DeclaredStore, TomlDeclaredStore};
use pbx_test_utils::extension;
use tempfile::TempDir;

fn pbx_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_pbx-sync"))
}

/// Write a `pbx-sync.toml` pointing every file into `dir`.
fn write_config(dir: &Path, extra: &str) {
    let config = format!(
        "[files]\nconfig = \"{}\"\ndeclared = \"{}\"\n{}",
        dir.join("pjsip.conf").display(),
        dir.join("extensions.toml").display(),
        extra
    );
    fs::write(dir.join("pbx-sync.toml"), config).unwrap();
}

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(pbx_bin())
        .args(args)
        .current_dir(dir)
        .env_remove("PBX_SYNC_CONFIG")
        .env("NO_COLOR", "1")
        .output()
        .expect("failed to execute pbx-sync binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_help_exits_zero() {
    let out = Command::new(pbx_bin()).arg("--help").output().unwrap();
    assert!(out.status.success());
    assert!(stdout(&out).contains("push"));
}

#[test]
fn test_start_pushes_declared_extensions() {
    let temp = TempDir::new().unwrap();
    write_config(
        temp.path(),
        "\n[[static_blocks]]\nlabel = \"Transport UDP\"\nbody = \"[transport-udp]\\ntype=transport\"\n",
    );
    TomlDeclaredStore::new(temp.path().join("extensions.toml"))
        .upsert(extension("101"))
        .unwrap();

    let out = run(temp.path(), &["start"]);

    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let content = fs::read_to_string(temp.path().join("pjsip.conf")).unwrap();
    assert!(content.contains("; BEGIN Transport UDP"));
    assert!(content.contains("; BEGIN Extension 101"));
    assert!(stdout(&out).contains("1 pushed"));
}

#[test]
fn test_push_unknown_extension_fails() {
    let temp = TempDir::new().unwrap();
    write_config(temp.path(), "");
    assert!(run(temp.path(), &["init"]).status.success());

    let out = run(temp.path(), &["push", "999"]);

    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("999"));
}

#[test]
fn test_missing_config_file_fails() {
    let temp = TempDir::new().unwrap();
    let out = run(temp.path(), &["--config", "absent.toml", "status"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Configuration not found"));
}

#[test]
fn test_disable_comments_out_section() {
    let temp = TempDir::new().unwrap();
    write_config(temp.path(), "");
    TomlDeclaredStore::new(temp.path().join("extensions.toml"))
        .upsert(extension("101"))
        .unwrap();
    assert!(run(temp.path(), &["init"]).status.success());
    assert!(run(temp.path(), &["push", "101"]).status.success());

    let out = run(temp.path(), &["disable", "101"]);

    assert!(out.status.success());
    let content = fs::read_to_string(temp.path().join("pjsip.conf")).unwrap();
    assert!(content.contains(";[101]"));
    assert!(stdout(&out).contains("commented out"));
}

#[test]
fn test_start_with_unreadable_declared_store_succeeds() {
    let temp = TempDir::new().unwrap();
    write_config(temp.path(), "");
    fs::write(temp.path().join("extensions.toml"), "not toml [").unwrap();

    let out = run(temp.path(), &["start"]);

    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert!(temp.path().join("pjsip.conf").exists());
    assert!(stdout(&out).contains("auto-sync failed"));
}
