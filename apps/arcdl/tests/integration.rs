//! Integration tests for the arcdl CLI

use std::io::Write;
use std::process::Command;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn arcdl() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_arcdl"));
    command.env_remove("RUST_LOG");
    command
}

#[test]
fn test_cli_version() {
    let output = arcdl()
        .arg("--version")
        .output()
        .expect("Failed to execute arcdl");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("arcdl"));
}

#[test]
fn test_cli_help() {
    let output = arcdl()
        .arg("--help")
        .output()
        .expect("Failed to execute arcdl");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Resumable downloads"));
    assert!(stdout.contains("fetch"));
    assert!(stdout.contains("extract"));
    assert!(stdout.contains("install"));
    assert!(stdout.contains("serve"));
}

#[test]
fn test_cli_invalid_command() {
    let output = arcdl()
        .arg("invalid-command")
        .output()
        .expect("Failed to execute arcdl");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unrecognized subcommand"));
}

#[test]
fn test_fetch_requires_url() {
    let output = arcdl()
        .arg("fetch")
        .output()
        .expect("Failed to execute arcdl");

    assert!(!output.status.success());
}

#[test]
fn test_hash_json_output() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("abc.txt");
    std::fs::write(&file, b"abc").unwrap();

    let output = arcdl()
        .arg("--json")
        .arg("hash")
        .arg(&file)
        .output()
        .expect("Failed to execute arcdl");

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["type"], "Hash");
    assert_eq!(value["data"]["algorithm"], "sha256");
    assert_eq!(
        value["data"]["hash"],
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn test_extract_rejects_traversal() {
    let tmp = TempDir::new().unwrap();
    let archive = tmp.path().join("evil.zip");
    let mut writer = ZipWriter::new(std::fs::File::create(&archive).unwrap());
    writer
        .start_file("../evil.txt", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"pwned").unwrap();
    writer.finish().unwrap();

    let dest = tmp.path().join("out");
    let output = arcdl()
        .args(["--color", "never", "extract"])
        .arg(&archive)
        .arg(&dest)
        .output()
        .expect("Failed to execute arcdl");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("archive.path_traversal"));
    assert!(!tmp.path().join("evil.txt").exists());
}

#[test]
fn test_find_without_matches_fails() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("readme.txt"), b"hi").unwrap();

    let output = arcdl()
        .arg("find")
        .arg(tmp.path())
        .arg("*.exe")
        .output()
        .expect("Failed to execute arcdl");

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No files matching"));
}
