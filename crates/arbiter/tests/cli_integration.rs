use std::process::Command;

#[test]
fn test_arbiter_version() {
    let output = Command::new("cargo")
        .args(["run", "--bin", "arbiter", "--", "--version"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("0.1.0"));
}

#[test]
fn test_arbiter_help() {
    let output = Command::new("cargo")
        .args(["run", "--bin", "arbiter", "--", "--help"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("init"));
    assert!(stdout.contains("check"));
    assert!(stdout.contains("serve"));
}

#[test]
fn test_arbiter_init_creates_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("verdict.toml");

    let output = Command::new("cargo")
        .args(["run", "--bin", "arbiter", "--", "init"])
        .arg(&path)
        .output()
        .unwrap();

    assert!(output.status.success());
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("[sandbox]"));
    assert!(content.contains("[store]"));
}
