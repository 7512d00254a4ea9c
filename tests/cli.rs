use std::path::PathBuf;
use std::process::Command;

/// Path to the binary cargo built for this test run
fn binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_legisbot"))
}

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn run(args: &[&str]) -> (String, bool) {
    let output = Command::new(binary())
        .args(args)
        .env_remove("LEGISBOT_TAXONOMY")
        .env_remove("LEGISBOT_DIR")
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to run legisbot");
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        output.status.success(),
    )
}

fn scan_ids(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).expect("invalid JSON line");
            value["proposal"]["id"].as_str().unwrap_or_default().to_string()
        })
        .collect()
}

#[test]
fn test_scan_prints_json_lines() {
    let taxonomy = fixtures_dir().join("taxonomy.toml");
    let dir = fixtures_dir().join("camara");
    let (stdout, ok) = run(&[
        "scan",
        "--taxonomy",
        taxonomy.to_str().unwrap(),
        "--dir",
        dir.to_str().unwrap(),
    ]);
    assert!(ok);
    insta::assert_snapshot!(scan_ids(&stdout).join(","), @"2460001,2456789");

    let first: serde_json::Value = serde_json::from_str(stdout.lines().next().unwrap()).unwrap();
    assert_eq!(first["priority"], "critical");
    assert_eq!(first["rule"], "always_critical");
}

#[test]
fn test_scan_min_level_and_seen() {
    let taxonomy = fixtures_dir().join("taxonomy.toml");
    let dir = fixtures_dir().join("camara");
    let seen = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(seen.path(), "2460001::2025-03-12T12:15:00+00:00\n").unwrap();

    let (stdout, ok) = run(&[
        "scan",
        "--taxonomy",
        taxonomy.to_str().unwrap(),
        "--dir",
        dir.to_str().unwrap(),
        "--min-level",
        "alto",
        "--seen",
        seen.path().to_str().unwrap(),
    ]);
    assert!(ok);
    assert_eq!(scan_ids(&stdout), vec!["2456789"]);
}

#[test]
fn test_scan_quiet_hours_keep_only_critical() {
    let taxonomy = fixtures_dir().join("taxonomy.toml");
    let dir = fixtures_dir().join("camara");
    let (stdout, ok) = run(&[
        "scan",
        "--taxonomy",
        taxonomy.to_str().unwrap(),
        "--dir",
        dir.to_str().unwrap(),
        "--notify",
        "--min-level",
        "high",
        "--quiet-hours",
        "22-7",
        "--hour",
        "23",
    ]);
    assert!(ok);
    assert_eq!(scan_ids(&stdout), vec!["2460001"]);
}

#[test]
fn test_digest_output() {
    let taxonomy = fixtures_dir().join("taxonomy.toml");
    let dir = fixtures_dir().join("camara");
    let (stdout, ok) = run(&[
        "digest",
        "--taxonomy",
        taxonomy.to_str().unwrap(),
        "--dir",
        dir.to_str().unwrap(),
    ]);
    assert!(ok);

    let digest: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(digest["total"], 2);
    assert_eq!(digest["critical"][0], "PEC 7/2025");
    assert_eq!(digest["high"][0], "PL 1234/2025");
    assert_eq!(digest["counts"]["low"], 0);
}

#[test]
fn test_missing_input_fails() {
    let taxonomy = fixtures_dir().join("taxonomy.toml");
    let (_, ok) = run(&["scan", "--taxonomy", taxonomy.to_str().unwrap()]);
    assert!(!ok);
}

#[test]
fn test_no_subcommand_lists_commands() {
    let (stdout, ok) = run(&[]);
    assert!(ok);
    assert!(stdout.starts_with("Available commands:"));
}

#[test]
fn test_hour_out_of_range_is_rejected() {
    let taxonomy = fixtures_dir().join("taxonomy.toml");
    let dir = fixtures_dir().join("camara");
    let (stdout, ok) = run(&[
        "scan",
        "--taxonomy",
        taxonomy.to_str().unwrap(),
        "--dir",
        dir.to_str().unwrap(),
        "--notify",
        "--quiet-hours",
        "22-7",
        "--hour",
        "30",
    ]);
    assert!(!ok);
    assert!(stdout.is_empty());
}

#[test]
fn test_quiet_hours_require_notify() {
    let taxonomy = fixtures_dir().join("taxonomy.toml");
    let dir = fixtures_dir().join("camara");
    let (_, ok) = run(&[
        "scan",
        "--taxonomy",
        taxonomy.to_str().unwrap(),
        "--dir",
        dir.to_str().unwrap(),
        "--quiet-hours",
        "22-7",
        "--hour",
        "23",
    ]);
    assert!(!ok);
}

#[test]
fn test_stdin_skips_lines_that_are_not_utf8() {
    use std::io::Write;
    use std::process::Stdio;

    let taxonomy = fixtures_dir().join("taxonomy.toml");
    let mut child = Command::new(binary())
        .args(["scan", "--stdin", "--taxonomy", taxonomy.to_str().unwrap()])
        .env_remove("LEGISBOT_DIR")
        .env("RUST_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("Failed to run legisbot");

    let input: Vec<u8> = [
        br#"{"id": "a1", "title": "Greve geral", "summary": "", "status": "voted", "last_modified": "2025-03-01"}"#.as_slice(),
        b"\n\xff\xfe\n".as_slice(),
        br#"{"id": "a2", "title": "Reajuste salarial", "summary": "", "status": "voted", "last_modified": "2025-03-02"}"#.as_slice(),
        b"\n".as_slice(),
    ]
    .concat();
    child.stdin.take().unwrap().write_all(&input).unwrap();

    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(scan_ids(&stdout), vec!["a1", "a2"]);
}
