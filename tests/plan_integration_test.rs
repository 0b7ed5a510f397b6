//! Integration tests for the plan and levels commands.

use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

fn get_binary_path() -> String {
    std::env::var("CARGO_BIN_EXE_table-sectioner")
        .unwrap_or_else(|_| "target/debug/table-sectioner".to_string())
}

fn write_schema(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("schema.yaml");
    fs::write(&path, content).unwrap();
    path
}

fn member_schema(dir: &TempDir) -> PathBuf {
    write_schema(
        dir,
        r#"
tables:
  - name: MEMBER_LOGIN
    foreign_keys:
      - references: MEMBER
  - name: MEMBER
  - name: MEMBER_ADDRESS
    foreign_keys:
      - references: MEMBER
  - name: PURCHASE
    foreign_keys:
      - references: MEMBER
"#,
    )
}

fn cyclic_schema(dir: &TempDir) -> PathBuf {
    write_schema(
        dir,
        r#"
tables:
  - name: XA_CYCLIC
    foreign_keys:
      - references: YA_CYCLIC
  - name: YA_CYCLIC
    foreign_keys:
      - references: XA_CYCLIC
  - name: MYSTIC
    foreign_keys:
      - references: XA_CYCLIC
  - name: ZA_REFERRER
    foreign_keys:
      - references: MYSTIC
"#,
    )
}

fn json_stdout(output: &std::process::Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

fn table_names(file: &serde_json::Value) -> Vec<&str> {
    file["tables"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t.as_str().unwrap())
        .collect()
}

#[test]
fn test_plan_replace_spreadsheet_json() {
    let dir = TempDir::new().unwrap();
    let schema = member_schema(&dir);
    let out = dir.path().join("out");

    let output = Command::new(get_binary_path())
        .args(["plan", schema.to_str().unwrap(), "-o", out.to_str().unwrap(), "--json"])
        .output()
        .unwrap();
    let json = json_stdout(&output);

    assert_eq!(json["mode"], "replace");
    assert_eq!(json["basis"], "spreadsheet");
    let files = json["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert!(files[0]["path"]
        .as_str()
        .unwrap()
        .ends_with("loaddata-01-MEMBER-plus.xls"));
    assert_eq!(files[0]["section"], 1);
    assert_eq!(files[0]["existing"], false);
    assert_eq!(
        table_names(&files[0]),
        vec!["MEMBER", "MEMBER_ADDRESS", "MEMBER_LOGIN", "PURCHASE"]
    );
}

#[test]
fn test_plan_text_output() {
    let dir = TempDir::new().unwrap();
    let schema = member_schema(&dir);

    let output = Command::new(get_binary_path())
        .args(["plan", schema.to_str().unwrap(), "--title", "master", "--limit", "2"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[01]"));
    assert!(stdout.contains("master-01-"));
    assert!(stdout.contains("    MEMBER_LOGIN"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Planned 4 tables"));
}

#[test]
fn test_plan_override_delimiter_scans_output_dir() {
    let dir = TempDir::new().unwrap();
    let schema = member_schema(&dir);
    let out = dir.path().join("out");
    fs::create_dir_all(&out).unwrap();
    fs::write(out.join("cyclic_01_01-MEMBER.tsv"), "MEMBER_ID\n").unwrap();
    fs::write(out.join("cyclic_02_01-MEMBER_LOGIN.tsv"), "MEMBER_LOGIN_ID\n").unwrap();
    fs::write(out.join("cyclic_02_02-MEMBER_ADDRESS.tsv"), "MEMBER_ADDRESS_ID\n").unwrap();

    let output = Command::new(get_binary_path())
        .args([
            "plan",
            schema.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
            "--basis",
            "delimiter",
            "--mode",
            "override",
            "--title",
            "cyclic",
            "--json",
        ])
        .output()
        .unwrap();
    let json = json_stdout(&output);

    let files = json["files"].as_array().unwrap();
    let summary: Vec<(u64, bool, Vec<&str>)> = files
        .iter()
        .map(|f| {
            (
                f["section"].as_u64().unwrap(),
                f["existing"].as_bool().unwrap(),
                table_names(f),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            (1, true, vec!["MEMBER"]),
            (2, true, vec!["MEMBER_ADDRESS"]),
            (2, true, vec!["MEMBER_LOGIN"]),
            (99, false, vec!["PURCHASE"]),
        ]
    );
    assert!(files[3]["path"]
        .as_str()
        .unwrap()
        .ends_with("cyclic_99_99_new_table-PURCHASE.tsv"));
}

#[test]
fn test_plan_rejects_unknown_mode() {
    let dir = TempDir::new().unwrap();
    let schema = member_schema(&dir);

    let output = Command::new(get_binary_path())
        .args(["plan", schema.to_str().unwrap(), "--mode", "append"])
        .output()
        .unwrap();

    assert!(!output.status.success());
}

#[test]
fn test_plan_reports_cyclic_tables() {
    let dir = TempDir::new().unwrap();
    let schema = cyclic_schema(&dir);

    let output = Command::new(get_binary_path())
        .args(["plan", schema.to_str().unwrap(), "--json"])
        .output()
        .unwrap();
    let json = json_stdout(&output);

    let cyclic: Vec<&str> = json["cyclic_tables"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t.as_str().unwrap())
        .collect();
    assert_eq!(cyclic.len(), 4);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Circular dependencies detected"));
}

#[test]
fn test_levels_json() {
    let dir = TempDir::new().unwrap();
    let schema = member_schema(&dir);

    let output = Command::new(get_binary_path())
        .args(["levels", schema.to_str().unwrap(), "--json"])
        .output()
        .unwrap();
    let json = json_stdout(&output);

    let levels = json["levels"].as_array().unwrap();
    assert_eq!(levels.len(), 2);
    assert_eq!(table_names(&levels[0]), vec!["MEMBER"]);
    assert_eq!(
        table_names(&levels[1]),
        vec!["MEMBER_ADDRESS", "MEMBER_LOGIN", "PURCHASE"]
    );
    assert!(json["cyclic_tables"].as_array().unwrap().is_empty());
}

#[test]
fn test_levels_check_fails_on_cycle() {
    let dir = TempDir::new().unwrap();
    let schema = cyclic_schema(&dir);

    let output = Command::new(get_binary_path())
        .args(["levels", schema.to_str().unwrap(), "--check"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("cycle recovered"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("check failed"));
}

#[test]
fn test_levels_skip_tables_from_config() {
    let dir = TempDir::new().unwrap();
    let schema = cyclic_schema(&dir);
    let config = dir.path().join("sectioner.yaml");
    fs::write(&config, "skip_tables:\n  - YA_CYCLIC\n").unwrap();

    let output = Command::new(get_binary_path())
        .args([
            "levels",
            schema.to_str().unwrap(),
            "-c",
            config.to_str().unwrap(),
            "--check",
        ])
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("YA_CYCLIC"));
    assert!(stdout.contains("ZA_REFERRER"));
}

#[test]
fn test_missing_schema_file() {
    let output = Command::new(get_binary_path())
        .args(["levels", "/nonexistent/schema.yaml"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does not exist"));
}

#[test]
fn test_completions() {
    let output = Command::new(get_binary_path())
        .args(["completions", "bash"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("table-sectioner"));
}
