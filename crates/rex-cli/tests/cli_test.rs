//! Drives the built `rex` binary end to end.

use std::path::PathBuf;
use std::process::Command;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn rex() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_rex"));
    command.env_remove("RUST_LOG").env("REX_CONFIG_PATH", fixture("absent.toml"));
    command
}

#[test]
fn test_run_prints_json_summary() {
    let output = rex()
        .args(["run", "--format", "json", "--facts"])
        .arg(fixture("blocks_facts.json"))
        .arg(fixture("blocks.json"))
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).unwrap();
    // `log` handler lines precede the summary object
    let json_start = stdout.find('{').unwrap();
    let summary: serde_json::Value = serde_json::from_str(&stdout[json_start..]).unwrap();
    assert_eq!(summary["fired"], 2);
    assert_eq!(summary["fire_counts"]["clear-box"], 1);
    assert!(stdout.starts_with("clear-box [(Block b1 kind box)]"));
}

#[test]
fn test_check_rejects_malformed_rules() {
    let dir = std::env::temp_dir().join(format!("rex-cli-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let rules = dir.join("bad.json");
    std::fs::write(&rules, r#"{"productions": [{"lhs": [{"tag": "or"}], "rhs": {}}]}"#).unwrap();

    let output = rex().arg("check").arg(&rules).output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown condition tag"));
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_unknown_environment_override_is_ignored() {
    let output = rex()
        .env("REX_MISSING_FILTER", "bogus")
        .args(["check", "--format", "json"])
        .arg(fixture("discount.json"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["productions"], 1);
}
