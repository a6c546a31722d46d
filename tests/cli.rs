#![forbid(unsafe_code)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn cli() -> Command {
    Command::cargo_bin("tourgarde-cli").unwrap()
}

/// Trois gardes consécutives, une personne chacune.
fn write_slots(dir: &Path) -> PathBuf {
    let path = dir.join("slots.csv");
    fs::write(
        &path,
        "date,kind,hours,required\n\
         2025-09-01,oncall,16,1\n\
         2025-09-02,oncall,16,1\n\
         2025-09-03,oncall,16,1\n",
    )
    .unwrap();
    path
}

#[test]
fn slots_lists_preset() {
    cli()
        .args(["slots", "--preset", "fixed-13d"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2025-09-13 | oncall | 24 h | x6"))
        .stdout(predicate::str::contains("2025-09-09 | regular | 8 h | x7"));
}

#[test]
fn solve_finds_smallest_pool_and_exports() {
    let dir = tempdir().unwrap();
    let slots = write_slots(dir.path());
    let out_csv = dir.path().join("roster.csv");
    let out_json = dir.path().join("report.json");

    cli()
        .arg("solve")
        .arg("--slots-csv")
        .arg(&slots)
        .args(["--min", "1", "--max", "4"])
        .arg("--out-csv")
        .arg(&out_csv)
        .arg("--out-json")
        .arg(&out_json)
        .assert()
        .success()
        .stdout(predicate::str::contains("OK: pool 2"));

    let csv = fs::read_to_string(&out_csv).unwrap();
    assert!(csv.starts_with("person,date,kind,hours"));
    assert_eq!(csv.lines().count(), 4);

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out_json).unwrap()).unwrap();
    assert_eq!(report["meta"]["staff_pool"], 2);
    assert_eq!(report["records"].as_array().unwrap().len(), 3);

    // le tableau exporté passe la vérification
    cli()
        .arg("check")
        .arg("--slots-csv")
        .arg(&slots)
        .arg("--roster")
        .arg(&out_csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("no violations"));
}

#[test]
fn exhausted_range_exits_with_code_2() {
    let dir = tempdir().unwrap();
    let slots = write_slots(dir.path());

    cli()
        .arg("solve")
        .arg("--slots-csv")
        .arg(&slots)
        .args(["--min", "1", "--max", "1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no feasible roster"));
}

#[test]
fn check_reports_violations() {
    let dir = tempdir().unwrap();
    let slots = write_slots(dir.path());
    let roster = dir.path().join("roster.csv");
    fs::write(
        &roster,
        "person,date,kind,hours\n\
         0,2025-09-01,oncall,16\n\
         0,2025-09-02,oncall,16\n\
         0,2025-09-03,oncall,16\n",
    )
    .unwrap();

    cli()
        .arg("check")
        .arg("--slots-csv")
        .arg(&slots)
        .arg("--roster")
        .arg(&roster)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("violation"))
        .stderr(predicate::str::contains("OnCallTooClose"));
}

#[test]
fn exported_template_can_be_reloaded() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fixed.json");

    cli()
        .args(["export-template", "--preset", "fixed-13d", "--out"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("fixed-13d"));

    cli()
        .arg("slots")
        .arg("--template")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("2025-09-11 | regular | 5 h | x6"));
}

#[test]
fn sources_are_mutually_exclusive() {
    let dir = tempdir().unwrap();
    let slots = write_slots(dir.path());

    cli()
        .args(["slots", "--preset", "fixed-13d", "--slots-csv"])
        .arg(&slots)
        .assert()
        .failure();
    cli().arg("slots").assert().failure();
}

#[test]
fn unknown_preset_fails() {
    cli()
        .args(["slots", "--preset", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown preset"));
}

#[test]
fn rules_file_overrides_csv_defaults() {
    let dir = tempdir().unwrap();
    let slots = write_slots(dir.path());
    let rules = dir.path().join("rules.json");
    fs::write(&rules, r#"{ "max_oncall_per_horizon": 1 }"#).unwrap();

    // sans fichier de règles la même liste tient avec 2 personnes
    cli()
        .arg("solve")
        .arg("--slots-csv")
        .arg(&slots)
        .arg("--rules")
        .arg(&rules)
        .args(["--min", "1", "--max", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("OK: pool 3"));
}

#[test]
fn invalid_rules_file_is_named() {
    let dir = tempdir().unwrap();
    let slots = write_slots(dir.path());
    let rules = dir.path().join("rules.json");
    fs::write(&rules, r#"{ "week_length_days": 0 }"#).unwrap();

    cli()
        .arg("check")
        .arg("--slots-csv")
        .arg(&slots)
        .arg("--roster")
        .arg(dir.path().join("absent.csv"))
        .arg("--rules")
        .arg(&rules)
        .assert()
        .failure()
        .stderr(predicate::str::contains("week_length_days"));
}
