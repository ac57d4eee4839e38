//! End-to-end runs of the `simulate` subcommand against scenario files.

use std::path::PathBuf;

use gt_cli::scenario::{load_scenario, run_scenario};
use gt_cli::simulate::{run_simulate, OutputFormat, SimulateArgs};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn bronze_scenario_mints_only_for_the_qualifying_participant() {
    let scenario = load_scenario(&fixture("bronze.yaml")).unwrap();
    let report = run_scenario(&scenario).unwrap();

    assert_eq!(report.balances["participant-a"], 1);
    assert_eq!(report.balances["participant-b"], 0);
    assert_eq!(report.total_supply, 1);
    assert_eq!(report.pending, 0);

    // Second fulfil finds an empty queue; the only rejection is the
    // submission after deactivation.
    let rejected: Vec<_> = report.rejected().collect();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].error_class.as_deref(), Some("validation"));
    assert_eq!(rejected[0].index, 5);
}

#[test]
fn json_report_is_parseable() {
    let out = run_simulate(&SimulateArgs {
        scenario: fixture("bronze.yaml"),
        format: OutputFormat::Json,
    })
    .unwrap();
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["total_supply"], 1);
    assert_eq!(value["balances"]["participant-a"], 1);
}

#[test]
fn text_report_lists_balances() {
    let out = run_simulate(&SimulateArgs {
        scenario: fixture("bronze.yaml"),
        format: OutputFormat::Text,
    })
    .unwrap();
    assert!(out.contains("participant-a: 1"));
    assert!(out.contains("participant-b: 0"));
}

#[test]
fn scenario_written_to_disk_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("threshold.yaml");
    std::fs::write(
        &path,
        r#"
genesis: "2026-09-01T12:00:00Z"
oracle:
  seeds:
    - "0202020202020202020202020202020202020202020202020202020202020202"
    - "0303030303030303030303030303030303030303030303030303030303030303"
  attestation_threshold: 2
events:
  - name: Silver
    organizer: org
    threshold: 5000
    expires_in_days: 30
steps:
  - action: submit
    participant: edge
    event: Silver
    balance: 5000
  - action: fulfil
"#,
    )
    .unwrap();
    let report = run_scenario(&load_scenario(&path).unwrap()).unwrap();
    assert_eq!(report.balances["edge"], 1);
    assert_eq!(report.rejected().count(), 0);
}

#[test]
fn unknown_scenario_field_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.yaml");
    std::fs::write(&path, "genesis: x\nbogus: 1\n").unwrap();
    assert!(load_scenario(&path).is_err());
}

#[test]
fn duplicate_event_names_fail_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("twins.yaml");
    std::fs::write(
        &path,
        r#"genesis: "2026-09-01T12:00:00Z"
oracle:
  seeds: ["0101010101010101010101010101010101010101010101010101010101010101"]
events:
  - name: Bronze
    organizer: org
    threshold: 1000
    expires_in_days: 30
  - name: Bronze
    organizer: org
    threshold: 10
    expires_in_days: 30
steps: []
"#,
    )
    .unwrap();
    let err = load_scenario(&path).unwrap_err();
    assert!(format!("{err:#}").contains("duplicate event name"), "{err:#}");
}

#[test]
fn missing_scenario_file_is_an_error() {
    assert!(load_scenario(&fixture("does-not-exist.yaml")).is_err());
}
