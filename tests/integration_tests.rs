//! Integration tests for the onboardify CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const CLEAN_CSV: &str = "\
Vehicle ID,Vehicle Name,Lat,Lon,DateTime,Route URL,Speed,Battery Level,Depot
V1,Truck A,40.0,-75.0,2024-01-01 08:00:00,https://maps.example.com/r1,60,45,North
V2,Truck B,41.5,-74.2,01/02/2024 09:15:00,http://maps.example.com/r2,0,,South
";

const BAD_LAT_CSV: &str = "\
Vehicle ID,Vehicle Name,Lat,Lon,DateTime,Route URL
V1,Truck A,not-a-number,-75.0,2024-01-01 08:00:00,https://maps.example.com/r1
";

const NO_ROUTE_CSV: &str = "\
Vehicle ID,Vehicle Name,Lat,Lon,DateTime,Link
V1,Truck A,40.0,-75.0,2024-01-01 08:00:00,https://maps.example.com/r1
";

/// Helper to get an onboardify command isolated from the user's config
fn onboardify(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("onboardify").unwrap();
    cmd.current_dir(tmp.path())
        .env("HOME", tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join("config"))
        .env("XDG_DATA_HOME", tmp.path().join("data"))
        .env("ONBOARDIFY_USER", "dispatch@acme.test")
        .env_remove("ONBOARDIFY_DATABASE")
        .env_remove("ONBOARDIFY_LOG");
    cmd
}

/// Helper to write a CSV into the temp directory
fn write_csv(tmp: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = tmp.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn fleet_flags() -> Vec<&'static str> {
    vec![
        "--company",
        "Acme Freight",
        "--fleet-size",
        "12",
        "--vehicle-types",
        "van,semi",
        "--vehicle-models",
        "volvo-vnl",
        "--manufacturers",
        "volvo",
        "--energy-cost",
        "0.12",
        "--department",
        "Logistics",
    ]
}

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    let tmp = TempDir::new().unwrap();
    onboardify(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("map"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("submit"));
}

#[test]
fn test_version_displays() {
    let tmp = TempDir::new().unwrap();
    onboardify(&tmp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("onboardify"));
}

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();
    onboardify(&tmp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("onboardify"));
}

#[test]
fn test_missing_file_fails() {
    let tmp = TempDir::new().unwrap();
    onboardify(&tmp)
        .args(["map", "nope.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_header_only_file_fails() {
    let tmp = TempDir::new().unwrap();
    write_csv(&tmp, "empty.csv", "Vehicle ID,Lat\n");
    onboardify(&tmp)
        .args(["map", "empty.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No data found in CSV"));
}

// ============================================================================
// Map Tests
// ============================================================================

#[test]
fn test_map_shows_complete_mapping() {
    let tmp = TempDir::new().unwrap();
    write_csv(&tmp, "fleet.csv", CLEAN_CSV);
    onboardify(&tmp)
        .args(["map", "fleet.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("vehicleId"))
        .stdout(predicate::str::contains("Battery Level"))
        .stdout(predicate::str::contains("Unmapped columns: Depot"))
        .stdout(predicate::str::contains("All required fields are mapped"));
}

#[test]
fn test_map_json_reports_missing_fields() {
    let tmp = TempDir::new().unwrap();
    write_csv(&tmp, "fleet.csv", NO_ROUTE_CSV);
    let output = onboardify(&tmp)
        .args(["map", "fleet.csv", "-f", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["complete"], false);
    assert_eq!(report["missingRequired"], serde_json::json!(["routeUrl"]));
    assert_eq!(report["mapping"]["lat"], "Lat");
    assert_eq!(report["unmappedHeaders"], serde_json::json!(["Link"]));
    assert_eq!(report["dateFormat"], "yyyy-MM-dd HH:mm:ss");
}

#[test]
fn test_map_override_completes_mapping() {
    let tmp = TempDir::new().unwrap();
    write_csv(&tmp, "fleet.csv", NO_ROUTE_CSV);
    onboardify(&tmp)
        .args(["map", "fleet.csv", "--map", "route_url=Link"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All required fields are mapped"));
}

#[test]
fn test_map_override_rejects_unknown_column() {
    let tmp = TempDir::new().unwrap();
    write_csv(&tmp, "fleet.csv", NO_ROUTE_CSV);
    onboardify(&tmp)
        .args(["map", "fleet.csv", "--map", "routeUrl=Route"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not in the CSV header row"));
}

// ============================================================================
// Validate Tests
// ============================================================================

#[test]
fn test_validate_clean_file() {
    let tmp = TempDir::new().unwrap();
    write_csv(&tmp, "fleet.csv", CLEAN_CSV);
    onboardify(&tmp)
        .args(["validate", "fleet.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 rows valid"));
}

#[test]
fn test_validate_reports_row_errors() {
    let tmp = TempDir::new().unwrap();
    write_csv(&tmp, "fleet.csv", BAD_LAT_CSV);
    onboardify(&tmp)
        .args(["validate", "fleet.csv"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Row 1: Invalid latitude value"))
        .stderr(predicate::str::contains("Validation failed with 1 error(s)"));
}

#[test]
fn test_validate_json_lists_messages() {
    let tmp = TempDir::new().unwrap();
    write_csv(&tmp, "fleet.csv", BAD_LAT_CSV);
    let output = onboardify(&tmp)
        .args(["validate", "fleet.csv", "--format", "json"])
        .output()
        .unwrap();
    assert!(!output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["valid"], false);
    assert_eq!(
        report["errors"],
        serde_json::json!(["Row 1: Invalid latitude value"])
    );
}

#[test]
fn test_validate_incomplete_mapping_fails() {
    let tmp = TempDir::new().unwrap();
    write_csv(&tmp, "fleet.csv", NO_ROUTE_CSV);
    onboardify(&tmp)
        .args(["validate", "fleet.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("routeUrl"));
}

// ============================================================================
// Preview Tests
// ============================================================================

#[test]
fn test_preview_json_respects_limit() {
    let tmp = TempDir::new().unwrap();
    write_csv(&tmp, "fleet.csv", CLEAN_CSV);
    let output = onboardify(&tmp)
        .args(["preview", "fleet.csv", "-f", "json", "--limit", "1"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["vehicleId"], "V1");
    assert_eq!(rows[0]["speedKmh"], 60.0);
    assert_eq!(rows[0]["batteryLevel"], 45.0);
    assert_eq!(rows[0]["vehicleCharging"], true);
}

#[test]
fn test_preview_table() {
    let tmp = TempDir::new().unwrap();
    write_csv(&tmp, "fleet.csv", CLEAN_CSV);
    onboardify(&tmp)
        .args(["preview", "fleet.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("VEHICLE ID"))
        .stdout(predicate::str::contains("Truck B"));
}

#[test]
fn test_preview_uses_configured_default_format() {
    let tmp = TempDir::new().unwrap();
    write_csv(&tmp, "fleet.csv", CLEAN_CSV);
    fs::write(tmp.path().join(".onboardify.yaml"), "default_format: json\n").unwrap();
    let output = onboardify(&tmp)
        .args(["preview", "fleet.csv"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows.as_array().map(|r| r.len()), Some(2));
}

// ============================================================================
// Submit Tests
// ============================================================================

#[test]
fn test_submit_stores_rows() {
    let tmp = TempDir::new().unwrap();
    write_csv(&tmp, "fleet.csv", CLEAN_CSV);
    let db = tmp.path().join("store").join("vehicle_data.db");

    onboardify(&tmp)
        .args(["submit", "fleet.csv", "--database"])
        .arg(&db)
        .args(fleet_flags())
        .assert()
        .success()
        .stdout(predicate::str::contains("Submission Summary"))
        .stdout(predicate::str::contains("Rows stored:  2"));

    let store = onboardify::core::SqliteStore::open(&db).unwrap();
    let ids = store.document_ids().unwrap();
    assert_eq!(ids.len(), 1);
    let rows = store.rows(&ids[0]).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].vehicle_id, "V1");
}

#[test]
fn test_submit_json_payload_uses_snake_case() {
    let tmp = TempDir::new().unwrap();
    write_csv(&tmp, "fleet.csv", CLEAN_CSV);

    onboardify(&tmp)
        .args(["submit", "fleet.csv", "--json", "payload.json", "--no-database"])
        .args(fleet_flags())
        .assert()
        .success();

    let payload: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(tmp.path().join("payload.json")).unwrap())
            .unwrap();
    assert_eq!(payload["user"], "dispatch@acme.test");
    assert_eq!(payload["data"][0]["vehicle_id"], "V1");
    assert_eq!(payload["data"][1]["battery_level"], serde_json::Value::Null);
    assert_eq!(payload["mapping"]["route_url"], "Route URL");
    assert_eq!(payload["mapping"]["vehicle_charging"], "");
    assert_eq!(payload["onboarding"]["company_name"], "Acme Freight");
}

#[test]
fn test_submit_refuses_invalid_rows() {
    let tmp = TempDir::new().unwrap();
    write_csv(&tmp, "fleet.csv", BAD_LAT_CSV);
    let db = tmp.path().join("vehicle_data.db");

    onboardify(&tmp)
        .args(["submit", "fleet.csv", "--database"])
        .arg(&db)
        .args(fleet_flags())
        .assert()
        .failure()
        .stdout(predicate::str::contains("Row 1: Invalid latitude value"))
        .stderr(predicate::str::contains("Submission refused"));

    assert!(!db.exists());
}

#[test]
fn test_submit_requires_fleet_details() {
    let tmp = TempDir::new().unwrap();
    write_csv(&tmp, "fleet.csv", CLEAN_CSV);

    onboardify(&tmp)
        .args(["submit", "fleet.csv", "--json", "payload.json", "--no-database"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not ready to submit"));

    assert!(!tmp.path().join("payload.json").exists());
}

// ============================================================================
// Template Tests
// ============================================================================

#[test]
fn test_template_round_trips_through_validate() {
    let tmp = TempDir::new().unwrap();
    let output = onboardify(&tmp).arg("template").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("Vehicle Id,Vehicle Name,Lat,Lon"));
    write_csv(&tmp, "template.csv", &stdout);

    onboardify(&tmp)
        .args(["validate", "template.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 rows valid"));
}
