use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Command isolated from the user's config file and API key.
fn invex(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("invex").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env_remove("GEMINI_API_KEY");
    cmd
}

const FENCED_RESPONSE: &str = "Here is the table:\n```csv\nInvoice Number,Total Amount\nINV-7,1180.5\nINV-8,NA\n```\nLet me know if you need more.";

#[test]
fn test_prompts_lists_catalog_in_order() {
    let home = TempDir::new().unwrap();
    let output = invex(&home).arg("prompts").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let info = stdout.find("Invoice Info").unwrap();
    let items = stdout.find("Item Details").unwrap();
    let tax = stdout.find("Tax Details").unwrap();
    assert!(info < items && items < tax);
}

#[test]
fn test_prompts_columns_for_single_table() {
    let home = TempDir::new().unwrap();
    invex(&home)
        .args(["prompts", "--table", "tax-details", "--columns"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tax Details"))
        .stdout(predicate::str::contains("Invoice Info").not());
}

#[test]
fn test_parse_fenced_response_to_csv() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("response.txt");
    fs::write(&input, FENCED_RESPONSE).unwrap();

    invex(&home)
        .arg("parse")
        .arg(&input)
        .arg("--no-timestamp")
        .assert()
        .success()
        .stdout("Invoice Number,Total Amount\nINV-7,1180.5\nINV-8,\n");
}

#[test]
fn test_parse_appends_timestamp_column() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("response.txt");
    fs::write(&input, FENCED_RESPONSE).unwrap();

    invex(&home)
        .arg("parse")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "Invoice Number,Total Amount,updated_at\n",
        ));
}

#[test]
fn test_parse_reads_stdin_as_json() {
    let home = TempDir::new().unwrap();
    let output = invex(&home)
        .args(["parse", "-", "--format", "json", "--no-timestamp"])
        .write_stdin(FENCED_RESPONSE)
        .output()
        .unwrap();
    assert!(output.status.success());

    let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(records[0]["Invoice Number"], "INV-7");
    assert_eq!(records[0]["Total Amount"], 1180.5);
    assert!(records[1]["Total Amount"].is_null());
}

#[test]
fn test_parse_rejects_prose() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("response.txt");
    fs::write(
        &input,
        "I'm sorry, the image is too blurry.\nPlease upload a clearer scan.",
    )
    .unwrap();

    invex(&home)
        .arg("parse")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed CSV"));
}

#[test]
fn test_parse_missing_input() {
    let home = TempDir::new().unwrap();
    invex(&home)
        .args(["parse", "does-not-exist.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_inspect_missing_workbook() {
    let home = TempDir::new().unwrap();
    let store = home.path().join("out.xlsx");

    invex(&home)
        .arg("inspect")
        .arg(&store)
        .assert()
        .success()
        .stdout(predicate::str::contains("No workbook"));
}

#[test]
fn test_run_empty_folder_writes_nothing() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("invoices");
    fs::create_dir(&input).unwrap();
    let store = home.path().join("out.xlsx");

    invex(&home)
        .arg("run")
        .arg("--input-dir")
        .arg(&input)
        .arg("--output")
        .arg(&store)
        .args(["--api-key", "dummy", "--no-pause"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No images found"));

    assert!(!store.exists());
}

#[test]
fn test_run_without_api_key_fails() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("invoices");
    fs::create_dir(&input).unwrap();

    invex(&home)
        .arg("run")
        .arg("--input-dir")
        .arg(&input)
        .arg("--no-pause")
        .assert()
        .failure()
        .stderr(predicate::str::contains("GEMINI_API_KEY"));
}

#[test]
fn test_config_set_then_get() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("invex.json");

    invex(&home)
        .arg("-c")
        .arg(&config)
        .args(["config", "set", "pacing.image_pause_secs", "3"])
        .assert()
        .success();

    invex(&home)
        .arg("-c")
        .arg(&config)
        .args(["config", "get", "pacing.image_pause_secs"])
        .assert()
        .success()
        .stdout("3\n");
}

#[test]
fn test_config_show_masks_api_key() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("invex.json");
    fs::write(&config, r#"{"model": {"api_key": "secret-key"}}"#).unwrap();

    invex(&home)
        .arg("-c")
        .arg(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("secret-key").not())
        .stdout(predicate::str::contains("********"));
}
