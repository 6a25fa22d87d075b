use assert_cmd::Command;
use serde_json::Value;
use std::{fs, path::PathBuf};
use tempfile::tempdir;

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .to_path_buf()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() <= expected.abs() * 1e-6,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn monitor_replays_notifications_and_saves_session() {
    let temp = tempdir().unwrap();
    let session = temp.path().join("heart_rate_data.txt");
    let input = workspace_root().join("test_data/notifications.hex");
    let output = Command::cargo_bin("hrvmon")
        .unwrap()
        .args([
            "monitor",
            "--input",
            input.to_str().unwrap(),
            "--session-out",
            session.to_str().unwrap(),
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(output).unwrap();
    let updates: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(updates.len(), 61);

    let first = &updates[0];
    assert_eq!(first["heart_rate"], 63);
    assert_eq!(first["buffered"], 2);
    assert!(first["result"]["lf"].is_null());

    // the notification without RR values still produces an update
    assert!(updates
        .iter()
        .any(|u| u["rr"].as_array().map_or(false, |rr| rr.is_empty())));

    let last = updates.last().unwrap();
    assert_eq!(last["buffered"], 66);
    assert_close(last["result"]["lf"].as_f64().unwrap(), 2.421115410311144e-08);
    assert_close(last["result"]["hf"].as_f64().unwrap(), 0.001285379273026278);
    assert_close(
        last["result"]["lf_hf"].as_f64().unwrap(),
        1.883580559542481e-05,
    );

    let saved = fs::read_to_string(&session).unwrap();
    assert_eq!(saved.lines().count(), 61);
    assert_eq!(
        saved.lines().next().unwrap(),
        "HR: 63 BPM | RR: 900.4 ms, 959.0 ms"
    );
    assert!(saved.contains("RR: N/A"));
}

#[test]
fn monitor_skips_malformed_lines() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("payloads.hex");
    fs::write(&input, "10 3f 9a 03\nnot hex\n10\n\n10 40 00 04\n").unwrap();
    let output = Command::cargo_bin("hrvmon")
        .unwrap()
        .args(["monitor", "--input", input.to_str().unwrap()])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(output).unwrap();
    let lines: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1]["heart_rate"], 64);
    assert_eq!(lines[1]["rr"][0].as_f64().unwrap(), 1.0);
}

#[test]
fn replay_session_reports_final_window() {
    let input = workspace_root().join("test_data/session_sample.txt");
    let output = Command::cargo_bin("hrvmon")
        .unwrap()
        .args(["replay-session", "--input", input.to_str().unwrap()])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["records"], 61);
    assert_eq!(json["buffered"], 66);
    assert_close(json["result"]["lf"].as_f64().unwrap(), 2.4348862423787707e-08);
    assert_close(json["result"]["hf"].as_f64().unwrap(), 0.0012858187438500336);
    assert_close(
        json["result"]["lf_hf"].as_f64().unwrap(),
        1.8936465610138545e-05,
    );
}

#[test]
fn replay_session_rejects_garbage() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("broken.txt");
    fs::write(&input, "HR: 60 BPM | RR: 1000.0 ms\nnonsense\n").unwrap();
    Command::cargo_bin("hrvmon")
        .unwrap()
        .args(["replay-session", "--input", input.to_str().unwrap()])
        .assert()
        .failure();
}
