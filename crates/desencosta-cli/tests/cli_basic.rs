//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_desencosta"))
        .args(args)
        .env("DESENCOSTA_DATA_DIR", data_dir)
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(data_dir: &Path, args: &[&str]) -> serde_json::Value {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_settings_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = run_json(dir.path(), &["settings", "show"]);
    assert_eq!(settings["enabled"], true);
    assert_eq!(settings["active_window_start"], "09:00");
    assert_eq!(settings["active_window_end"], "21:00");
    assert_eq!(settings["daily_notification_count"], 6);
}

#[test]
fn test_settings_set_persists() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["settings", "set", "daily_notification_count", "8"]);
    assert_eq!(code, 0, "{stderr}");
    let settings = run_json(dir.path(), &["settings", "show"]);
    assert_eq!(settings["daily_notification_count"], 8);
}

#[test]
fn test_invalid_setting_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["settings", "set", "daily_notification_count", "0"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error:"));
    let settings = run_json(dir.path(), &["settings", "show"]);
    assert_eq!(settings["daily_notification_count"], 6);
}

#[test]
fn test_schedule_show_lists_slots() {
    let dir = tempfile::tempdir().unwrap();
    let shown = run_json(dir.path(), &["schedule", "show"]);
    let slots: Vec<&str> = shown["slots"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s.as_str().unwrap())
        .collect();
    assert_eq!(slots, ["09:00", "11:24", "13:48", "16:12", "18:36", "21:00"]);
}

#[test]
fn test_schedule_denied_when_notifications_off() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "notifications.enabled", "false"]);
    assert_eq!(code, 0, "{stderr}");
    let status = run_json(dir.path(), &["schedule", "apply"]);
    assert_eq!(status["status"], "permission_denied");
    let settings = run_json(dir.path(), &["settings", "show"]);
    assert_eq!(settings["enabled"], true);
}

#[test]
fn test_disable_reports_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let status = run_json(dir.path(), &["settings", "disable"]);
    assert_eq!(status["status"], "disabled");
}

#[test]
fn test_dismiss_escalates_and_relax_resets() {
    let dir = tempfile::tempdir().unwrap();
    let event = run_json(dir.path(), &["reminder", "dismiss"]);
    assert_eq!(event["type"], "ReminderDismissed");
    assert_eq!(event["urgency_level"], 1);
    let event = run_json(dir.path(), &["reminder", "dismiss"]);
    assert_eq!(event["urgency_level"], 2);

    let event = run_json(dir.path(), &["reminder", "relax"]);
    assert_eq!(event["type"], "RelaxationLogged");
    let status = run_json(dir.path(), &["reminder", "status"]);
    assert_eq!(status["urgency_level"], 0);
    assert_eq!(status["relaxations_today"], 1);
}

#[test]
fn test_first_check_sets_baseline() {
    let dir = tempfile::tempdir().unwrap();
    let event = run_json(dir.path(), &["reminder", "check"]);
    assert_eq!(event["type"], "NothingDue");
    let status = run_json(dir.path(), &["reminder", "status"]);
    assert!(status["last_action"].is_string());
    assert!(status["next_due"].is_string());
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "reminders.poll_interval_secs"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "60");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "reminders.backend", "web"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "reminders.backend"]);
    assert_eq!(stdout.trim(), "web");

    let (_, _, code) = run_cli(dir.path(), &["config", "get", "no.such.key"]);
    assert_ne!(code, 0);
}
