#[path = "../../remnant_core/tests/common/mod.rs"]
mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

use common::{ADVENTURE_END, CAMPAIGN_END, CAMPAIGN_START, default_profile, quest, stream, world_document};

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_remnant-se"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run remnant-se CLI")
}

fn write_fixture(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, bytes).expect("failed to write fixture");
    path
}

fn profile_fixture(dir: &TempDir) -> PathBuf {
    write_fixture(dir, "profile.sav", &stream(&default_profile()))
}

fn arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn stdout_json(output: &Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("stdout should be valid JSON")
}

#[test]
fn segments_json_lists_slots_and_valid_names() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = profile_fixture(&dir);

    let output = run_cli(&["segments", &arg(&path), "--json"]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["current"].as_array().map(Vec::len), Some(5));
    assert_eq!(json["current"][2]["name"], "Brutality");
    assert!(
        json["valid"]
            .as_array()
            .expect("valid should be an array")
            .iter()
            .any(|v| v == "WreckingBall")
    );
}

#[test]
fn replace_segment_writes_output_and_leaves_input_alone() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let input = profile_fixture(&dir);
    let original = fs::read(&input).expect("fixture readable");
    let edited = dir.path().join("edited.sav");

    let output = run_cli(&[
        "replace-segment",
        &arg(&input),
        "CriticalDamage",
        "WreckingBall",
        "--output",
        &arg(&edited),
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Replaced 2 segment(s): CriticalDamage -> WreckingBall"));

    assert_eq!(fs::read(&input).expect("input readable"), original);
    let listing = run_cli(&["segments", &arg(&edited), "--json"]);
    let json = stdout_json(&listing);
    assert_eq!(json["current"][0]["name"], "WreckingBall");
    assert_eq!(json["current"][3]["name"], "WreckingBall");
}

#[test]
fn replace_segment_in_place_keeps_numbered_backups() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let input = profile_fixture(&dir);
    let original = fs::read(&input).expect("fixture readable");

    for (from, to) in [("Brutality", "Spectrum"), ("Spectrum", "Gigantic")] {
        let output = run_cli(&["replace-segment", &arg(&input), from, to]);
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    }

    let first = dir.path().join("profile.sav.bak1");
    let second = dir.path().join("profile.sav.bak2");
    assert_eq!(fs::read(&first).expect("first backup"), original);
    assert!(second.exists());
    assert_ne!(fs::read(&second).expect("second backup"), original);
}

#[test]
fn rejected_replacement_exits_nonzero_without_writing() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let input = profile_fixture(&dir);
    let original = fs::read(&input).expect("fixture readable");

    for (from, to) in [("CriticalDamage", "NotASegment"), ("Gigantic", "Brutality")] {
        let output = run_cli(&["replace-segment", &arg(&input), from, to]);
        assert!(!output.status.success());
        assert!(!String::from_utf8_lossy(&output.stderr).is_empty());
    }
    assert_eq!(fs::read(&input).expect("input readable"), original);
    assert!(!dir.path().join("profile.sav.bak1").exists());
}

#[test]
fn materials_and_prisms_json() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = profile_fixture(&dir);

    let output = run_cli(&["materials", &arg(&path), "--json"]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["Scraps"], 1250);
    assert_eq!(json["LumeniteCrystal"], 7);

    let output = run_cli(&["prisms", &arg(&path), "--json"]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json[0]["total_level"], 6);
    assert_eq!(json[0]["current_seed"], 4242);
}

#[test]
fn analyze_reports_campaign_and_adventure() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let quests = vec![
        CAMPAIGN_START.to_string(),
        quest("World_Jungle", "Boss", "Ravager"),
        CAMPAIGN_END.to_string(),
        quest("World_Fae", "Boss", "Magister"),
        ADVENTURE_END.to_string(),
    ];
    let path = write_fixture(&dir, "save_0.sav", &stream(&world_document(&quests)));

    let output = run_cli(&["analyze", &arg(&path), "--json"]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    let events = json.as_array().expect("json should be an array");
    assert_eq!(events.len(), 2);
    assert_eq!(events[1]["name"], "Ravager");
    assert_eq!(events[1]["items"][0]["name"], "Ravager's Maw");

    let output = run_cli(&["analyze", &arg(&path), "--adventure", "--no-items"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("  Losomn"));
    assert!(stdout.contains("[Boss] Magister - Ironborough"));
    assert!(!stdout.contains("Firestorm"));
}

#[test]
fn inspect_walks_into_nested_blobs() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = profile_fixture(&dir);

    let output = run_cli(&[
        "inspect",
        &arg(&path),
        "--at",
        "objects[0].ProfileData.objects[0].Prism",
        "--json",
    ]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    let keys = json["keys"].as_array().expect("keys should be an array");
    assert!(keys.iter().any(|k| k == "CurrentSegments[0]"));
    assert!(keys.iter().any(|k| k == "CurrentSeed"));

    let output = run_cli(&["inspect", &arg(&path), "--at", "objects[9]"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("PathNotFound"));
}

#[test]
fn unreadable_input_fails_cleanly() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let garbage = write_fixture(&dir, "garbage.sav", &[1, 2, 3]);
    let output = run_cli(&["segments", &arg(&garbage)]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error reading save file"));
}
