//! Command-line tests for the offline subcommands

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn bisub(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("bisub").unwrap();
    cmd.current_dir(dir.path()).env_remove("RUST_LOG");
    cmd
}

const ITALIAN_SRT: &str = "1\n00:00:01,000 --> 00:00:03,500\nApriamo il terminale\n\n2\n00:00:04,000 --> 00:00:06,000\nCompiliamo il progetto\n\n";
const ENGLISH_SRT: &str = "1\n00:00:01,000 --> 00:00:03,500\nLet's open the terminal\n\n2\n00:00:04,000 --> 00:00:06,000\nLet's build the project\n\n";

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    bisub(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("restyle"));
}

#[test]
fn test_run_requires_inputs() {
    let dir = TempDir::new().unwrap();
    bisub(&dir).arg("run").assert().failure();
}

#[test]
fn test_invalid_log_level_is_rejected() {
    let dir = TempDir::new().unwrap();
    bisub(&dir)
        .args([
            "--log-level",
            "chatty",
            "restyle",
            "x.ass",
            "--track",
            "en",
            "--margin-v",
            "1",
            "--font-size",
            "1",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid log level"));
}

#[test]
fn test_run_rejects_identical_languages() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.mp4"), b"video").unwrap();
    bisub(&dir)
        .args(["run", "a.mp4", "--source-lang", "en", "--target-lang", "en"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("single-track"));
}

#[test]
fn test_segment_splits_long_transcript_segment() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("transcript.json"),
        r#"{"segments": [{"start": 0.0, "end": 6.0, "text": "Oggi vediamo come installare Rust e configurare il nostro primo progetto"}]}"#,
    )
    .unwrap();

    bisub(&dir)
        .args(["segment", "transcript.json", "--max-chars", "30", "--min-duration", "0.5"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("1\n00:00:00,000 --> "))
        .stdout(predicate::str::contains("\n3\n"))
        .stdout(predicate::str::contains(" --> 00:00:06,000\n"));
}

#[test]
fn test_segment_reports_unreadable_transcript() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("transcript.json"), "not json").unwrap();
    bisub(&dir)
        .args(["segment", "transcript.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read transcript"));
}

#[test]
fn test_render_stacks_translation_above_source() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("it.srt"), ITALIAN_SRT).unwrap();
    fs::write(dir.path().join("en.srt"), ENGLISH_SRT).unwrap();

    bisub(&dir)
        .args([
            "render",
            "it.srt",
            "--translation",
            "en.srt",
            "--width",
            "1920",
            "--height",
            "1080",
            "--out",
            "dual.ass",
        ])
        .assert()
        .success();

    let document = fs::read_to_string(dir.path().join("dual.ass")).unwrap();
    assert!(document.contains("PlayResY: 1080"));
    // Translation sits on the base margin, the spoken language one line height above
    assert!(document.contains("Style: en,Inter,44,"));
    assert!(document.lines().any(|l| l.starts_with("Style: en,") && l.ends_with(",40,40,54,1")));
    assert!(document.lines().any(|l| l.starts_with("Style: it,") && l.ends_with(",40,40,109,1")));
    assert!(document
        .contains("Dialogue: 0,0:00:01.00,0:00:03.50,en,,0,0,0,,Let's open the terminal"));
    assert!(document
        .contains("Dialogue: 0,0:00:04.00,0:00:06.00,it,,0,0,0,,Compiliamo il progetto"));
}

#[test]
fn test_render_rejects_mismatched_tracks() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("it.srt"), ITALIAN_SRT).unwrap();
    fs::write(dir.path().join("en.srt"), "1\n00:00:01,000 --> 00:00:03,500\nOnly one\n\n").unwrap();

    bisub(&dir)
        .args(["render", "it.srt", "--translation", "en.srt", "--width", "1280", "--height", "720"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Caption count mismatch"));
}

#[test]
fn test_restyle_edits_one_track_in_place() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("it.srt"), ITALIAN_SRT).unwrap();
    fs::write(dir.path().join("en.srt"), ENGLISH_SRT).unwrap();
    bisub(&dir)
        .args([
            "render",
            "it.srt",
            "--translation",
            "en.srt",
            "--width",
            "1920",
            "--height",
            "1080",
            "--out",
            "dual.ass",
        ])
        .assert()
        .success();
    let before = fs::read_to_string(dir.path().join("dual.ass")).unwrap();

    bisub(&dir)
        .args(["restyle", "dual.ass", "--track", "it", "--margin-v", "140", "--font-size", "40"])
        .assert()
        .success();

    let after = fs::read_to_string(dir.path().join("dual.ass")).unwrap();
    assert!(after
        .lines()
        .any(|l| l.starts_with("Style: it,Inter,40,") && l.ends_with(",40,40,140,1")));
    let untouched = |doc: &str| -> Vec<String> {
        doc.lines()
            .filter(|l| !l.starts_with("Style: it,"))
            .map(str::to_string)
            .collect()
    };
    assert_eq!(untouched(&before), untouched(&after));
}

#[test]
fn test_restyle_unknown_track_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("it.srt"), ITALIAN_SRT).unwrap();
    bisub(&dir)
        .args(["render", "it.srt", "--width", "1280", "--height", "720", "--out", "single.ass"])
        .assert()
        .success();

    bisub(&dir)
        .args(["restyle", "single.ass", "--track", "de", "--margin-v", "10", "--font-size", "30"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no style named 'de'"));
}
