//! Measurement parsing and extraction tests.

mod common;

use audiolevel::{
    AudioLevelError, MAX_VOLUME, MEAN_VOLUME, Measurement, ParseFailure, extract,
    parse_measurement,
};

use common::{Script, ScriptedTool, media_dir, volumedetect_report};

// ── parse_measurement ────────────────────────────────────────────

#[test]
fn parse_full_volumedetect_report() {
    let measurement = parse_measurement(&volumedetect_report(-27.4, -4.1)).unwrap();
    assert_eq!(
        measurement,
        Measurement {
            mean_db: -27.4,
            peak_db: -4.1
        }
    );
}

#[test]
fn parse_tolerates_spacing_and_signs() {
    let measurement = parse_measurement("mean_volume:-31 dB\nmax_volume:   +0.0dB").unwrap();
    assert_eq!(measurement.mean_db, -31.0);
    assert_eq!(measurement.peak_db, 0.0);
}

#[test]
fn parse_first_occurrence_wins() {
    let text = format!(
        "{}{}",
        volumedetect_report(-20.0, -1.0),
        volumedetect_report(-45.0, -10.0)
    );
    let measurement = parse_measurement(&text).unwrap();
    assert_eq!(measurement.mean_db, -20.0);
    assert_eq!(measurement.peak_db, -1.0);
}

#[test]
fn parse_empty_output() {
    assert_eq!(parse_measurement(""), Err(ParseFailure::EmptyOutput));
    assert_eq!(parse_measurement("  \n\t"), Err(ParseFailure::EmptyOutput));
}

#[test]
fn parse_missing_mean_marker() {
    let result = parse_measurement("max_volume: -3.0 dB\n");
    assert_eq!(result, Err(ParseFailure::MarkerMissing(MEAN_VOLUME)));
}

#[test]
fn parse_missing_peak_marker() {
    let result = parse_measurement("mean_volume: -30.0 dB\n");
    assert_eq!(result, Err(ParseFailure::MarkerMissing(MAX_VOLUME)));
}

#[test]
fn parse_marker_without_unit_is_missing() {
    let result = parse_measurement("mean_volume: -30.0\nmax_volume: -3.0 dB\n");
    assert_eq!(result, Err(ParseFailure::MarkerMissing(MEAN_VOLUME)));
}

#[test]
fn parse_failure_messages() {
    let missing = ParseFailure::MarkerMissing(MEAN_VOLUME).to_string();
    assert!(missing.contains("markers not found"), "{missing}");
    assert!(missing.contains("mean_volume:"), "{missing}");
    assert!(ParseFailure::EmptyOutput.to_string().contains("no output"));
}

// ── extract ──────────────────────────────────────────────────────

#[test]
fn extract_reports_levels() {
    let directory = media_dir(&["talk.mp4"]);
    let tool = ScriptedTool::new().levels("talk.mp4", -33.2, -8.5);

    let measurement = extract(&tool, &directory.path().join("talk.mp4")).unwrap();
    assert!((measurement.mean_db - -33.2).abs() < 1e-9);
    assert!((measurement.peak_db - -8.5).abs() < 1e-9);
}

#[test]
fn extract_missing_file() {
    let tool = ScriptedTool::new().levels("ghost.mp4", -20.0, -1.0);

    match extract(&tool, "does/not/exist/ghost.mp4".as_ref()) {
        Err(AudioLevelError::Extraction { reason, .. }) => {
            assert_eq!(reason, "file not found");
        }
        other => panic!("Expected Extraction, got: {other:?}"),
    }
}

#[test]
fn extract_non_zero_exit_keeps_stderr_tail() {
    let directory = media_dir(&["broken.mkv"]);
    let tool = ScriptedTool::new().script(
        "broken.mkv",
        Script::Fail("line one\nline two\nline three\nbroken.mkv: Invalid data found when processing input\n".to_string()),
    );

    match extract(&tool, &directory.path().join("broken.mkv")) {
        Err(AudioLevelError::Extraction { reason, .. }) => {
            assert!(reason.starts_with("tool exited with"), "{reason}");
            assert!(reason.contains("Invalid data found"), "{reason}");
            assert!(!reason.contains("line one"), "{reason}");
        }
        other => panic!("Expected Extraction, got: {other:?}"),
    }
}

#[test]
fn extract_without_audio_track() {
    let directory = media_dir(&["silent.mov"]);
    let tool = ScriptedTool::new().script("silent.mov", Script::NoAudio);

    let error = extract(&tool, &directory.path().join("silent.mov")).unwrap_err();
    assert!(error.is_per_file());
    assert!(error.to_string().contains("markers not found"), "{error}");
}

#[test]
fn extract_spawn_failure() {
    let directory = media_dir(&["clip.mp4"]);
    let tool = ScriptedTool::new().script("clip.mp4", Script::SpawnError);

    match extract(&tool, &directory.path().join("clip.mp4")) {
        Err(AudioLevelError::Extraction { reason, .. }) => {
            assert!(reason.contains("no such binary"), "{reason}");
        }
        other => panic!("Expected Extraction, got: {other:?}"),
    }
}
