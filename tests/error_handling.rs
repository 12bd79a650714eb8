//! Error handling integration tests.
//!
//! These tests verify that meaningful errors are returned for the failure
//! conditions that abort a batch, and that per-file errors stay per file.

use std::path::PathBuf;

use audiolevel::{AudioLevelError, FfmpegTool, parse_json};

#[test]
fn tool_not_found_names_the_binary() {
    let result = FfmpegTool::locate_binary("definitely-not-an-ffmpeg-binary-4821");

    match result {
        Err(AudioLevelError::ToolNotFound { tool }) => {
            assert_eq!(tool, "definitely-not-an-ffmpeg-binary-4821");
        }
        other => panic!("Expected ToolNotFound, got: {other:?}"),
    }
}

#[test]
fn tool_not_found_message() {
    let error = AudioLevelError::ToolNotFound {
        tool: "ffmpeg".to_string(),
    };
    let error_message = error.to_string();
    assert!(
        error_message.contains("`ffmpeg` was not found"),
        "Error message should name the tool: {error_message}",
    );
}

#[test]
fn discovery_error_message_includes_path() {
    let error = AudioLevelError::Discovery {
        path: PathBuf::from("/media/missing"),
        reason: "No such file or directory".to_string(),
    };
    let error_message = error.to_string();
    assert!(error_message.contains("/media/missing"), "{error_message}");
    assert!(error_message.contains("No such file"), "{error_message}");
}

#[test]
fn per_file_classification() {
    let per_file = [
        AudioLevelError::Extraction {
            path: PathBuf::from("a.mp4"),
            reason: "file not found".to_string(),
        },
        AudioLevelError::MissingMeasurement {
            path: PathBuf::from("a.mp4"),
        },
        AudioLevelError::Correction {
            path: PathBuf::from("a.mp4"),
            reason: "Conversion failed!".to_string(),
        },
    ];
    assert!(per_file.iter().all(AudioLevelError::is_per_file));

    let fatal = [
        AudioLevelError::Discovery {
            path: PathBuf::from("x"),
            reason: "gone".to_string(),
        },
        AudioLevelError::ToolNotFound {
            tool: "ffmpeg".to_string(),
        },
        AudioLevelError::InvalidOptions("both modes".to_string()),
        AudioLevelError::WorkerPool("no threads".to_string()),
    ];
    assert!(fatal.iter().all(|error| !error.is_per_file()));
}

#[test]
fn io_error_converts() {
    let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
    let error: AudioLevelError = io_error.into();
    assert!(matches!(error, AudioLevelError::IoError(_)));
    assert!(error.to_string().contains("read-only"));
}

#[test]
fn json_error_converts() {
    let error = parse_json("[1, 2").unwrap_err();
    assert!(matches!(error, AudioLevelError::JsonError(_)));
}
