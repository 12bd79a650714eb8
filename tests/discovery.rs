//! Input discovery tests.

mod common;

use std::fs;
use std::path::PathBuf;

use audiolevel::{AnalysisOptions, AudioLevelError, discover};

use common::media_dir;

fn names(files: &[audiolevel::MediaFile]) -> Vec<String> {
    files.iter().map(|file| file.display_name()).collect()
}

// ── Directories ──────────────────────────────────────────────────

#[test]
fn discovers_supported_extensions_sorted() {
    let directory = media_dir(&["c.mkv", "a.mp4", "b.wav", "notes.txt", "cover.jpg"]);

    let files = discover(directory.path(), &AnalysisOptions::new()).unwrap();
    assert_eq!(names(&files), ["a.mp4", "b.wav", "c.mkv"]);
    assert!(files.iter().all(|file| file.size == Some(17)));
}

#[test]
fn extension_match_is_case_insensitive() {
    let directory = media_dir(&["LOUD.MP4", "quiet.Mov", "song.Mp3"]);

    let files = discover(directory.path(), &AnalysisOptions::new()).unwrap();
    assert_eq!(files.len(), 3);
}

#[test]
fn discovery_is_idempotent() {
    let directory = media_dir(&["b.mp4", "a.mp4", "c.avi"]);
    let options = AnalysisOptions::new();

    let first = discover(directory.path(), &options).unwrap();
    let second = discover(directory.path(), &options).unwrap();
    assert_eq!(first, second);
}

#[test]
fn empty_directory_is_not_an_error() {
    let directory = media_dir(&["readme.md"]);

    let files = discover(directory.path(), &AnalysisOptions::new()).unwrap();
    assert!(files.is_empty());
}

#[test]
fn subdirectories_skipped_unless_recursive() {
    let directory = media_dir(&["top.mp4", "day1/nested.mp4", "day1/deeper/more.webm"]);

    let flat = discover(directory.path(), &AnalysisOptions::new()).unwrap();
    assert_eq!(names(&flat), ["top.mp4"]);

    let recursive =
        discover(directory.path(), &AnalysisOptions::new().with_recursive(true)).unwrap();
    assert_eq!(recursive.len(), 3);
}

#[test]
fn previous_output_directories_are_excluded() {
    let directory = media_dir(&[
        "talk.mp4",
        "normalized_24dB/talk.mp4",
        "boosted_+10dB/talk.mp4",
        "normalized_archive/old.mp4",
    ]);
    let options = AnalysisOptions::new().with_recursive(true);

    let files = discover(directory.path(), &options).unwrap();
    let paths: Vec<PathBuf> = files.into_iter().map(|file| file.path).collect();
    assert_eq!(
        paths,
        [
            directory.path().join("normalized_archive").join("old.mp4"),
            directory.path().join("talk.mp4"),
        ]
    );

    let included = discover(
        directory.path(),
        &options.with_exclude_output_directories(false),
    )
    .unwrap();
    assert_eq!(included.len(), 4);
}

#[test]
fn custom_extensions() {
    let directory = media_dir(&["a.flac", "b.mp4", "c.FLAC"]);
    let options = AnalysisOptions::new().with_extensions([".flac"]);

    let files = discover(directory.path(), &options).unwrap();
    assert_eq!(names(&files), ["a.flac", "c.FLAC"]);
}

// ── Single files and missing paths ───────────────────────────────

#[test]
fn single_file_yields_itself() {
    let directory = media_dir(&["notes.txt"]);
    let path = directory.path().join("notes.txt");

    let files = discover(&path, &AnalysisOptions::new()).unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, path);
}

#[test]
fn missing_path_is_a_discovery_error() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let missing = directory.path().join("nowhere");

    match discover(&missing, &AnalysisOptions::new()) {
        Err(AudioLevelError::Discovery { path, .. }) => assert_eq!(path, missing),
        other => panic!("Expected Discovery, got: {other:?}"),
    }
}

#[test]
fn directory_named_like_media_is_not_a_file() {
    let directory = media_dir(&["real.mp4"]);
    fs::create_dir(directory.path().join("folder.mp4")).unwrap();

    let files = discover(directory.path(), &AnalysisOptions::new()).unwrap();
    assert_eq!(names(&files), ["real.mp4"]);
}
