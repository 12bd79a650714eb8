//! Input discovery.
//!
//! [`discover`] turns the user's input path into the ordered list of
//! [`MediaFile`]s a batch will process. A file path yields itself; a directory
//! yields every file with a supported extension (case-insensitive), sorted by
//! path so two runs over an unchanged directory produce the same order.
//!
//! Directories written by a previous correction run (`normalized_*dB`,
//! `boosted_*dB`) are skipped unless
//! [`AnalysisOptions::with_exclude_output_directories`](crate::AnalysisOptions::with_exclude_output_directories)
//! turns that off.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::configuration::AnalysisOptions;
use crate::correction::is_output_directory_name;
use crate::error::AudioLevelError;

/// Video container extensions analyzed by default.
pub const VIDEO_EXTENSIONS: [&str; 5] = ["mp4", "mkv", "avi", "mov", "webm"];

/// Audio file extensions analyzed by default.
pub const AUDIO_EXTENSIONS: [&str; 3] = ["mp3", "wav", "m4a"];

/// A discovered input file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MediaFile {
    /// Path as discovered (relative inputs stay relative).
    pub path: PathBuf,
    /// Size in bytes, informational only.
    pub size: Option<u64>,
}

impl MediaFile {
    /// A file with unknown size.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            size: None,
        }
    }

    /// File name for display, falling back to the full path.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Returns `true` when `path` has one of `extensions` (compared
/// case-insensitively, without the dot).
pub fn has_supported_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    path.extension()
        .map(|extension| extension.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|extension| {
            extensions
                .iter()
                .any(|candidate| candidate.as_ref().eq_ignore_ascii_case(&extension))
        })
}

/// List the media files under `input`.
///
/// Fails with [`AudioLevelError::Discovery`] only when `input` does not exist
/// or cannot be read at all. Unreadable entries below it are logged and
/// skipped. An empty result is not an error.
pub fn discover(
    input: &Path,
    options: &AnalysisOptions,
) -> Result<Vec<MediaFile>, AudioLevelError> {
    let discovery_error = |reason: String| AudioLevelError::Discovery {
        path: input.to_path_buf(),
        reason,
    };

    let metadata = input.metadata().map_err(|error| discovery_error(error.to_string()))?;

    if metadata.is_file() {
        return Ok(vec![MediaFile {
            path: input.to_path_buf(),
            size: Some(metadata.len()),
        }]);
    }

    if !metadata.is_dir() {
        return Err(discovery_error("not a file or directory".to_string()));
    }

    let max_depth = if options.recursive { usize::MAX } else { 1 };
    let exclude_outputs = options.exclude_output_directories;

    let walker = WalkDir::new(input)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| !(exclude_outputs && is_output_directory(entry)));

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) if error.depth() == 0 => {
                return Err(discovery_error(error.to_string()));
            }
            Err(error) => {
                log::warn!("Skipping unreadable entry: {error}");
                continue;
            }
        };

        if !entry.file_type().is_file()
            || !has_supported_extension(entry.path(), &options.extensions)
        {
            continue;
        }

        files.push(MediaFile {
            path: entry.path().to_path_buf(),
            size: entry.metadata().ok().map(|metadata| metadata.len()),
        });
    }

    files.sort_by(|left, right| left.path.cmp(&right.path));
    log::info!("Discovered {} media file(s) in {}", files.len(), input.display());

    Ok(files)
}

fn is_output_directory(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && is_output_directory_name(&entry.file_name().to_string_lossy())
}
