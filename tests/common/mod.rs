//! Shared helpers for integration tests: a scripted [`MediaTool`] and
//! temporary media directories.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::io::{Error as IoError, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use audiolevel::{MediaTool, ToolOutput};
use tempfile::TempDir;

/// What the fake tool does for one file name.
#[derive(Debug, Clone)]
pub enum Script {
    /// Report these levels after an optional delay.
    Levels {
        mean_db: f64,
        peak_db: f64,
        delay: Duration,
    },
    /// Exit non-zero with this stderr.
    Fail(String),
    /// Exit zero without volumedetect markers.
    NoAudio,
    /// The command cannot be spawned at all.
    SpawnError,
}

/// A gain application the fake tool was asked to perform.
#[derive(Debug, Clone, PartialEq)]
pub struct GainCall {
    pub input: PathBuf,
    pub gain_db: f64,
    pub output: PathBuf,
}

/// [`MediaTool`] driven by per-file scripts instead of a real binary.
#[derive(Default)]
pub struct ScriptedTool {
    scripts: HashMap<String, Script>,
    failing_corrections: Vec<String>,
    pub gain_calls: Mutex<Vec<GainCall>>,
}

impl ScriptedTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn levels(mut self, name: &str, mean_db: f64, peak_db: f64) -> Self {
        self.scripts.insert(
            name.to_string(),
            Script::Levels {
                mean_db,
                peak_db,
                delay: Duration::ZERO,
            },
        );
        self
    }

    pub fn delayed_levels(
        mut self,
        name: &str,
        mean_db: f64,
        peak_db: f64,
        delay: Duration,
    ) -> Self {
        self.scripts.insert(
            name.to_string(),
            Script::Levels {
                mean_db,
                peak_db,
                delay,
            },
        );
        self
    }

    pub fn script(mut self, name: &str, script: Script) -> Self {
        self.scripts.insert(name.to_string(), script);
        self
    }

    /// Make `apply_gain` fail for this file name, after writing a partial
    /// output.
    pub fn failing_correction(mut self, name: &str) -> Self {
        self.failing_corrections.push(name.to_string());
        self
    }

    pub fn calls(&self) -> Vec<GainCall> {
        self.gain_calls.lock().unwrap().clone()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn volumedetect_report(mean_db: f64, peak_db: f64) -> String {
    format!(
        "Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'clip.mp4':\n\
         [Parsed_volumedetect_0 @ 0x55d0c8f0] n_samples: 1323000\n\
         [Parsed_volumedetect_0 @ 0x55d0c8f0] mean_volume: {mean_db:.1} dB\n\
         [Parsed_volumedetect_0 @ 0x55d0c8f0] max_volume: {peak_db:.1} dB\n\
         [Parsed_volumedetect_0 @ 0x55d0c8f0] histogram_4db: 12\n"
    )
}

fn exit(success: bool, stderr: String) -> ToolOutput {
    ToolOutput {
        success,
        status: if success {
            "exit status: 0".to_string()
        } else {
            "exit status: 1".to_string()
        },
        stdout: String::new(),
        stderr,
    }
}

impl MediaTool for ScriptedTool {
    fn analyze(&self, input: &Path) -> Result<ToolOutput, IoError> {
        match self.scripts.get(&file_name(input)) {
            Some(Script::Levels {
                mean_db,
                peak_db,
                delay,
            }) => {
                thread::sleep(*delay);
                Ok(exit(true, volumedetect_report(*mean_db, *peak_db)))
            }
            Some(Script::Fail(stderr)) => Ok(exit(false, stderr.clone())),
            Some(Script::NoAudio) | None => Ok(exit(
                true,
                "Output file #0 does not contain any stream\n".to_string(),
            )),
            Some(Script::SpawnError) => Err(IoError::new(ErrorKind::NotFound, "no such binary")),
        }
    }

    fn apply_gain(&self, input: &Path, gain_db: f64, output: &Path) -> Result<ToolOutput, IoError> {
        self.gain_calls.lock().unwrap().push(GainCall {
            input: input.to_path_buf(),
            gain_db,
            output: output.to_path_buf(),
        });

        fs::write(output, b"corrected")?;

        if self.failing_corrections.contains(&file_name(input)) {
            return Ok(exit(
                false,
                "Error while opening encoder\nConversion failed!\n".to_string(),
            ));
        }
        Ok(exit(true, String::new()))
    }
}

/// A temporary directory holding one small placeholder file per name.
pub fn media_dir(names: &[&str]) -> TempDir {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    for name in names {
        let path = directory.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, b"placeholder media").expect("Failed to write media file");
    }
    directory
}
