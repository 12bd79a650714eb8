//! External media tool invocation.
//!
//! All decoding and re-encoding is delegated to an external `ffmpeg` binary.
//! The [`MediaTool`] trait is the seam between the pipeline and that binary:
//! [`FfmpegTool`] runs the real command, and tests substitute scripted
//! implementations.
//!
//! FFmpeg reports `volumedetect` results through its own log on stderr, so an
//! analysis run must keep FFmpeg's log at `info` or above. [`FfmpegLogLevel`]
//! only applies to the re-encode, where FFmpeg's chatter is noise.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use audiolevel::{FfmpegLogLevel, FfmpegTool};
//!
//! let tool = FfmpegTool::locate()?
//!     .with_timeout(Duration::from_secs(600))
//!     .with_log_level(FfmpegLogLevel::Error);
//! # Ok::<(), audiolevel::AudioLevelError>(())
//! ```

use std::ffi::OsString;
use std::io::{Error as IoError, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::AudioLevelError;

/// FFmpeg's own log verbosity, passed as `-loglevel` to correction runs.
///
/// # Ordering (most verbose → most quiet)
///
/// `Trace` > `Debug` > `Verbose` > `Info` > `Warning` > `Error` > `Fatal` > `Panic` > `Quiet`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FfmpegLogLevel {
    /// Print no output at all.
    Quiet,
    /// Only conditions the process aborts on.
    Panic,
    /// Only unrecoverable errors.
    Fatal,
    /// Recoverable errors. This is the default for corrections.
    #[default]
    Error,
    /// Warnings.
    Warning,
    /// Informational messages.
    Info,
    /// Verbose informational messages.
    Verbose,
    /// Debugging messages.
    Debug,
    /// Extremely verbose tracing output.
    Trace,
}

impl FfmpegLogLevel {
    /// The value FFmpeg expects after `-loglevel`.
    pub fn as_arg(self) -> &'static str {
        match self {
            FfmpegLogLevel::Quiet => "quiet",
            FfmpegLogLevel::Panic => "panic",
            FfmpegLogLevel::Fatal => "fatal",
            FfmpegLogLevel::Error => "error",
            FfmpegLogLevel::Warning => "warning",
            FfmpegLogLevel::Info => "info",
            FfmpegLogLevel::Verbose => "verbose",
            FfmpegLogLevel::Debug => "debug",
            FfmpegLogLevel::Trace => "trace",
        }
    }
}

/// Captured result of one external command.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// `true` when the process exited with status 0.
    pub success: bool,
    /// Exit status as text, for diagnostics.
    pub status: String,
    /// Everything written to stdout.
    pub stdout: String,
    /// Everything written to stderr. FFmpeg writes its reports here.
    pub stderr: String,
}

impl ToolOutput {
    /// Combined diagnostic text: stderr followed by stdout.
    pub fn combined(&self) -> String {
        if self.stdout.is_empty() {
            self.stderr.clone()
        } else if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stderr, self.stdout)
        }
    }

    /// The last `lines` non-empty lines of stderr (stdout if stderr is empty),
    /// joined with ` | `.
    pub fn diagnostic_tail(&self, lines: usize) -> String {
        let source = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        let tail: Vec<&str> = source
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let start = tail.len().saturating_sub(lines);
        tail[start..].join(" | ")
    }
}

/// Operations the pipeline needs from an external media tool.
///
/// Implementations must be [`Send`] and [`Sync`]: one instance is shared by
/// every worker of a batch. Both methods block until the command exits.
/// A spawn failure or timeout is an `Err`; a command that ran and failed is
/// an `Ok` with [`ToolOutput::success`] set to `false`.
pub trait MediaTool: Send + Sync {
    /// Run the loudness analysis on `input` and return its diagnostic text.
    fn analyze(&self, input: &Path) -> Result<ToolOutput, IoError>;

    /// Write a copy of `input` to `output` with `gain_db` applied.
    fn apply_gain(&self, input: &Path, gain_db: f64, output: &Path)
    -> Result<ToolOutput, IoError>;
}

/// [`MediaTool`] backed by an `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegTool {
    binary: PathBuf,
    timeout: Option<Duration>,
    log_level: FfmpegLogLevel,
    audio_codec: String,
    audio_bitrate: String,
}

impl Default for FfmpegTool {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegTool {
    /// Use the given binary name or path without checking that it exists.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout: None,
            log_level: FfmpegLogLevel::default(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
        }
    }

    /// Resolve `ffmpeg` on `PATH`.
    pub fn locate() -> Result<Self, AudioLevelError> {
        Self::locate_binary("ffmpeg")
    }

    /// Resolve a binary name or path, failing with
    /// [`AudioLevelError::ToolNotFound`] when it cannot be executed.
    pub fn locate_binary(binary: impl AsRef<Path>) -> Result<Self, AudioLevelError> {
        let binary = binary.as_ref();
        let resolved = which::which(binary).map_err(|_| AudioLevelError::ToolNotFound {
            tool: binary.display().to_string(),
        })?;
        log::debug!("Using media tool at {}", resolved.display());
        Ok(Self::new(resolved))
    }

    /// Kill commands that run longer than `timeout`. Off by default.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// FFmpeg log level for corrections.
    #[must_use]
    pub fn with_log_level(mut self, level: FfmpegLogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Audio codec for the re-encode (default `aac`).
    #[must_use]
    pub fn with_audio_codec(mut self, codec: impl Into<String>) -> Self {
        self.audio_codec = codec.into();
        self
    }

    /// Audio bitrate for the re-encode (default `192k`).
    #[must_use]
    pub fn with_audio_bitrate(mut self, bitrate: impl Into<String>) -> Self {
        self.audio_bitrate = bitrate.into();
        self
    }

    /// Path of the binary this tool runs.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Configured timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Arguments of the `volumedetect` analysis run.
    pub fn analysis_arguments(&self, input: &Path) -> Vec<OsString> {
        vec![
            "-hide_banner".into(),
            "-nostats".into(),
            "-i".into(),
            input.as_os_str().to_owned(),
            "-af".into(),
            "volumedetect".into(),
            "-vn".into(),
            "-sn".into(),
            "-dn".into(),
            "-f".into(),
            "null".into(),
            "-".into(),
        ]
    }

    /// Arguments of the gain re-encode. Video is stream-copied.
    pub fn correction_arguments(&self, input: &Path, gain_db: f64, output: &Path) -> Vec<OsString> {
        vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            self.log_level.as_arg().into(),
            "-y".into(),
            "-i".into(),
            input.as_os_str().to_owned(),
            "-af".into(),
            format!("volume={gain_db:.2}dB").into(),
            "-c:v".into(),
            "copy".into(),
            "-c:a".into(),
            self.audio_codec.clone().into(),
            "-b:a".into(),
            self.audio_bitrate.clone().into(),
            output.as_os_str().to_owned(),
        ]
    }

    fn run(&self, arguments: Vec<OsString>) -> Result<ToolOutput, IoError> {
        let mut command = Command::new(&self.binary);
        command
            .args(arguments)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        match self.timeout {
            None => {
                let output = command.output()?;
                Ok(collect_output(
                    output.status,
                    &output.stdout,
                    &output.stderr,
                ))
            }
            Some(timeout) => run_with_timeout(command, timeout),
        }
    }
}

impl MediaTool for FfmpegTool {
    fn analyze(&self, input: &Path) -> Result<ToolOutput, IoError> {
        log::debug!("Analyzing {}", input.display());
        self.run(self.analysis_arguments(input))
    }

    fn apply_gain(
        &self,
        input: &Path,
        gain_db: f64,
        output: &Path,
    ) -> Result<ToolOutput, IoError> {
        log::debug!(
            "Applying {gain_db:+.2} dB to {} -> {}",
            input.display(),
            output.display()
        );
        self.run(self.correction_arguments(input, gain_db, output))
    }
}

fn collect_output(status: ExitStatus, stdout: &[u8], stderr: &[u8]) -> ToolOutput {
    ToolOutput {
        success: status.success(),
        status: status.to_string(),
        stdout: String::from_utf8_lossy(stdout).into_owned(),
        stderr: String::from_utf8_lossy(stderr).into_owned(),
    }
}

/// Poll the child until it exits or `timeout` elapses. Pipes are drained on
/// their own threads so a chatty child cannot block on a full pipe.
fn run_with_timeout(mut command: Command, timeout: Duration) -> Result<ToolOutput, IoError> {
    let mut child = command.spawn()?;
    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| IoError::other("stdout was not captured"))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| IoError::other("stderr was not captured"))?;

    let stdout_thread = thread::spawn(move || {
        let mut buffer = Vec::new();
        stdout_pipe.read_to_end(&mut buffer).map(|_| buffer)
    });
    let stderr_thread = thread::spawn(move || {
        let mut buffer = Vec::new();
        stderr_pipe.read_to_end(&mut buffer).map(|_| buffer)
    });

    let start = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if start.elapsed() > timeout {
            let _ = child.kill();
            let _ = child.wait();
            let _ = stdout_thread.join();
            let _ = stderr_thread.join();
            return Err(IoError::new(
                ErrorKind::TimedOut,
                format!("command timed out after {}s", timeout.as_secs()),
            ));
        }
        thread::sleep(Duration::from_millis(25));
    };

    let stdout = stdout_thread
        .join()
        .map_err(|_| IoError::other("stdout reader panicked"))??;
    let stderr = stderr_thread
        .join()
        .map_err(|_| IoError::other("stderr reader panicked"))??;

    Ok(collect_output(status, &stdout, &stderr))
}
