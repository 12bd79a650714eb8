use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use audiolevel::{
    AnalysisOptions, BatchAnalyzer, BatchResult, CorrectionMode, CorrectionStatus,
    DEFAULT_PARALLELISM, FfmpegLogLevel, FfmpegTool, OperationType, ProgressCallback,
    ProgressInfo, ReportSelection, Summary, summarize, write_reports,
};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

const CLI_AFTER_HELP: &str = "Examples:\n  audiolevel talk.mp4\n  audiolevel ./videos/\n  audiolevel ./videos/ --csv --json\n  audiolevel ./videos/ --normalize -24\n  audiolevel ./videos/ --boost 10 --jobs 8\n  audiolevel --completions zsh > _audiolevel";

#[derive(Debug, Parser)]
#[command(
    name = "audiolevel",
    version,
    about = "Measure, classify and correct the loudness of media files",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Media file or directory to analyze.
    #[arg(required_unless_present = "completions")]
    input: Option<PathBuf>,

    /// Also export audio_report.csv.
    #[arg(long)]
    csv: bool,

    /// Also export audio_report.json.
    #[arg(long)]
    json: bool,

    /// Do not write audio_report.html.
    #[arg(long)]
    no_html: bool,

    /// Normalize every file to this mean level (dB, e.g. -24).
    #[arg(long, value_name = "DB", allow_negative_numbers = true, conflicts_with = "boost")]
    normalize: Option<f64>,

    /// Apply a fixed gain to every file (dB, e.g. 10).
    #[arg(long, value_name = "DB", allow_negative_numbers = true)]
    boost: Option<f64>,

    /// Descend into subdirectories.
    #[arg(long)]
    recursive: bool,

    /// Also analyze files inside normalized_*dB / boosted_*dB directories.
    #[arg(long)]
    include_output_dirs: bool,

    /// Number of files processed in parallel.
    #[arg(short, long, default_value_t = DEFAULT_PARALLELISM)]
    jobs: usize,

    /// FFmpeg binary name or path.
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// Kill an FFmpeg run after this many seconds.
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// FFmpeg log level for corrections (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long)]
    log_level: Option<String>,

    /// Show additional logging output.
    #[arg(long)]
    verbose: bool,

    /// Hide the progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Print a shell completion script and exit.
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<Shell>,
}

fn parse_log_level(value: &str) -> Option<FfmpegLogLevel> {
    match value.to_ascii_lowercase().as_str() {
        "quiet" => Some(FfmpegLogLevel::Quiet),
        "panic" => Some(FfmpegLogLevel::Panic),
        "fatal" => Some(FfmpegLogLevel::Fatal),
        "error" => Some(FfmpegLogLevel::Error),
        "warning" | "warn" => Some(FfmpegLogLevel::Warning),
        "info" => Some(FfmpegLogLevel::Info),
        "verbose" => Some(FfmpegLogLevel::Verbose),
        "debug" => Some(FfmpegLogLevel::Debug),
        "trace" => Some(FfmpegLogLevel::Trace),
        _ => None,
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn build_tool(cli: &Cli) -> Result<FfmpegTool, Box<dyn std::error::Error>> {
    let mut tool = FfmpegTool::locate_binary(&cli.ffmpeg)?;

    if let Some(level) = &cli.log_level {
        let parsed = parse_log_level(level).ok_or(format!("unsupported --log-level: {level}"))?;
        tool = tool.with_log_level(parsed);
    }

    if let Some(seconds) = cli.timeout {
        if seconds == 0 {
            return Err("--timeout must be greater than 0".into());
        }
        tool = tool.with_timeout(Duration::from_secs(seconds));
    }

    Ok(tool)
}

struct TerminalProgress {
    measurement: ProgressBar,
    correction: Option<ProgressBar>,
}

impl TerminalProgress {
    fn new(with_correction: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let bars = MultiProgress::new();
        let style = ProgressStyle::with_template(
            "{spinner:.green} {prefix:>9} {bar:40.cyan/blue} {pos}/{len} {msg}",
        )?
        .progress_chars("##-");

        let measurement = bars.add(ProgressBar::new(0));
        measurement.set_style(style.clone());
        measurement.set_prefix("measuring");

        let correction = with_correction.then(|| {
            let bar = bars.add(ProgressBar::new(0));
            bar.set_style(style);
            bar.set_prefix("correcting");
            bar
        });

        Ok(Self {
            measurement,
            correction,
        })
    }

    fn finish(&self) {
        self.measurement.finish_and_clear();
        if let Some(bar) = &self.correction {
            bar.finish_and_clear();
        }
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let bar = match info.operation {
            OperationType::Correction => match &self.correction {
                Some(bar) => bar,
                None => return,
            },
            _ => &self.measurement,
        };

        bar.set_length(info.total);
        bar.set_position(info.current);
        if let Some(name) = info.current_file.as_deref().and_then(Path::file_name) {
            bar.set_message(name.to_string_lossy().into_owned());
        }
    }
}

fn print_single_file(result: &BatchResult) {
    let Some(record) = result.records.first() else {
        return;
    };

    match (record.measurement(), record.tier()) {
        (Some(measurement), Some(tier)) => {
            println!("{} {}", "ok".green().bold(), record.file.display_name());
            println!("   mean level: {:.1} dB", measurement.mean_db);
            println!("   peak level: {:.1} dB", measurement.peak_db);
            println!("   {} {}", tier.glyph(), tier.label().bold());
        }
        _ => {
            eprintln!(
                "{} {}: {}",
                "failed:".red().bold(),
                record.file.display_name(),
                record.error().unwrap_or("unknown error")
            );
        }
    }
}

fn print_summary(result: &BatchResult, summary: &Summary) {
    println!(
        "{} {} file(s) analyzed",
        "done:".green().bold(),
        summary.succeeded
    );
    if summary.failed > 0 {
        println!("   {} error(s)", summary.failed.to_string().red());
    }
    for line in summary.to_string().lines().skip(1) {
        println!("   {line}");
    }

    for record in result.failures() {
        eprintln!(
            "{} {}: {}",
            "failed:".red().bold(),
            record.file.display_name(),
            record.error().unwrap_or("unknown error")
        );
    }
}

fn print_corrections(result: &BatchResult, mode: CorrectionMode) {
    println!("{} {mode}", "correction:".cyan().bold());

    for record in &result.records {
        match &record.correction {
            Some(CorrectionStatus::Written(outcome)) => {
                println!(
                    "   {} {} ({:+.1} dB)",
                    "wrote".green(),
                    outcome.output.display(),
                    outcome.gain_db
                );
                if let Some(warning) = &outcome.clipping {
                    eprintln!("{} {warning}", "warning:".yellow().bold());
                }
            }
            Some(CorrectionStatus::Failed { error }) => {
                eprintln!(
                    "{} {}: {error}",
                    "failed:".red().bold(),
                    record.file.display_name()
                );
            }
            None => {}
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut command = Cli::command();
        clap_complete::generate(shell, &mut command, "audiolevel", &mut std::io::stdout());
        return Ok(());
    }

    init_logging(cli.verbose);

    let input = cli.input.clone().ok_or("an input path is required")?;
    if !input.exists() {
        return Err(format!("path not found: {}", input.display()).into());
    }

    let correction = CorrectionMode::from_flags(cli.normalize, cli.boost)?;
    let tool = build_tool(&cli)?;

    let mut options = AnalysisOptions::new()
        .with_parallelism(cli.jobs)
        .with_recursive(cli.recursive)
        .with_exclude_output_directories(!cli.include_output_dirs);
    if let Some(mode) = correction {
        options = options.with_correction(mode);
    }

    let single_file = input.is_file();
    let progress = if cli.no_progress || single_file {
        None
    } else {
        Some(Arc::new(TerminalProgress::new(correction.is_some())?))
    };
    if let Some(progress) = &progress {
        options = options.with_progress(progress.clone());
    }

    if single_file {
        println!("Analyzing {}...", input.display());
    } else {
        println!("Scanning {}", input.display());
    }

    let analyzer = BatchAnalyzer::new(tool, options);
    let result = analyzer.run(&input)?;

    if let Some(progress) = &progress {
        progress.finish();
    }

    let summary = summarize(&result);

    if single_file {
        print_single_file(&result);
    } else {
        print_summary(&result, &summary);

        let selection = ReportSelection {
            html: !cli.no_html,
            csv: cli.csv,
            json: cli.json,
        };
        for path in write_reports(&result, &summary, &input, selection)? {
            println!("{} {}", "saved".green().bold(), path.display());
        }
    }

    if let Some(mode) = correction {
        print_corrections(&result, mode);
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
