//! xnbverter: wraps audio files in Song `.xnb` containers.
//!
//! Each input gets a `.xnb` file next to it holding the clip's file name and
//! duration. Durations come from `ffprobe` when it is available, otherwise
//! from the user (interactive runs) or 0.
//!
//! # Usage
//!
//! ```bash
//! xnbverter track.wav intro.ogg --output-type song
//! xnbverter music/*.mp3 -t song --non-interactive --ffprobe /opt/ffmpeg/ffprobe
//! xnbverter info track.xnb
//! xnbverter info track.xnb --json
//! ```

use std::ffi::OsString;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};

use xnb_format::{SongXnb, XnbReader};
use xnb_song::{
    ask_task, collect_inputs, is_song_encodable, BatchReport, ConsolePrompt, DurationResolver,
    FfprobeProbe, FileOutcome, Prompt, ProbeConfig, SongBatch, TaskType,
};

// ───────────────────────────── CLI definition ─────────────────────────────

/// Top-level CLI entry point for the `xnbverter` binary.
#[derive(Parser)]
#[command(
    name = "xnbverter",
    about = "Wrap audio files (.wav, .mp3, .ogg, .wma) in Song .xnb containers",
    version,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    convert: ConvertArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options for the default conversion run.
#[derive(Args)]
struct ConvertArgs {
    /// Audio files to convert. Unsupported or missing files are ignored.
    files: Vec<PathBuf>,

    /// Conversion to perform ("song"). Asked interactively when omitted.
    #[arg(short = 't', long, alias = "output_type", value_name = "TYPE")]
    output_type: Option<TaskType>,

    /// Path to the ffprobe executable used to read clip durations.
    #[arg(long, env = "XNBVERTER_FFPROBE", value_name = "PATH")]
    ffprobe: Option<PathBuf>,

    /// Seconds a single ffprobe run may take before it is abandoned.
    #[arg(
        long,
        env = "XNBVERTER_PROBE_TIMEOUT",
        value_name = "SECS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    probe_timeout: u64,

    /// Never prompt; unknown durations become 0.
    #[arg(long)]
    non_interactive: bool,
}

impl ConvertArgs {
    /// Prompting needs a terminal on both ends.
    fn interactive(&self) -> bool {
        !self.non_interactive && io::stdin().is_terminal() && io::stdout().is_terminal()
    }

    fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            ffprobe_path: self.ffprobe.clone(),
            timeout: Duration::from_secs(self.probe_timeout),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Display the contents of a Song .xnb file.
    Info {
        /// Input .xnb file path.
        input: PathBuf,

        /// Output file information as JSON.
        #[arg(long)]
        json: bool,
    },
}

// ────────────────────────────── main ──────────────────────────────

fn main() -> Result<ExitCode> {
    let cli = Cli::parse_from(legacy_flags(std::env::args_os()));

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Info { input, json }) => {
            cmd_info(&input, json)?;
            Ok(ExitCode::SUCCESS)
        }
        None => cmd_convert(&cli.convert),
    }
}

// ──────────────────────────── convert ──────────────────────────────

fn cmd_convert(args: &ConvertArgs) -> Result<ExitCode> {
    println!("XNBVerter {}", env!("CARGO_PKG_VERSION"));
    println!();

    let interactive = args.interactive();

    let files = collect_inputs(&args.files);
    if files.is_empty() {
        Cli::command().print_help()?;
        println!();
        return Ok(ExitCode::FAILURE);
    }

    let task = match args.output_type {
        Some(task) => task,
        None if interactive => {
            ask_task(&mut ConsolePrompt::stdio()).context("Failed to read the task selection")?
        }
        None => TaskType::None,
    };

    let report = match task {
        TaskType::Song => run_song_task(&files, args.probe_config(), interactive),
        TaskType::None => {
            println!("No tasks selected. Exiting.");
            return Ok(ExitCode::FAILURE);
        }
    };

    println!();
    println!(
        "{} created, {} skipped, {} failed",
        report.created(),
        report.skipped(),
        report.failed()
    );

    if interactive {
        wait_for_enter()?;
    }

    if report.all_succeeded() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Convert every input, printing progress as each one finishes.
fn run_song_task(files: &[PathBuf], config: ProbeConfig, interactive: bool) -> BatchReport {
    tracing::debug!(
        files = files.len(),
        ffprobe = ?config.ffprobe_path,
        timeout_secs = config.timeout.as_secs(),
        interactive,
        "Starting Song conversion"
    );

    let mut resolver = DurationResolver::new(Box::new(FfprobeProbe::new(config)));
    if interactive {
        resolver = resolver.with_prompt(Box::new(ConsolePrompt::stdio()));
    }
    let mut batch = SongBatch::new(resolver);

    let mut report = BatchReport::default();
    for file in files {
        let name = display_name(file);
        if is_song_encodable(file) {
            println!("Creating Song XNB for {name}...");
        }

        let file_report = batch.process_file(file);
        match &file_report.outcome {
            FileOutcome::Created {
                output,
                duration_ms,
                source,
            } => println!(
                "  Created {} ({duration_ms} ms, {source})",
                output.display()
            ),
            FileOutcome::Skipped => println!("Skipping {name}: already an .xnb file"),
            FileOutcome::Failed(message) => println!("  Failed: {message}"),
        }
        report.files.push(file_report);
    }
    report
}

fn wait_for_enter() -> Result<()> {
    let mut prompt = ConsolePrompt::stdio();
    prompt
        .ask_line("Press Enter to exit.")
        .context("Failed to read from stdin")?;
    Ok(())
}

// ───────────────────────────── info ───────────────────────────────

/// Parse and display a Song `.xnb` file.
fn cmd_info(input: &Path, json: bool) -> Result<()> {
    let song = XnbReader::open(input)
        .with_context(|| format!("Failed to read Song XNB file: {}", input.display()))?;

    if json {
        let value = info_json(input, &song);
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print_info(input, &song);
    }
    Ok(())
}

fn info_json(path: &Path, song: &SongXnb) -> serde_json::Value {
    let readers: Vec<serde_json::Value> = song
        .readers
        .iter()
        .map(|r| {
            serde_json::json!({
                "name": r.name,
                "version": r.version,
            })
        })
        .collect();

    serde_json::json!({
        "file": path.display().to_string(),
        "header": {
            "magic": "XNB",
            "platform": song.header.platform_char().to_string(),
            "version": song.header.version,
            "flags": song.header.flags.0,
            "file_size": song.header.file_size,
        },
        "readers": readers,
        "shared_resource_count": song.shared_resource_count,
        "file_name": song.file_name,
        "duration_ms": song.duration_ms,
    })
}

fn print_info(path: &Path, song: &SongXnb) {
    println!();
    println!("  Song XNB Information");
    println!("  ============================================");
    println!("  File:     {}", path.display());
    println!("  Size:     {} bytes", song.header.file_size);
    println!("  Platform: {}", song.header.platform_char());
    println!("  Version:  {}", song.header.version);
    println!("  Flags:    0x{:02x}", song.header.flags.0);
    println!();
    println!("  Type readers:");
    for (i, reader) in song.readers.iter().enumerate() {
        println!(
            "    [{}] {} (version {})",
            i + 1,
            reader.name,
            reader.version
        );
    }
    println!("  Shared resources: {}", song.shared_resource_count);
    println!();
    println!("  Song:     {}", song.file_name);
    println!(
        "  Duration: {} ms ({:.3}s)",
        song.duration_ms,
        f64::from(song.duration_ms) / 1000.0
    );
    println!();
}

// ──────────────────────── helper functions ─────────────────────────

/// Single-dash spellings of `--output-type` accepted by earlier releases.
const LEGACY_OUTPUT_TYPE_FLAGS: [&str; 2] = ["-ot", "-output_type"];

/// Rewrite legacy single-dash flags clap cannot express into their long form.
/// Everything after a bare `--` is left alone.
fn legacy_flags(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    let mut positional_only = false;
    args.into_iter()
        .map(|arg| {
            if arg == "--" {
                positional_only = true;
            }
            if !positional_only && LEGACY_OUTPUT_TYPE_FLAGS.iter().any(|flag| arg == *flag) {
                OsString::from("--output-type")
            } else {
                arg
            }
        })
        .collect()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os_args(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_legacy_flags_rewritten() {
        let args = legacy_flags(os_args(&["xnbverter", "a.wav", "-ot", "song"]));
        assert_eq!(args, os_args(&["xnbverter", "a.wav", "--output-type", "song"]));

        let args = legacy_flags(os_args(&["xnbverter", "-output_type", "song", "a.wav"]));
        assert_eq!(args, os_args(&["xnbverter", "--output-type", "song", "a.wav"]));
    }

    #[test]
    fn test_legacy_flags_leave_other_args_alone() {
        let original = os_args(&["xnbverter", "-t", "song", "-otter.wav", "--", "-ot"]);
        assert_eq!(legacy_flags(original.clone()), original);
    }

    #[test]
    fn test_legacy_flags_parse() {
        let cli = Cli::parse_from(legacy_flags(os_args(&["xnbverter", "a.wav", "-ot", "SONG"])));
        assert_eq!(cli.convert.output_type, Some(TaskType::Song));
        assert_eq!(cli.convert.files, vec![PathBuf::from("a.wav")]);
    }
}
