//! Duration probing through an external `ffprobe` executable.
//!
//! Every failure mode (no executable, spawn error, non-zero exit, timeout,
//! unparsable output) yields `None`. Nothing here returns an error.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

/// Name of the probing executable.
pub const FFPROBE_NAME: &str = "ffprobe";

/// How long a single probe may run before it is killed.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Arguments asking for the container duration in seconds, nothing else.
const FFPROBE_ARGS: [&str; 6] = [
    "-v",
    "error",
    "-show_entries",
    "format=duration",
    "-of",
    "default=noprint_wrappers=1:nokey=1",
];

/// Source of clip durations.
pub trait DurationProbe {
    /// Duration of the media file at `path` in whole milliseconds, if known.
    fn probe_ms(&self, path: &Path) -> Option<i64>;
}

/// Probe configuration.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Explicit executable to use instead of searching for one.
    pub ffprobe_path: Option<PathBuf>,
    pub timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ffprobe_path: None,
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

/// [`DurationProbe`] backed by `ffprobe`.
#[derive(Debug, Clone, Default)]
pub struct FfprobeProbe {
    config: ProbeConfig,
}

impl FfprobeProbe {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }
}

impl DurationProbe for FfprobeProbe {
    fn probe_ms(&self, path: &Path) -> Option<i64> {
        let exe = locate_ffprobe(self.config.ffprobe_path.as_deref())?;
        tracing::debug!(ffprobe = %exe.display(), input = %path.display(), "Probing duration");

        let stdout = run_ffprobe(&exe, path, self.config.timeout)?;
        let duration = parse_duration_output(&stdout);
        if duration.is_none() {
            tracing::warn!(
                input = %path.display(),
                output = %stdout.trim(),
                "ffprobe output is not a usable duration"
            );
        }
        duration
    }
}

/// Find the `ffprobe` executable.
///
/// Order: `override_path` if given (and nothing else), then `ffprobe.exe` or
/// `ffprobe` next to the running executable, then `ffprobe` on `PATH`.
pub fn locate_ffprobe(override_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = override_path {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        tracing::warn!(path = %path.display(), "Configured ffprobe does not exist");
        return None;
    }

    if let Some(sibling) = sibling_ffprobe() {
        return Some(sibling);
    }

    match which::which(FFPROBE_NAME) {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::debug!(error = %e, "ffprobe not found on PATH");
            None
        }
    }
}

fn sibling_ffprobe() -> Option<PathBuf> {
    let current_exe = std::env::current_exe().ok()?;
    let exe_dir = current_exe.parent()?;
    ["ffprobe.exe", FFPROBE_NAME]
        .iter()
        .map(|name| exe_dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Run `exe` on `input` and return its stdout if it exits successfully in time.
fn run_ffprobe(exe: &Path, input: &Path, timeout: Duration) -> Option<String> {
    let mut child = match Command::new(exe)
        .args(FFPROBE_ARGS)
        .arg(input)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            tracing::warn!(ffprobe = %exe.display(), error = %e, "Failed to start ffprobe");
            return None;
        }
    };

    // Drain stdout on its own thread so a chatty child cannot block on a full
    // pipe. The pipe can outlive the child (a backgrounded grandchild keeps it
    // open), so the text is received against the same deadline.
    let (tx, rx) = mpsc::channel();
    if let Some(mut out) = child.stdout.take() {
        thread::spawn(move || {
            let mut text = String::new();
            let read = out.read_to_string(&mut text).map(|_| text);
            // The receiver is gone once the deadline has passed.
            let _ = tx.send(read);
        });
    }

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                tracing::warn!(
                    input = %input.display(),
                    timeout_ms = timeout.as_millis() as u64,
                    "ffprobe timed out; killing it"
                );
                reap(&mut child);
                return None;
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to wait for ffprobe");
                reap(&mut child);
                return None;
            }
        }
    };

    if !status.success() {
        tracing::debug!(code = ?status.code(), input = %input.display(), "ffprobe exited with failure");
        return None;
    }

    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(Ok(text)) => Some(text),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Failed to read ffprobe output");
            None
        }
        Err(RecvTimeoutError::Timeout) => {
            tracing::warn!(
                input = %input.display(),
                timeout_ms = timeout.as_millis() as u64,
                "ffprobe output still open after exit; giving up"
            );
            None
        }
        Err(RecvTimeoutError::Disconnected) => None,
    }
}

fn reap(child: &mut Child) {
    if let Err(e) = child.kill() {
        tracing::debug!(error = %e, "ffprobe kill failed");
    }
    if let Err(e) = child.wait() {
        tracing::debug!(error = %e, "ffprobe wait failed");
    }
}

/// Parse `ffprobe` output (seconds as plain text) into whole milliseconds.
///
/// Parsing is locale-independent (`.` is the only decimal separator). NaN,
/// infinite, negative, and values beyond the 32-bit millisecond range give `None`.
pub fn parse_duration_output(stdout: &str) -> Option<i64> {
    let seconds: f64 = stdout.trim().parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    let ms = (seconds * 1000.0).round();
    if ms > f64::from(i32::MAX) {
        return None;
    }
    Some(ms as i64)
}
