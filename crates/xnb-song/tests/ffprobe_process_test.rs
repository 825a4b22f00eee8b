//! Process tests for `FfprobeProbe`: stand-in `ffprobe` shell scripts cover the
//! success, non-zero exit, garbage output, and hung-process paths.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use xnb_format::XnbReader;
use xnb_song::{DurationProbe, DurationResolver, DurationSource, FfprobeProbe, ProbeConfig, SongBatch};

/// Scripts are written and spawned under this lock so no other test forks
/// while a script is still open for writing.
static SPAWN_LOCK: Mutex<()> = Mutex::new(());

/// Write an executable stand-in for ffprobe with the given shell body.
fn fake_ffprobe(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("ffprobe");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn probe_with(exe: PathBuf, timeout: Duration) -> FfprobeProbe {
    FfprobeProbe::new(ProbeConfig {
        ffprobe_path: Some(exe),
        timeout,
    })
}

#[test]
fn test_reported_seconds_become_milliseconds() {
    let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir().unwrap();
    let exe = fake_ffprobe(dir.path(), "echo 12.345");

    let probe = probe_with(exe, Duration::from_secs(10));
    assert_eq!(probe.probe_ms(Path::new("track.wav")), Some(12_345));
}

#[test]
fn test_arguments_request_only_the_duration() {
    let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir().unwrap();
    let args_file = dir.path().join("args.txt");
    let exe = fake_ffprobe(
        dir.path(),
        &format!(
            "printf '%s\\n' \"$@\" > '{}'\necho 1.0\necho 'noise' >&2",
            args_file.display()
        ),
    );

    let input = dir.path().join("my track.ogg");
    let probe = probe_with(exe, Duration::from_secs(10));
    assert_eq!(probe.probe_ms(&input), Some(1_000));

    let args = std::fs::read_to_string(&args_file).unwrap();
    let args: Vec<&str> = args.lines().collect();
    assert_eq!(
        args,
        vec![
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
            input.to_str().unwrap(),
        ]
    );
}

#[test]
fn test_non_zero_exit_is_no_result() {
    let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir().unwrap();
    let exe = fake_ffprobe(dir.path(), "echo 5.0\nexit 1");

    let probe = probe_with(exe, Duration::from_secs(10));
    assert_eq!(probe.probe_ms(Path::new("track.wav")), None);
}

#[test]
fn test_unparsable_output_is_no_result() {
    let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir().unwrap();
    let exe = fake_ffprobe(dir.path(), "echo N/A");

    let probe = probe_with(exe, Duration::from_secs(10));
    assert_eq!(probe.probe_ms(Path::new("track.wav")), None);
}

#[test]
fn test_hung_probe_times_out() {
    let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir().unwrap();
    let exe = fake_ffprobe(dir.path(), "exec sleep 30");

    let probe = probe_with(exe, Duration::from_millis(200));
    let started = Instant::now();
    assert_eq!(probe.probe_ms(Path::new("track.wav")), None);
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[test]
fn test_output_held_open_after_exit_times_out() {
    let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir().unwrap();
    // The backgrounded sleep inherits stdout and keeps the pipe open after
    // the script itself has exited successfully.
    let exe = fake_ffprobe(dir.path(), "sleep 5 &\necho 1.0");

    let probe = probe_with(exe, Duration::from_millis(200));
    let started = Instant::now();
    assert_eq!(probe.probe_ms(Path::new("track.wav")), None);
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[test]
fn test_batch_uses_probe_duration() {
    let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir().unwrap();
    let exe = fake_ffprobe(dir.path(), "echo 3.000000");
    let input = dir.path().join("track.wav");
    std::fs::write(&input, b"RIFF").unwrap();

    let resolver = DurationResolver::new(Box::new(probe_with(exe, Duration::from_secs(10))));
    let report = SongBatch::new(resolver).run(&[&input]);

    assert!(report.all_succeeded());
    match &report.files[0].outcome {
        xnb_song::FileOutcome::Created { source, .. } => assert_eq!(*source, DurationSource::Probe),
        other => panic!("unexpected outcome: {other:?}"),
    }
    let song = XnbReader::open(&dir.path().join("track.xnb")).unwrap();
    assert_eq!(song.duration_ms, 3000);
}
