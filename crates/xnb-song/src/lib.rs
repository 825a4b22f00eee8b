//! # xnb-song
//!
//! Turns audio files into Song `.xnb` containers.
//!
//! - [`source`]: which inputs are accepted and which become Songs
//! - [`probe`]: clip durations from `ffprobe`
//! - [`prompt`]: interactive questions behind the [`Prompt`] trait
//! - [`resolver`]: probe, then prompt, then 0
//! - [`batch`]: per-file resolve + encode with a report
//!
//! ```rust,no_run
//! use xnb_song::{DurationResolver, FfprobeProbe, SongBatch};
//!
//! let resolver = DurationResolver::new(Box::new(FfprobeProbe::default()));
//! let report = SongBatch::new(resolver).run(&["music/track.wav"]);
//! assert!(report.all_succeeded());
//! ```

pub mod batch;
pub mod probe;
pub mod prompt;
pub mod resolver;
pub mod source;

pub use batch::{BatchReport, FileOutcome, FileReport, SongBatch};
pub use probe::{DurationProbe, FfprobeProbe, ProbeConfig, DEFAULT_PROBE_TIMEOUT};
pub use prompt::{ask_duration_ms, ask_task, ConsolePrompt, Prompt};
pub use resolver::{DurationResolver, DurationSource, Resolution};
pub use source::{collect_inputs, is_accepted, is_song_encodable, AudioSourceFile, TaskType};
