//! Input files and tasks: which paths are accepted and which become Songs.

use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Extensions accepted as input (case-insensitive).
pub const ACCEPTED_EXTENSIONS: [&str; 5] = ["wav", "mp3", "ogg", "wma", "xnb"];

/// Extensions that can be wrapped in a Song container.
pub const SONG_EXTENSIONS: [&str; 4] = ["wav", "mp3", "ogg", "wma"];

fn extension_in(path: &Path, allowed: &[&str]) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    allowed.contains(&ext.as_str()).then_some(ext)
}

/// True if `path` has one of [`ACCEPTED_EXTENSIONS`].
pub fn is_accepted(path: &Path) -> bool {
    extension_in(path, &ACCEPTED_EXTENSIONS).is_some()
}

/// True if `path` has one of [`SONG_EXTENSIONS`].
pub fn is_song_encodable(path: &Path) -> bool {
    extension_in(path, &SONG_EXTENSIONS).is_some()
}

/// Keep the arguments that name existing files with an accepted extension,
/// made absolute, in their original order.
pub fn collect_inputs<I, P>(args: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut inputs = Vec::new();
    for arg in args {
        let path = arg.as_ref();
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "Ignoring argument: not an existing file");
            continue;
        }
        if !is_accepted(path) {
            tracing::debug!(path = %path.display(), "Ignoring argument: unsupported extension");
            continue;
        }
        match std::path::absolute(path) {
            Ok(abs) => inputs.push(abs),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Could not resolve absolute path");
                inputs.push(path.to_path_buf());
            }
        }
    }
    inputs
}

/// An audio file on its way into a Song container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSourceFile {
    path: PathBuf,
    extension: String,
    duration_ms: i64,
}

impl AudioSourceFile {
    /// Wrap `path` if it has a Song-encodable extension.
    pub fn new(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let extension = extension_in(&path, &SONG_EXTENSIONS)?;
        Some(Self {
            path,
            extension,
            duration_ms: 0,
        })
    }

    /// Attach the resolved duration. Negative values clamp to 0.
    pub fn with_duration(self, duration_ms: i64) -> Self {
        Self {
            duration_ms: duration_ms.max(0),
            ..self
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lowercase extension without the dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn duration_ms(&self) -> i64 {
        self.duration_ms
    }

    /// File name for display.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Conversion task requested for the inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskType {
    #[default]
    None,
    /// Wrap audio files in Song `.xnb` containers.
    Song,
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("song") {
            Ok(TaskType::Song)
        } else {
            Err(format!("unknown output type: {s} (expected \"song\")"))
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskType::None => write!(f, "none"),
            TaskType::Song => write!(f, "song"),
        }
    }
}
