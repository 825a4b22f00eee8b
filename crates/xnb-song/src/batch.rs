//! Batch conversion: resolve and encode each input in order, recording the
//! outcome per file. One failed file never stops the batch.

use std::path::{Path, PathBuf};

use xnb_format::encode_song;

use crate::resolver::{DurationResolver, DurationSource};
use crate::source::AudioSourceFile;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Created {
        output: PathBuf,
        duration_ms: i64,
        source: DurationSource,
    },
    /// Accepted as input but not Song-encodable (e.g. an existing `.xnb`).
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub input: PathBuf,
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Created { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Skipped))
    }

    /// No file failed. Skipped files do not count against the batch.
    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
        self.files.iter().filter(|f| pred(&f.outcome)).count()
    }
}

/// Song conversion over a list of inputs.
pub struct SongBatch {
    resolver: DurationResolver,
}

impl SongBatch {
    pub fn new(resolver: DurationResolver) -> Self {
        Self { resolver }
    }

    /// Resolve and encode a single input.
    pub fn process_file(&mut self, path: &Path) -> FileReport {
        let Some(source) = AudioSourceFile::new(path) else {
            tracing::debug!(input = %path.display(), "Not a Song input; skipping");
            return FileReport {
                input: path.to_path_buf(),
                outcome: FileOutcome::Skipped,
            };
        };

        let resolution = self.resolver.resolve(source.path());
        let source = source.with_duration(resolution.duration_ms);

        let outcome = match encode_song(source.path(), source.duration_ms()) {
            Ok(output) => FileOutcome::Created {
                output,
                duration_ms: source.duration_ms(),
                source: resolution.source,
            },
            Err(e) => {
                tracing::warn!(input = %path.display(), error = %e, "Song XNB creation failed");
                FileOutcome::Failed(e.to_string())
            }
        };

        FileReport {
            input: path.to_path_buf(),
            outcome,
        }
    }

    /// Process every input in order.
    pub fn run<P: AsRef<Path>>(&mut self, files: &[P]) -> BatchReport {
        let files = files
            .iter()
            .map(|f| self.process_file(f.as_ref()))
            .collect();
        BatchReport { files }
    }
}
