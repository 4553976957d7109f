use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failures that decide between aborting the run and skipping a recording.
/// Numeric problems are never errors; they are recorded as sentinel values.
#[derive(Debug, Error)]
pub enum PaintError {
    #[error("invalid experiment manifest {}: {reason}", .path.display())]
    FatalPrecondition { path: PathBuf, reason: String },
    #[error("track file not found: {}", .0.display())]
    MissingInput(PathBuf),
}

impl PaintError {
    pub fn fatal(path: &Path, reason: impl Into<String>) -> Self {
        PaintError::FatalPrecondition {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn is_fatal(err: &anyhow::Error) -> bool {
        matches!(
            err.downcast_ref::<PaintError>(),
            Some(PaintError::FatalPrecondition { .. })
        )
    }
}
