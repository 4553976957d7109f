//! File locations inside a project tree.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const MANIFEST_IN: &str = "experiment_tm.csv";
pub const MANIFEST_OUT: &str = "experiment_squares.csv";
pub const OUTPUT_DIR: &str = "Output";

#[derive(Debug, Clone, PartialEq)]
pub struct RecordingPaths {
    pub tracks: PathBuf,
    pub labelled_tracks: PathBuf,
    pub grid_dir: PathBuf,
    pub squares: PathBuf,
}

impl RecordingPaths {
    pub fn new(experiment_dir: &Path, ext_name: &str) -> Self {
        let base = experiment_dir.join(ext_name);
        let tracks_dir = base.join("tracks");
        let grid_dir = base.join("grid");
        let plain = tracks_dir.join(format!("{ext_name}-tracks.csv"));
        let gz = tracks_dir.join(format!("{ext_name}-tracks.csv.gz"));
        let tracks = if !plain.exists() && gz.exists() { gz } else { plain };
        Self {
            tracks,
            labelled_tracks: tracks_dir.join(format!("{ext_name}-tracks-label.csv")),
            squares: grid_dir.join(format!("{ext_name}-squares.csv")),
            grid_dir,
        }
    }
}

pub fn squares_file(experiment_dir: &Path, ext_name: &str) -> PathBuf {
    RecordingPaths::new(experiment_dir, ext_name).squares
}

/// Experiment directories of a project in name order, skipping output and
/// disabled (`-` prefixed) directories.
pub fn experiment_dirs(project_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(project_dir)
        .with_context(|| format!("failed to list {}", project_dir.display()))?;
    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.contains(OUTPUT_DIR) || name.starts_with('-') {
            continue;
        }
        dirs.push(path);
    }
    dirs.sort();
    Ok(dirs)
}
