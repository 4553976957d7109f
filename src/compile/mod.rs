//! Project-level output: concatenates every experiment's processed manifest
//! and square tables into `Output/`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use tracing::{debug, error, info, warn};

use crate::error::PaintError;
use crate::io::layout::{self, MANIFEST_OUT, OUTPUT_DIR, RecordingPaths};
use crate::io::manifest::Manifest;
use crate::io::table::{Table, parse_bool};

/// Manifest columns joined onto every square of a recording.
pub const JOINED_COLUMNS: [&str; 9] = [
    "Probe",
    "Probe Type",
    "Adjuvant",
    "Cell Type",
    "Concentration",
    "Threshold",
    "Condition Nr",
    "Recording Sequence Nr",
    "Neighbour Mode",
];

pub const ALL_TRACKS: &str = "All Tracks.csv";

pub const SUMMARY_HEADERS: [&str; 5] = [
    "Recording",
    "Nr Cell Types",
    "Nr Probe Types",
    "Adjuvants",
    "Nr Probes",
];

#[derive(Debug, Clone, Default)]
pub struct ProjectOutput {
    pub all_squares: Table,
    pub all_images: Table,
    pub image_summary: Table,
    pub missing_squares: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CompileReport {
    pub output_dir: PathBuf,
    pub experiments: usize,
    pub images: usize,
    pub squares: usize,
    pub missing_squares: Vec<String>,
}

pub fn compile_project(project_dir: &Path) -> Result<CompileReport> {
    let start = Instant::now();
    info!(project = %project_dir.display(), "compiling project output");

    let output = collect_project(project_dir)?;
    let output_dir = project_dir.join(OUTPUT_DIR);
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    output.all_squares.write(&output_dir.join("All Squares.csv"))?;
    output.all_images.write(&output_dir.join("All Images.csv"))?;
    output
        .image_summary
        .write(&output_dir.join("Image Summary.csv"))?;
    output.all_images.write(&project_dir.join("All Images.csv"))?;

    let report = CompileReport {
        output_dir,
        experiments: output.image_summary.len(),
        images: output.all_images.len(),
        squares: output.all_squares.len(),
        missing_squares: output.missing_squares,
    };
    info!(
        experiments = report.experiments,
        images = report.images,
        squares = report.squares,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "project output compiled"
    );
    Ok(report)
}

pub fn collect_project(project_dir: &Path) -> Result<ProjectOutput> {
    let mut out = ProjectOutput {
        image_summary: Table {
            headers: SUMMARY_HEADERS.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        },
        ..ProjectOutput::default()
    };

    for experiment_dir in layout::experiment_dirs(project_dir)? {
        debug!(experiment = %experiment_dir.display(), "adding experiment");
        let manifest = processed_manifest(&experiment_dir)?;
        let selected: Vec<usize> = (0..manifest.len())
            .filter(|&r| manifest.should_process(r))
            .collect();
        let images = Table {
            headers: manifest.table.headers.clone(),
            rows: selected.iter().map(|&r| manifest.table.rows[r].clone()).collect(),
        };

        for (row, &manifest_row) in selected.iter().enumerate() {
            if parse_bool(images.get(row, "Exclude").unwrap_or("")) {
                continue;
            }
            let ext_name = manifest.ext_recording_name(manifest_row);
            let squares_path = layout::squares_file(&experiment_dir, &ext_name);
            if !squares_path.is_file() {
                error!(
                    recording = %ext_name,
                    experiment = %experiment_dir.display(),
                    "no squares file found"
                );
                out.missing_squares.push(ext_name);
                continue;
            }
            let squares = Table::read(&squares_path)?;
            if squares.is_empty() {
                continue;
            }
            let joined = join_image_columns(squares, &images, row);
            out.all_squares.append(&joined);
        }

        let name = experiment_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        out.image_summary.rows.push(vec![
            name,
            distinct(&images, "Cell Type").to_string(),
            distinct(&images, "Probe Type").to_string(),
            distinct(&images, "Adjuvant").to_string(),
            distinct(&images, "Probe").to_string(),
        ]);
        out.all_images.append(&images);
    }

    out.all_squares = finish_squares(out.all_squares);
    Ok(out)
}

/// Concatenates the labelled track tables of every processed recording into
/// `Output/All Tracks.csv`. Finding no tracks at all is an error.
pub fn write_all_tracks(project_dir: &Path) -> Result<PathBuf> {
    let tracks = collect_all_tracks(project_dir)?;
    if tracks.is_empty() {
        bail!("no labelled tracks found under {}", project_dir.display());
    }
    let output_dir = project_dir.join(OUTPUT_DIR);
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    let path = output_dir.join(ALL_TRACKS);
    tracks.write(&path)?;
    info!(tracks = tracks.len(), path = %path.display(), "all tracks written");
    Ok(path)
}

pub fn collect_all_tracks(project_dir: &Path) -> Result<Table> {
    let mut all = Table::default();
    for experiment_dir in layout::experiment_dirs(project_dir)? {
        let manifest = processed_manifest(&experiment_dir)?;
        for row in (0..manifest.len()).filter(|&r| manifest.should_process(r)) {
            let ext_name = manifest.ext_recording_name(row);
            let path = RecordingPaths::new(&experiment_dir, &ext_name).labelled_tracks;
            if !path.is_file() {
                warn!(recording = %ext_name, "no labelled tracks found");
                continue;
            }
            let mut tracks = Table::read(&path)?;
            let experiment_name = manifest.get(row, "Experiment Name").to_string();
            for r in 0..tracks.len() {
                tracks.set(r, "Recording Name", &ext_name);
                tracks.set(r, "Experiment Name", &experiment_name);
            }
            all.append(&tracks);
        }
    }
    Ok(all)
}

fn processed_manifest(experiment_dir: &Path) -> Result<Manifest> {
    let path = experiment_dir.join(MANIFEST_OUT);
    if !path.is_file() {
        return Err(PaintError::fatal(&path, "processed manifest not found").into());
    }
    Manifest::load(&path)
}

fn join_image_columns(mut squares: Table, images: &Table, row: usize) -> Table {
    for column in JOINED_COLUMNS {
        let value = images.get(row, column).unwrap_or("").to_string();
        for r in 0..squares.len() {
            squares.set(r, column, value.clone());
        }
    }
    squares
}

/// Drops squares without tracks and renames the recording column.
fn finish_squares(mut squares: Table) -> Table {
    if let Some(col) = squares.column("Nr Tracks") {
        squares
            .rows
            .retain(|r| r[col].trim().parse::<f64>().map(|n| n != 0.0).unwrap_or(true));
    }
    if let Some(col) = squares.column("Ext Recording Name") {
        squares.headers[col] = "Recording Name".to_string();
    }
    squares
}

fn distinct(table: &Table, column: &str) -> usize {
    let Some(col) = table.column(column) else {
        return 0;
    };
    table
        .rows
        .iter()
        .map(|r| r[col].as_str())
        .collect::<BTreeSet<&str>>()
        .len()
}
