//! Runs the recording pipeline over every processable row of an experiment
//! manifest and writes the per-recording results back into the manifest.

use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::config::GridConfig;
use crate::ctx::Ctx;
use crate::error::PaintError;
use crate::io::layout::{self, MANIFEST_IN, MANIFEST_OUT, RecordingPaths};
use crate::io::manifest::Manifest;
use crate::io::matrices::TsvMatrixWriter;
use crate::io::table::format_bool;
use crate::math::curve_fit::{DecayFitter, MonoExpFitter};
use crate::math::stats::round_to;
use crate::pipeline::Pipeline;
use crate::squares::{ImageDecay, LogMatrixObserver, SquareSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    /// Not selected for processing, or processing failed.
    Pending,
    Processed,
    Excluded,
    Included,
}

impl RowState {
    /// Settles a processed row on whether its recording is excluded.
    pub fn resolve(self, exclude: bool) -> Self {
        match self {
            RowState::Processed if exclude => RowState::Excluded,
            RowState::Processed => RowState::Included,
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSummary {
    pub nr_total_squares: usize,
    pub nr_defined_squares: usize,
    pub nr_visible_squares: usize,
    pub nr_invisible_squares: usize,
    pub nr_rejected_squares: usize,
    pub squares_ratio: f64,
    pub tau: f64,
    pub r_squared: f64,
    pub density: f64,
    pub exclude: bool,
}

impl RecordingSummary {
    pub fn new(set: &SquareSet, image: &ImageDecay, max_square_coverage: f64) -> Self {
        let total = set.total();
        let visible = set.visible_count();
        let defined = set.valid_count();
        let squares_ratio = if total == 0 {
            0.0
        } else {
            (100.0 * visible as f64 / total as f64).round()
        };
        Self {
            nr_total_squares: total,
            nr_defined_squares: defined,
            nr_visible_squares: visible,
            nr_invisible_squares: total - visible,
            nr_rejected_squares: total - defined,
            squares_ratio,
            tau: image.decay.table_value(),
            r_squared: round_to(image.r_squared, 3),
            density: image.density,
            exclude: is_excluded(squares_ratio, max_square_coverage),
        }
    }
}

/// A recording is excluded when its visible-square percentage exceeds the
/// configured ceiling; a ratio equal to the ceiling is kept.
pub fn is_excluded(squares_ratio: f64, max_square_coverage: f64) -> bool {
    squares_ratio > max_square_coverage
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowReport {
    pub row: usize,
    pub ext_recording_name: String,
    pub state: RowState,
    pub summary: Option<RecordingSummary>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentReport {
    pub experiment_dir: PathBuf,
    pub rows: Vec<RowReport>,
    pub warnings: Vec<String>,
    pub elapsed_ms: u64,
}

impl ExperimentReport {
    pub fn count(&self, state: RowState) -> usize {
        self.rows.iter().filter(|r| r.state == state).count()
    }

    pub fn failed(&self) -> usize {
        self.rows.iter().filter(|r| r.error.is_some()).count()
    }
}

pub struct Driver {
    pub config: GridConfig,
    pub fitter: Rc<dyn DecayFitter>,
}

impl Driver {
    pub fn new(config: GridConfig) -> Self {
        Self {
            config,
            fitter: Rc::new(MonoExpFitter::default()),
        }
    }

    pub fn with_fitter(mut self, fitter: Rc<dyn DecayFitter>) -> Self {
        self.fitter = fitter;
        self
    }

    /// Processes every experiment directory of a project in name order.
    pub fn process_project(&self, project_dir: &Path) -> Result<Vec<ExperimentReport>> {
        self.config.validate()?;
        info!(project = %project_dir.display(), "generating squares for project");
        let mut reports = Vec::new();
        for dir in layout::experiment_dirs(project_dir)? {
            reports.push(self.process_experiment(&dir)?);
        }
        Ok(reports)
    }

    /// Processes one experiment directory. Only an unusable manifest is an
    /// error; recordings that fail are reported and skipped.
    pub fn process_experiment(&self, experiment_dir: &Path) -> Result<ExperimentReport> {
        let start = Instant::now();
        self.config.validate()?;
        let mut manifest = Manifest::load(&experiment_dir.join(MANIFEST_IN))?;
        self.add_parameter_columns(&mut manifest);

        let selected: Vec<usize> = (0..manifest.len())
            .filter(|&row| manifest.should_process(row))
            .collect();
        info!(
            experiment = %experiment_dir.display(),
            recordings = selected.len(),
            "processing experiment"
        );

        let mut rows = Vec::with_capacity(manifest.len());
        let mut warnings = Vec::new();
        for row in 0..manifest.len() {
            let ext_recording_name = manifest.ext_recording_name(row);
            if !selected.contains(&row) {
                rows.push(RowReport {
                    row,
                    ext_recording_name,
                    state: RowState::Pending,
                    summary: None,
                    error: None,
                });
                continue;
            }

            match self.process_recording(experiment_dir, &manifest, row) {
                Ok((summary, recording_warnings)) => {
                    write_summary(&mut manifest, row, &summary, self.config.max_square_coverage);
                    warnings.extend(recording_warnings);
                    let state = RowState::Processed.resolve(summary.exclude);
                    info!(
                        recording = %ext_recording_name,
                        visible = summary.nr_visible_squares,
                        defined = summary.nr_defined_squares,
                        tau = summary.tau,
                        exclude = summary.exclude,
                        "recording processed"
                    );
                    rows.push(RowReport {
                        row,
                        ext_recording_name,
                        state,
                        summary: Some(summary),
                        error: None,
                    });
                }
                Err(err) => {
                    if PaintError::is_fatal(&err) {
                        return Err(err);
                    }
                    let message = format!("{err:#}");
                    error!(recording = %ext_recording_name, error = %message, "recording skipped");
                    rows.push(RowReport {
                        row,
                        ext_recording_name,
                        state: RowState::Pending,
                        summary: None,
                        error: Some(message),
                    });
                }
            }
        }

        let out = experiment_dir.join(MANIFEST_OUT);
        manifest.write(&out)?;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            experiment = %experiment_dir.display(),
            manifest = %out.display(),
            elapsed_ms,
            "experiment processed"
        );
        for w in &warnings {
            warn!("{}", w);
        }

        Ok(ExperimentReport {
            experiment_dir: experiment_dir.to_path_buf(),
            rows,
            warnings,
            elapsed_ms,
        })
    }

    fn process_recording(
        &self,
        experiment_dir: &Path,
        manifest: &Manifest,
        row: usize,
    ) -> Result<(RecordingSummary, Vec<String>)> {
        let meta = manifest.recording_meta(row);
        let paths = RecordingPaths::new(experiment_dir, &meta.ext_recording_name);
        let mut ctx = Ctx::new(self.config.clone(), meta, paths);
        ctx.fitter = Rc::clone(&self.fitter);
        if self.config.verbose {
            ctx.observers.push(Box::new(LogMatrixObserver));
            ctx.observers
                .push(Box::new(TsvMatrixWriter::new(ctx.paths.grid_dir.clone())));
        }

        Pipeline::recording().run(&mut ctx)?;

        let set = ctx.squares()?;
        let image = ctx
            .image
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("image tau missing"))?;
        let summary = RecordingSummary::new(set, image, self.config.max_square_coverage);
        Ok((summary, ctx.warnings))
    }

    fn add_parameter_columns(&self, manifest: &mut Manifest) {
        let cfg = &self.config;
        for row in 0..manifest.len() {
            if !manifest.should_process(row) {
                continue;
            }
            manifest.set(row, "Min Tracks for Tau", cfg.min_tracks_for_decay);
            manifest.set(row, "Min R Squared", cfg.min_r_squared);
            manifest.set(row, "Nr of Squares in Row", cfg.grid_size);
            manifest.set(row, "Exclude", format_bool(false));
            manifest.set(row, "Neighbour Mode", cfg.neighbour_mode.as_str());
            manifest.set(row, "Max Allowable Variability", cfg.max_variability);
            manifest.set(row, "Min Required Density Ratio", cfg.min_density_ratio);
            for column in [
                "Nr Total Squares",
                "Nr Defined Squares",
                "Nr Visible Squares",
                "Nr Invisible Squares",
                "Nr Rejected Squares",
                "Max Squares Ratio",
                "Squares Ratio",
            ] {
                manifest.set(row, column, 0);
            }
        }
    }
}

pub fn write_summary(
    manifest: &mut Manifest,
    row: usize,
    summary: &RecordingSummary,
    max_square_coverage: f64,
) {
    let ext_name = manifest.ext_recording_name(row);
    manifest.set(row, "Nr Total Squares", summary.nr_total_squares);
    manifest.set(row, "Nr Defined Squares", summary.nr_defined_squares);
    manifest.set(row, "Nr Visible Squares", summary.nr_visible_squares);
    manifest.set(row, "Nr Invisible Squares", summary.nr_invisible_squares);
    manifest.set(row, "Nr Rejected Squares", summary.nr_rejected_squares);
    manifest.set(row, "Squares Ratio", summary.squares_ratio);
    manifest.set(row, "Max Squares Ratio", max_square_coverage);
    manifest.set(row, "Ext Recording Name", ext_name);
    manifest.set(row, "Tau", summary.tau);
    manifest.set(row, "Density", summary.density);
    manifest.set(row, "R Squared", summary.r_squared);
    manifest.set(row, "Exclude", format_bool(summary.exclude));
}
