use serde::{Deserialize, Serialize};

use crate::math::stats::round_to;
use crate::squares::{Square, SquareSet};

/// Experiment metadata of one recording, copied onto each of its squares.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordingMeta {
    pub ext_recording_name: String,
    pub experiment_name: String,
    pub experiment_date: String,
    pub recording_sequence_nr: i64,
    pub condition_nr: i64,
    pub replicate_nr: i64,
    pub concentration: f64,
    pub nr_spots: i64,
}

/// One row of a recording's square table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquareRecord {
    #[serde(rename = "Recording Sequence Nr")]
    pub recording_sequence_nr: i64,
    #[serde(rename = "Ext Recording Name")]
    pub ext_recording_name: String,
    #[serde(rename = "Experiment Name")]
    pub experiment_name: String,
    #[serde(rename = "Experiment Date")]
    pub experiment_date: String,
    #[serde(rename = "Condition Nr")]
    pub condition_nr: i64,
    #[serde(rename = "Replicate Nr")]
    pub replicate_nr: i64,
    #[serde(rename = "Concentration")]
    pub concentration: f64,
    #[serde(rename = "Square Nr")]
    pub square_nr: usize,
    #[serde(rename = "Label Nr")]
    pub label_nr: usize,
    #[serde(rename = "Row Nr")]
    pub row_nr: usize,
    #[serde(rename = "Col Nr")]
    pub col_nr: usize,
    #[serde(rename = "X0")]
    pub x0: f64,
    #[serde(rename = "X1")]
    pub x1: f64,
    #[serde(rename = "Y0")]
    pub y0: f64,
    #[serde(rename = "Y1")]
    pub y1: f64,
    #[serde(rename = "Nr Spots")]
    pub nr_spots: i64,
    #[serde(rename = "Nr Tracks")]
    pub nr_tracks: usize,
    #[serde(rename = "Tau")]
    pub tau: f64,
    #[serde(rename = "Valid Tau")]
    pub valid_tau: bool,
    #[serde(rename = "R2")]
    pub r_squared: f64,
    #[serde(rename = "Density")]
    pub density: f64,
    #[serde(rename = "Density Ratio")]
    pub density_ratio: f64,
    #[serde(rename = "Average Long Track Duration")]
    pub avg_long_track_duration: f64,
    #[serde(rename = "Max Track Duration")]
    pub max_track_duration: f64,
    #[serde(rename = "Total Track Duration")]
    pub total_track_duration: f64,
    #[serde(rename = "Variability")]
    pub variability: f64,
    #[serde(rename = "DC")]
    pub diffusion_coefficient: f64,
    #[serde(rename = "Visible")]
    pub visible: bool,
    #[serde(rename = "Neighbour Visible")]
    pub neighbour_visible: bool,
    #[serde(rename = "Variability Visible")]
    pub variability_visible: bool,
    #[serde(rename = "Density Ratio Visible")]
    pub density_ratio_visible: bool,
    #[serde(rename = "Duration Visible")]
    pub duration_visible: bool,
}

impl SquareRecord {
    pub fn new(meta: &RecordingMeta, square: &Square) -> Self {
        Self {
            recording_sequence_nr: meta.recording_sequence_nr,
            ext_recording_name: meta.ext_recording_name.clone(),
            experiment_name: meta.experiment_name.clone(),
            experiment_date: meta.experiment_date.clone(),
            condition_nr: meta.condition_nr,
            replicate_nr: meta.replicate_nr,
            concentration: meta.concentration,
            square_nr: square.seq,
            label_nr: square.label_nr,
            row_nr: square.row + 1,
            col_nr: square.col + 1,
            x0: round_to(square.bounds.x0, 2),
            x1: round_to(square.bounds.x1, 2),
            y0: round_to(square.bounds.y0, 2),
            y1: round_to(square.bounds.y1, 2),
            nr_spots: meta.nr_spots,
            nr_tracks: square.nr_tracks,
            tau: square.decay.table_value(),
            valid_tau: square.valid_decay,
            r_squared: round_to(square.r_squared, 2),
            density: square.density,
            density_ratio: square.density_ratio,
            avg_long_track_duration: round_to(square.avg_long_track_duration, 1),
            max_track_duration: round_to(square.max_duration, 1),
            total_track_duration: round_to(square.total_duration, 1),
            variability: round_to(square.variability, 2),
            diffusion_coefficient: round_to(square.diffusion_coefficient, 2),
            visible: square.visible,
            neighbour_visible: square.neighbour_visible,
            variability_visible: square.variability_visible,
            density_ratio_visible: square.density_ratio_visible,
            duration_visible: square.duration_visible,
        }
    }
}

pub fn square_records(meta: &RecordingMeta, set: &SquareSet) -> Vec<SquareRecord> {
    set.squares
        .iter()
        .map(|s| SquareRecord::new(meta, s))
        .collect()
}
