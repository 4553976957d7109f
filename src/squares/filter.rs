//! Validity, visibility and labelling of a recording's squares.
//!
//! Each step consumes a square set and returns the next one, so the order
//! `raw -> with_validity -> with_visibility -> with_labels` is explicit.

use tracing::debug;

use crate::math::stats::round_to;
use crate::squares::neighbour::{NeighbourMode, neighbour_visibility};
use crate::squares::{Decay, SquareSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RejectionCounts {
    pub total: usize,
    pub too_few_tracks: usize,
    pub fit_failed: usize,
    pub unreliable: usize,
    pub valid: usize,
}

impl RejectionCounts {
    /// Counts rejections in the order too-few-tracks, fit-failed, unreliable.
    pub fn of(set: &SquareSet) -> Self {
        let mut counts = RejectionCounts {
            total: set.squares.len(),
            ..Self::default()
        };
        let mut remaining: Vec<Decay> = set.squares.iter().map(|s| s.decay).collect();
        for code in [Decay::TooFewTracks, Decay::FitFailed, Decay::Unreliable] {
            let before = remaining.len();
            remaining.retain(|d| *d != code);
            let removed = before - remaining.len();
            match code {
                Decay::TooFewTracks => counts.too_few_tracks = removed,
                Decay::FitFailed => counts.fit_failed = removed,
                _ => counts.unreliable = removed,
            }
        }
        counts.valid = remaining.len();
        counts
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityThresholds {
    pub max_variability: f64,
    pub min_density_ratio: f64,
    pub neighbour_mode: NeighbourMode,
}

pub fn with_validity(mut set: SquareSet) -> SquareSet {
    for square in &mut set.squares {
        square.valid_decay = square.decay.is_fitted();
    }
    let counts = RejectionCounts::of(&set);
    debug!(
        squares = counts.total,
        too_few_tracks = counts.too_few_tracks,
        fit_failed = counts.fit_failed,
        r_squared_too_low = counts.unreliable,
        valid = counts.valid,
        "squares with invalid tau eliminated"
    );
    set
}

/// Derives the visibility flags. `neighbour_override`, when given, replaces
/// the neighbour analysis for every square.
pub fn with_visibility(
    mut set: SquareSet,
    thresholds: &VisibilityThresholds,
    neighbour_override: Option<&[bool]>,
) -> SquareSet {
    let max_variability = round_to(thresholds.max_variability, 1);
    let min_density_ratio = round_to(thresholds.min_density_ratio, 1);

    for square in &mut set.squares {
        square.variability_visible = square.variability <= max_variability;
        square.density_ratio_visible = square.density_ratio >= min_density_ratio;
    }

    let neighbours = match neighbour_override {
        Some(mask) if mask.len() == set.squares.len() => mask.to_vec(),
        _ => {
            let candidates: Vec<bool> = set
                .squares
                .iter()
                .map(|s| s.valid_decay && s.density_ratio_visible && s.variability_visible)
                .collect();
            neighbour_visibility(&set.grid, &candidates, thresholds.neighbour_mode)
        }
    };

    for (square, neighbour_visible) in set.squares.iter_mut().zip(neighbours) {
        square.neighbour_visible = neighbour_visible;
        square.visible = square.valid_decay
            && square.density_ratio_visible
            && square.variability_visible
            && square.neighbour_visible;
    }
    set
}

pub fn with_labels(mut set: SquareSet) -> SquareSet {
    let mut label_nr = 1;
    for square in &mut set.squares {
        if square.valid_decay {
            square.label_nr = label_nr;
            label_nr += 1;
        } else {
            square.label_nr = 0;
        }
    }
    set
}
