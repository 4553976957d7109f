use tracing::debug;

use crate::config::GridConfig;
use crate::math::curve_fit::{DecayFitter, FitResult, compile_duration};
use crate::math::geometry::SquareBounds;
use crate::math::stats::{coefficient_of_variation, max_or_zero, mean, mean_of_longest, round_to};
use crate::squares::{Decay, DecayEstimate, Square, SquareSet, Track};

/// Exposure time used to normalise density.
pub const EXPOSURE_TIME: f64 = 100.0;
/// Display scale applied to density.
pub const MAGNIFICATION: f64 = 1000.0;
/// Sub-divisions per axis used for the variability score.
pub const VARIABILITY_GRANULARITY: usize = 10;
pub const DENSITY_RATIO_UNDEFINED: f64 = 999.9;
pub const NO_DIFFUSION_COEFFICIENT: f64 = -1.0;

pub struct SquareInputs<'a> {
    pub config: &'a GridConfig,
    pub concentration: f64,
    /// Caller-supplied reference count; derived from the squares when absent.
    pub background_track_count: Option<f64>,
    pub fitter: &'a dyn DecayFitter,
}

/// Builds the raw square set for one recording: assignment, duration
/// aggregates, decay, density, variability, density ratio and diffusion
/// coefficient. Validity and visibility flags are left at their defaults.
pub fn compute_squares(tracks: &[Track], inputs: &SquareInputs<'_>) -> SquareSet {
    let config = inputs.config;
    let grid = config.grid();
    let area = grid.square_area();
    let total = grid.square_count();

    let track_squares: Vec<Option<usize>> = tracks.iter().map(|t| grid.locate(t.x, t.y)).collect();
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); total];
    for (idx, sq) in track_squares.iter().enumerate() {
        if let Some(s) = sq {
            members[*s].push(idx);
        }
    }

    let mut squares = Vec::with_capacity(total);
    for (seq, idxs) in members.iter().enumerate() {
        let (row, col) = grid.row_col(seq);
        let bounds = grid.square_bounds(seq);
        let in_square: Vec<&Track> = idxs.iter().map(|&i| &tracks[i]).collect();
        let mut durations: Vec<f64> = in_square.iter().map(|t| t.duration).collect();
        let nr_tracks = durations.len();

        let total_duration: f64 = durations.iter().sum();
        let max_duration = max_or_zero(&durations);

        let estimate = if config.compute_square_decay {
            estimate_decay(
                &durations,
                config.min_tracks_for_decay,
                config.min_r_squared,
                inputs.fitter,
            )
        } else {
            DecayEstimate::too_few_tracks()
        };
        let avg_long_track_duration = mean_of_longest(&mut durations);

        squares.push(Square {
            seq,
            row,
            col,
            bounds,
            nr_tracks,
            total_duration,
            max_duration,
            avg_long_track_duration,
            decay: estimate.decay,
            r_squared: estimate.r_squared,
            density: density(nr_tracks, area, inputs.concentration),
            density_ratio: 0.0,
            variability: variability(&in_square, &bounds),
            diffusion_coefficient: closed_bounds_diffusion(tracks, &bounds),
            valid_decay: true,
            density_ratio_visible: true,
            variability_visible: true,
            neighbour_visible: true,
            duration_visible: true,
            visible: true,
            label_nr: 0,
        });
    }

    let counts: Vec<usize> = squares.iter().map(|s| s.nr_tracks).collect();
    let background = inputs
        .background_track_count
        .unwrap_or_else(|| background_track_count(&counts, config.background_fraction));
    for square in &mut squares {
        square.density_ratio = density_ratio(square.nr_tracks, background);
    }

    let assigned = track_squares.iter().filter(|s| s.is_some()).count();
    debug!(
        squares = total,
        tracks = tracks.len(),
        assigned,
        background,
        "square statistics computed"
    );

    SquareSet {
        grid,
        squares,
        track_squares,
        background_track_count: background,
    }
}

/// Fits a decay constant over the given durations. Fewer than `min_tracks`
/// durations yield `TooFewTracks`; a fit below `min_r_squared` yields
/// `Unreliable` while keeping its R².
pub fn estimate_decay(
    durations: &[f64],
    min_tracks: usize,
    min_r_squared: f64,
    fitter: &dyn DecayFitter,
) -> DecayEstimate {
    if durations.len() < min_tracks {
        return DecayEstimate::too_few_tracks();
    }
    let histogram = compile_duration(durations);
    match fitter.fit(&histogram) {
        FitResult::Converged { tau, r_squared } if tau.is_finite() && tau >= 0.0 => {
            let r_squared = if r_squared.is_finite() { r_squared.clamp(0.0, 1.0) } else { 0.0 };
            if r_squared < min_r_squared {
                DecayEstimate {
                    decay: Decay::Unreliable,
                    r_squared,
                }
            } else {
                DecayEstimate {
                    decay: Decay::Fitted(tau),
                    r_squared,
                }
            }
        }
        _ => DecayEstimate {
            decay: Decay::FitFailed,
            r_squared: 0.0,
        },
    }
}

pub fn density(nr_tracks: usize, area: f64, concentration: f64) -> f64 {
    let denom = area * EXPOSURE_TIME * concentration * MAGNIFICATION;
    if !denom.is_finite() || denom <= 0.0 {
        return 0.0;
    }
    nr_tracks as f64 / denom
}

pub fn density_ratio(nr_tracks: usize, background: f64) -> f64 {
    if background == 0.0 {
        return DENSITY_RATIO_UNDEFINED;
    }
    round_to(nr_tracks as f64 / background, 1)
}

/// Mean track count of the sparsest `fraction` of squares holding tracks
/// (at least one square). Zero when no square holds a track.
pub fn background_track_count(counts: &[usize], fraction: f64) -> f64 {
    let mut occupied: Vec<usize> = counts.iter().copied().filter(|&c| c > 0).collect();
    if occupied.is_empty() {
        return 0.0;
    }
    occupied.sort_unstable();
    let k = ((occupied.len() as f64 * fraction).floor() as usize).clamp(1, occupied.len());
    let lowest: Vec<f64> = occupied[..k].iter().map(|&c| c as f64).collect();
    mean(&lowest)
}

/// Coefficient of variation of track counts over a
/// `VARIABILITY_GRANULARITY`² sub-grid of the square.
pub fn variability(tracks: &[&Track], bounds: &SquareBounds) -> f64 {
    if tracks.is_empty() {
        return 0.0;
    }
    let n = VARIABILITY_GRANULARITY;
    let mut cells = vec![0.0f64; n * n];
    let (w, h) = (bounds.width(), bounds.height());
    for t in tracks {
        let cx = sub_index(t.x - bounds.x0, w, n);
        let cy = sub_index(t.y - bounds.y0, h, n);
        cells[cy * n + cx] += 1.0;
    }
    coefficient_of_variation(&cells)
}

fn sub_index(offset: f64, span: f64, n: usize) -> usize {
    if span <= 0.0 {
        return 0;
    }
    let idx = (offset / span * n as f64).floor();
    if idx < 0.0 { 0 } else { (idx as usize).min(n - 1) }
}

fn closed_bounds_diffusion(tracks: &[Track], bounds: &SquareBounds) -> f64 {
    let dcs: Vec<f64> = tracks
        .iter()
        .filter(|t| bounds.contains_closed(t.x, t.y) && t.diffusion_coefficient.is_finite())
        .map(|t| t.diffusion_coefficient)
        .collect();
    if dcs.is_empty() {
        NO_DIFFUSION_COEFFICIENT
    } else {
        mean(&dcs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::geometry::Grid;

    #[test]
    fn background_uses_lowest_occupied_squares() {
        let counts = [0, 0, 4, 8, 2, 10, 6, 12, 14, 16, 18, 20];
        // 10 occupied squares, lowest 10% is the single square with 2 tracks.
        assert_eq!(background_track_count(&counts, 0.1), 2.0);
        assert_eq!(background_track_count(&[0, 0, 0], 0.1), 0.0);
    }

    #[test]
    fn variability_of_single_cell_cluster() {
        let grid = Grid::new(1, 10.0);
        let b = grid.square_bounds(0);
        let t = Track {
            x: 0.5,
            y: 0.5,
            duration: 1.0,
            diffusion_coefficient: 0.0,
        };
        let tracks = vec![&t; 4];
        // One loaded cell out of 100 gives a CV of sqrt(99).
        let v = variability(&tracks, &b);
        assert!((v - (99.0f64).sqrt()).abs() < 1e-9);
    }
}
