use tracing::debug;

use crate::config::GridConfig;
use crate::math::curve_fit::DecayFitter;
use crate::squares::stats::{density, estimate_decay};
use crate::squares::{Decay, SquareSet, Track};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageDecay {
    pub decay: Decay,
    pub r_squared: f64,
    pub density: f64,
    pub nr_tracks: usize,
}

impl ImageDecay {
    pub fn disabled() -> Self {
        Self {
            decay: Decay::Disabled,
            r_squared: 0.0,
            density: 0.0,
            nr_tracks: 0,
        }
    }
}

/// One decay constant and density for the whole recording, pooled over the
/// tracks of squares that hold tracks and pass the neighbour, duration and
/// density-ratio checks. Decay validity and variability do not take part.
pub fn image_decay(
    set: &SquareSet,
    tracks: &[Track],
    config: &GridConfig,
    concentration: f64,
    fitter: &dyn DecayFitter,
) -> ImageDecay {
    let selected: Vec<bool> = set
        .squares
        .iter()
        .map(|s| {
            s.nr_tracks > 0 && s.neighbour_visible && s.duration_visible && s.density_ratio_visible
        })
        .collect();

    let durations: Vec<f64> = tracks
        .iter()
        .zip(&set.track_squares)
        .filter_map(|(t, sq)| match sq {
            Some(s) if selected[*s] => Some(t.duration),
            _ => None,
        })
        .collect();
    let nr_tracks = durations.len();

    let estimate = estimate_decay(
        &durations,
        config.min_tracks_for_decay,
        config.min_r_squared,
        fitter,
    );

    debug!(
        squares = selected.iter().filter(|s| **s).count(),
        tracks = nr_tracks,
        tau = estimate.decay.code(),
        r_squared = estimate.r_squared,
        "image tau computed"
    );

    ImageDecay {
        decay: estimate.decay,
        r_squared: estimate.r_squared,
        density: density(nr_tracks, set.grid.square_area(), concentration),
        nr_tracks,
    }
}
