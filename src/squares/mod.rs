pub mod filter;
pub mod image;
pub mod matrices;
pub mod neighbour;
pub mod stats;

use crate::math::geometry::{Grid, SquareBounds};

pub use filter::{RejectionCounts, VisibilityThresholds, with_labels, with_validity, with_visibility};
pub use image::{ImageDecay, image_decay};
pub use matrices::{GridMatrices, GridObserver, LogMatrixObserver};
pub use neighbour::{NeighbourMode, neighbour_visibility};
pub use stats::{SquareInputs, background_track_count, compute_squares, estimate_decay};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Track {
    pub x: f64,
    pub y: f64,
    pub duration: f64,
    /// NaN when the track table has no usable value.
    pub diffusion_coefficient: f64,
}

/// Outcome of a decay-constant estimate. The sentinel codes only exist at
/// the table boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decay {
    Fitted(f64),
    TooFewTracks,
    FitFailed,
    Unreliable,
    /// No fit was requested. Reported as 0 in the tables.
    Disabled,
}

impl Decay {
    pub const TOO_FEW_TRACKS: f64 = -1.0;
    pub const FIT_FAILED: f64 = -2.0;
    pub const UNRELIABLE: f64 = -3.0;

    pub fn code(&self) -> f64 {
        match self {
            Decay::Fitted(tau) => *tau,
            Decay::TooFewTracks => Self::TOO_FEW_TRACKS,
            Decay::FitFailed => Self::FIT_FAILED,
            Decay::Unreliable => Self::UNRELIABLE,
            Decay::Disabled => 0.0,
        }
    }

    pub fn is_fitted(&self) -> bool {
        matches!(self, Decay::Fitted(_))
    }

    /// Whole milliseconds, as stored in the square and manifest tables.
    pub fn table_value(&self) -> f64 {
        match self {
            Decay::Fitted(tau) => tau.trunc(),
            other => other.code(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayEstimate {
    pub decay: Decay,
    pub r_squared: f64,
}

impl DecayEstimate {
    pub fn too_few_tracks() -> Self {
        Self {
            decay: Decay::TooFewTracks,
            r_squared: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Square {
    pub seq: usize,
    pub row: usize,
    pub col: usize,
    pub bounds: SquareBounds,
    pub nr_tracks: usize,
    pub total_duration: f64,
    pub max_duration: f64,
    pub avg_long_track_duration: f64,
    pub decay: Decay,
    pub r_squared: f64,
    pub density: f64,
    pub density_ratio: f64,
    pub variability: f64,
    pub diffusion_coefficient: f64,
    pub valid_decay: bool,
    pub density_ratio_visible: bool,
    pub variability_visible: bool,
    pub neighbour_visible: bool,
    pub duration_visible: bool,
    pub visible: bool,
    pub label_nr: usize,
}

/// All squares of one recording plus the square each track was assigned to.
#[derive(Debug, Clone, PartialEq)]
pub struct SquareSet {
    pub grid: Grid,
    pub squares: Vec<Square>,
    pub track_squares: Vec<Option<usize>>,
    pub background_track_count: f64,
}

impl SquareSet {
    pub fn total(&self) -> usize {
        self.squares.len()
    }

    pub fn visible_count(&self) -> usize {
        self.squares.iter().filter(|s| s.visible).count()
    }

    pub fn valid_count(&self) -> usize {
        self.squares.iter().filter(|s| s.valid_decay).count()
    }

    /// Label of every track's square, 0 when unassigned or unlabelled.
    pub fn track_labels(&self) -> Vec<usize> {
        self.track_squares
            .iter()
            .map(|sq| sq.map(|s| self.squares[s].label_nr).unwrap_or(0))
            .collect()
    }
}
