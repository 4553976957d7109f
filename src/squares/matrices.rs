//! Per-recording grid matrices for diagnostic reporting.
//!
//! Matrices never feed back into the square statistics; they are handed to
//! observers once a recording's squares are final.

use tracing::debug;

use crate::squares::SquareSet;

#[derive(Debug, Clone, PartialEq)]
pub struct GridMatrices {
    pub size: usize,
    pub tau: Vec<i64>,
    pub density: Vec<f64>,
    pub count: Vec<usize>,
    /// Variability scaled by 100 and truncated.
    pub variability: Vec<i64>,
    /// Share of the recording's assigned tracks per square, in percent.
    pub percentage: Vec<f64>,
}

impl GridMatrices {
    pub fn from_squares(set: &SquareSet) -> Self {
        let count: Vec<usize> = set.squares.iter().map(|s| s.nr_tracks).collect();
        let total: usize = count.iter().sum();
        let percentage = count
            .iter()
            .map(|&c| {
                if total == 0 {
                    0.0
                } else {
                    c as f64 / total as f64 * 100.0
                }
            })
            .collect();
        Self {
            size: set.grid.size,
            tau: set.squares.iter().map(|s| s.decay.table_value() as i64).collect(),
            density: set.squares.iter().map(|s| s.density).collect(),
            count,
            variability: set
                .squares
                .iter()
                .map(|s| (s.variability * 100.0) as i64)
                .collect(),
            percentage,
        }
    }

    pub fn rows<'a, T>(&self, values: &'a [T]) -> impl Iterator<Item = &'a [T]> {
        values.chunks(self.size.max(1))
    }
}

pub trait GridObserver {
    fn on_matrices(&mut self, recording: &str, matrices: &GridMatrices) -> anyhow::Result<()>;
}

/// Emits the Tau and count matrices at debug level.
pub struct LogMatrixObserver;

impl GridObserver for LogMatrixObserver {
    fn on_matrices(&mut self, recording: &str, matrices: &GridMatrices) -> anyhow::Result<()> {
        for (row, values) in matrices.rows(&matrices.tau).enumerate() {
            debug!(recording, row, ?values, "tau matrix");
        }
        for (row, values) in matrices.rows(&matrices.count).enumerate() {
            debug!(recording, row, ?values, "count matrix");
        }
        Ok(())
    }
}
