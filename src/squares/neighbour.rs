use serde::{Deserialize, Serialize};

use crate::math::geometry::Grid;

/// How strongly a square depends on its neighbours to be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeighbourMode {
    /// No neighbour requirement.
    #[default]
    Free,
    /// At least one candidate among the eight surrounding squares.
    Relaxed,
    /// At least one candidate among the four edge-sharing squares.
    Strict,
}

impl NeighbourMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NeighbourMode::Free => "Free",
            NeighbourMode::Relaxed => "Relaxed",
            NeighbourMode::Strict => "Strict",
        }
    }
}

pub fn neighbour_visibility(grid: &Grid, candidates: &[bool], mode: NeighbourMode) -> Vec<bool> {
    if mode == NeighbourMode::Free {
        return vec![true; candidates.len()];
    }
    let n = grid.size as i64;
    let offsets: &[(i64, i64)] = match mode {
        NeighbourMode::Strict => &[(-1, 0), (1, 0), (0, -1), (0, 1)],
        _ => &[
            (-1, -1),
            (-1, 0),
            (-1, 1),
            (0, -1),
            (0, 1),
            (1, -1),
            (1, 0),
            (1, 1),
        ],
    };

    (0..candidates.len())
        .map(|seq| {
            if !candidates[seq] {
                return false;
            }
            let (row, col) = grid.row_col(seq);
            offsets.iter().any(|(dr, dc)| {
                let r = row as i64 + dr;
                let c = col as i64 + dc;
                r >= 0 && c >= 0 && r < n && c < n && candidates[(r * n + c) as usize]
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_pair_is_relaxed_only() {
        let grid = Grid::new(3, 1.0);
        let mut candidates = vec![false; 9];
        candidates[0] = true;
        candidates[4] = true;
        let strict = neighbour_visibility(&grid, &candidates, NeighbourMode::Strict);
        let relaxed = neighbour_visibility(&grid, &candidates, NeighbourMode::Relaxed);
        assert!(!strict[0] && !strict[4]);
        assert!(relaxed[0] && relaxed[4]);
        assert!(!relaxed[1]);
    }
}
