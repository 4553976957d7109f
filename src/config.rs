use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::math::geometry::{DEFAULT_FIELD_EXTENT, Grid};
use crate::squares::NeighbourMode;

/// Process-wide parameters for square generation. Threaded explicitly through
/// every stage; nothing reads them from ambient state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub grid_size: usize,
    pub min_r_squared: f64,
    pub min_tracks_for_decay: usize,
    pub min_density_ratio: f64,
    pub max_variability: f64,
    /// Percentage of visible squares above which a recording is excluded.
    pub max_square_coverage: f64,
    pub compute_image_decay: bool,
    pub compute_square_decay: bool,
    pub verbose: bool,
    pub neighbour_mode: NeighbourMode,
    pub field_extent: f64,
    pub background_fraction: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            grid_size: 20,
            min_r_squared: 0.9,
            min_tracks_for_decay: 20,
            min_density_ratio: 2.0,
            max_variability: 10.0,
            max_square_coverage: 100.0,
            compute_image_decay: true,
            compute_square_decay: true,
            verbose: false,
            neighbour_mode: NeighbourMode::Free,
            field_extent: DEFAULT_FIELD_EXTENT,
            background_fraction: 0.1,
        }
    }
}

impl GridConfig {
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read parameter file {}", path.display()))?;
        let config: GridConfig = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse parameter file {}", path.display()))?;
        Ok(config)
    }

    pub fn grid(&self) -> Grid {
        Grid::new(self.grid_size, self.field_extent)
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid_size == 0 {
            bail!("grid size must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.min_r_squared) {
            bail!("min R squared must be within 0..1, got {}", self.min_r_squared);
        }
        if !(self.min_density_ratio >= 0.0) {
            bail!("min density ratio must be >= 0, got {}", self.min_density_ratio);
        }
        if !(self.max_variability >= 0.0) {
            bail!("max variability must be >= 0, got {}", self.max_variability);
        }
        if !(0.0..=100.0).contains(&self.max_square_coverage) {
            bail!(
                "max square coverage must be a percentage within 0..100, got {}",
                self.max_square_coverage
            );
        }
        if !(self.field_extent.is_finite() && self.field_extent > 0.0) {
            bail!("field extent must be positive, got {}", self.field_extent);
        }
        if !(self.background_fraction > 0.0 && self.background_fraction <= 1.0) {
            bail!(
                "background fraction must be within (0, 1], got {}",
                self.background_fraction
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: GridConfig =
            serde_json::from_str(r#"{"grid_size": 10, "neighbour_mode": "strict"}"#).unwrap();
        assert_eq!(cfg.grid_size, 10);
        assert_eq!(cfg.neighbour_mode, NeighbourMode::Strict);
        assert_eq!(cfg.min_tracks_for_decay, 20);
        cfg.validate().unwrap();
    }

    #[test]
    fn rejects_zero_grid() {
        let cfg = GridConfig {
            grid_size: 0,
            ..GridConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
