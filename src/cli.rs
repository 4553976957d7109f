use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::GridConfig;
use crate::squares::NeighbourMode;

#[derive(Debug, Parser)]
#[command(
    name = "paint-squares",
    version,
    about = "Grid-based Tau and density statistics for single-particle tracking recordings"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate square tables for a project or a single experiment
    Generate(GenerateArgs),
    /// Compile processed experiments into project-level tables
    Compile(CompileArgs),
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    #[arg(long, help = "Project directory (every subdirectory is an experiment)")]
    pub project: Option<PathBuf>,

    #[arg(long, conflicts_with = "project", help = "Single experiment directory")]
    pub experiment: Option<PathBuf>,

    #[arg(long, help = "JSON parameter file; flags given here override it")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Number of squares per row and column")]
    pub grid_size: Option<usize>,

    #[arg(long)]
    pub min_r_squared: Option<f64>,

    #[arg(long)]
    pub min_tracks: Option<usize>,

    #[arg(long)]
    pub min_density_ratio: Option<f64>,

    #[arg(long)]
    pub max_variability: Option<f64>,

    #[arg(long, help = "Visible square percentage above which a recording is excluded")]
    pub max_square_coverage: Option<f64>,

    #[arg(long, value_enum)]
    pub neighbour_mode: Option<NeighbourModeArg>,

    #[arg(long, help = "Field of view width in micrometres")]
    pub field_extent: Option<f64>,

    #[arg(long, help = "Share of occupied squares averaged into the background count")]
    pub background_fraction: Option<f64>,

    #[arg(long, default_value_t = false)]
    pub no_image_tau: bool,

    #[arg(long, default_value_t = false)]
    pub no_square_tau: bool,

    #[arg(long, default_value_t = false, help = "Emit grid matrices and debug logging")]
    pub verbose: bool,

    #[arg(
        long,
        default_value_t = false,
        requires = "project",
        help = "Also write Output/All Tracks.csv for the project"
    )]
    pub all_tracks: bool,
}

#[derive(Debug, Args)]
pub struct CompileArgs {
    #[arg(long)]
    pub project: PathBuf,

    #[arg(long, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NeighbourModeArg {
    Free,
    Relaxed,
    Strict,
}

impl From<NeighbourModeArg> for NeighbourMode {
    fn from(arg: NeighbourModeArg) -> Self {
        match arg {
            NeighbourModeArg::Free => NeighbourMode::Free,
            NeighbourModeArg::Relaxed => NeighbourMode::Relaxed,
            NeighbourModeArg::Strict => NeighbourMode::Strict,
        }
    }
}

impl GenerateArgs {
    /// Overlays explicitly passed flags on `base`.
    pub fn apply(&self, mut base: GridConfig) -> GridConfig {
        if let Some(v) = self.grid_size {
            base.grid_size = v;
        }
        if let Some(v) = self.min_r_squared {
            base.min_r_squared = v;
        }
        if let Some(v) = self.min_tracks {
            base.min_tracks_for_decay = v;
        }
        if let Some(v) = self.min_density_ratio {
            base.min_density_ratio = v;
        }
        if let Some(v) = self.max_variability {
            base.max_variability = v;
        }
        if let Some(v) = self.max_square_coverage {
            base.max_square_coverage = v;
        }
        if let Some(v) = self.neighbour_mode {
            base.neighbour_mode = v.into();
        }
        if let Some(v) = self.field_extent {
            base.field_extent = v;
        }
        if let Some(v) = self.background_fraction {
            base.background_fraction = v;
        }
        if self.no_image_tau {
            base.compute_image_decay = false;
        }
        if self.no_square_tau {
            base.compute_square_decay = false;
        }
        if self.verbose {
            base.verbose = true;
        }
        base
    }
}
