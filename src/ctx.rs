use std::rc::Rc;

use crate::config::GridConfig;
use crate::io::layout::RecordingPaths;
use crate::io::tracks::TrackTable;
use crate::math::curve_fit::{DecayFitter, MonoExpFitter};
use crate::schema::v1::RecordingMeta;
use crate::squares::{GridObserver, ImageDecay, SquareSet};

/// State of one recording as it moves through the pipeline stages.
pub struct Ctx {
    pub config: GridConfig,
    pub meta: RecordingMeta,
    pub paths: RecordingPaths,
    pub fitter: Rc<dyn DecayFitter>,
    pub background_override: Option<f64>,
    pub neighbour_override: Option<Vec<bool>>,
    pub observers: Vec<Box<dyn GridObserver>>,
    pub write_outputs: bool,
    pub tracks: Option<TrackTable>,
    pub squares: Option<SquareSet>,
    pub image: Option<ImageDecay>,
    pub warnings: Vec<String>,
}

impl Ctx {
    pub fn new(config: GridConfig, meta: RecordingMeta, paths: RecordingPaths) -> Self {
        Self {
            config,
            meta,
            paths,
            fitter: Rc::new(MonoExpFitter::default()),
            background_override: None,
            neighbour_override: None,
            observers: Vec::new(),
            write_outputs: true,
            tracks: None,
            squares: None,
            image: None,
            warnings: Vec::new(),
        }
    }

    pub fn squares(&self) -> anyhow::Result<&SquareSet> {
        self.squares
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("squares not computed"))
    }

    pub fn take_squares(&mut self) -> anyhow::Result<SquareSet> {
        self.squares
            .take()
            .ok_or_else(|| anyhow::anyhow!("squares not computed"))
    }

    pub fn tracks(&self) -> anyhow::Result<&TrackTable> {
        self.tracks
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("tracks not loaded"))
    }
}
