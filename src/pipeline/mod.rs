use anyhow::Result;
use std::time::Instant;
use tracing::{debug, warn};

use crate::ctx::Ctx;

pub mod stage1_tracks;
pub mod stage2_squares;
pub mod stage3_validity;
pub mod stage4_visibility;
pub mod stage5_labels;
pub mod stage6_image;
pub mod stage7_report;
pub mod stage8_output;

pub trait Stage {
    fn name(&self) -> &'static str;
    fn run(&self, ctx: &mut Ctx) -> Result<()>;
}

pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// The full per-recording sequence, from loading tracks to writing the
    /// square table.
    pub fn recording() -> Self {
        Self::new(vec![
            Box::new(stage1_tracks::Stage1Tracks::new()),
            Box::new(stage2_squares::Stage2Squares::new()),
            Box::new(stage3_validity::Stage3Validity::new()),
            Box::new(stage4_visibility::Stage4Visibility::new()),
            Box::new(stage5_labels::Stage5Labels::new()),
            Box::new(stage6_image::Stage6Image::new()),
            Box::new(stage7_report::Stage7Report::new()),
            Box::new(stage8_output::Stage8Output::new()),
        ])
    }

    pub fn run(&self, ctx: &mut Ctx) -> Result<()> {
        for stage in &self.stages {
            let start = Instant::now();
            debug!(
                stage = stage.name(),
                recording = %ctx.meta.ext_recording_name,
                "stage started"
            );
            if let Err(err) = stage.run(ctx) {
                let elapsed_ms = start.elapsed().as_millis();
                warn!(
                    stage = stage.name(),
                    recording = %ctx.meta.ext_recording_name,
                    elapsed_ms = elapsed_ms as u64,
                    "stage failed"
                );
                return Err(err);
            }
            let elapsed_ms = start.elapsed().as_millis();
            debug!(
                stage = stage.name(),
                elapsed_ms = elapsed_ms as u64,
                "stage finished"
            );
        }
        Ok(())
    }
}
