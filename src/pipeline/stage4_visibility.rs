use anyhow::Result;
use tracing::debug;

use crate::ctx::Ctx;
use crate::pipeline::Stage;
use crate::squares::{VisibilityThresholds, with_visibility};

pub struct Stage4Visibility;

impl Stage4Visibility {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage4Visibility {
    fn name(&self) -> &'static str {
        "stage4_visibility"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let thresholds = VisibilityThresholds {
            max_variability: ctx.config.max_variability,
            min_density_ratio: ctx.config.min_density_ratio,
            neighbour_mode: ctx.config.neighbour_mode,
        };
        let set = ctx.take_squares()?;
        if let Some(mask) = &ctx.neighbour_override {
            if mask.len() != set.squares.len() {
                ctx.warnings.push(format!(
                    "{}: neighbour mask has {} entries for {} squares; ignored",
                    ctx.meta.ext_recording_name,
                    mask.len(),
                    set.squares.len()
                ));
            }
        }
        let set = with_visibility(set, &thresholds, ctx.neighbour_override.as_deref());
        debug!(
            recording = %ctx.meta.ext_recording_name,
            visible = set.visible_count(),
            total = set.total(),
            "visibility resolved"
        );
        ctx.squares = Some(set);
        Ok(())
    }
}
