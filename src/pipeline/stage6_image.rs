use anyhow::Result;

use crate::ctx::Ctx;
use crate::pipeline::Stage;
use crate::squares::{ImageDecay, image_decay};

pub struct Stage6Image;

impl Stage6Image {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage6Image {
    fn name(&self) -> &'static str {
        "stage6_image"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let image = if ctx.config.compute_image_decay {
            image_decay(
                ctx.squares()?,
                &ctx.tracks()?.tracks,
                &ctx.config,
                ctx.meta.concentration,
                ctx.fitter.as_ref(),
            )
        } else {
            ImageDecay::disabled()
        };
        ctx.image = Some(image);
        Ok(())
    }
}
