use anyhow::Result;

use crate::ctx::Ctx;
use crate::pipeline::Stage;
use crate::squares::{SquareInputs, compute_squares};

pub struct Stage2Squares;

impl Stage2Squares {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage2Squares {
    fn name(&self) -> &'static str {
        "stage2_squares"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let tracks = ctx.tracks()?;
        let inputs = SquareInputs {
            config: &ctx.config,
            concentration: ctx.meta.concentration,
            background_track_count: ctx.background_override,
            fitter: ctx.fitter.as_ref(),
        };
        let set = compute_squares(&tracks.tracks, &inputs);
        ctx.squares = Some(set);
        Ok(())
    }
}
