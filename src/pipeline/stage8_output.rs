use anyhow::Result;
use tracing::info;

use crate::ctx::Ctx;
use crate::io::squares_table::write_squares;
use crate::io::tracks::write_labelled_tracks;
use crate::pipeline::Stage;

pub struct Stage8Output;

impl Stage8Output {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage8Output {
    fn name(&self) -> &'static str {
        "stage8_output"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        if !ctx.write_outputs {
            return Ok(());
        }
        let set = ctx.squares()?;
        let tracks = ctx.tracks()?;
        write_squares(&ctx.paths.squares, &ctx.meta, set)?;
        write_labelled_tracks(
            &ctx.paths.labelled_tracks,
            tracks,
            &set.track_squares,
            &set.track_labels(),
        )?;
        info!(
            recording = %ctx.meta.ext_recording_name,
            squares = %ctx.paths.squares.display(),
            "square table written"
        );
        Ok(())
    }
}
