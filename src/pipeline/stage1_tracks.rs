use anyhow::Result;
use tracing::info;

use crate::ctx::Ctx;
use crate::io::tracks::read_tracks;
use crate::pipeline::Stage;

pub struct Stage1Tracks;

impl Stage1Tracks {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage1Tracks {
    fn name(&self) -> &'static str {
        "stage1_tracks"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        if ctx.tracks.is_some() {
            return Ok(());
        }
        let table = read_tracks(&ctx.paths.tracks)?;
        if table.skipped_rows > 0 {
            ctx.warnings.push(format!(
                "{}: skipped {} non-numeric track rows",
                ctx.meta.ext_recording_name, table.skipped_rows
            ));
        }
        info!(
            recording = %ctx.meta.ext_recording_name,
            tracks = table.tracks.len(),
            "tracks loaded"
        );
        ctx.tracks = Some(table);
        Ok(())
    }
}
