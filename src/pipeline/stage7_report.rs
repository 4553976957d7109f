use anyhow::Result;

use crate::ctx::Ctx;
use crate::pipeline::Stage;
use crate::squares::GridMatrices;

pub struct Stage7Report;

impl Stage7Report {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage7Report {
    fn name(&self) -> &'static str {
        "stage7_report"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        if ctx.observers.is_empty() {
            return Ok(());
        }
        let matrices = GridMatrices::from_squares(ctx.squares()?);
        let recording = ctx.meta.ext_recording_name.clone();
        for observer in &mut ctx.observers {
            observer.on_matrices(&recording, &matrices)?;
        }
        Ok(())
    }
}
