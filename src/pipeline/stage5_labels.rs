use anyhow::Result;

use crate::ctx::Ctx;
use crate::pipeline::Stage;
use crate::squares::with_labels;

pub struct Stage5Labels;

impl Stage5Labels {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage5Labels {
    fn name(&self) -> &'static str {
        "stage5_labels"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let set = ctx.take_squares()?;
        ctx.squares = Some(with_labels(set));
        Ok(())
    }
}
