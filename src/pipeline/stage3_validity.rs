use anyhow::Result;

use crate::ctx::Ctx;
use crate::pipeline::Stage;
use crate::squares::with_validity;

pub struct Stage3Validity;

impl Stage3Validity {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage3Validity {
    fn name(&self) -> &'static str {
        "stage3_validity"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let set = ctx.take_squares()?;
        ctx.squares = Some(with_validity(set));
        Ok(())
    }
}
