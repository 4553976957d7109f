use std::path::Path;

use anyhow::{Context, Result};

use crate::schema::v1::{RecordingMeta, SquareRecord, square_records};
use crate::squares::SquareSet;

pub fn write_squares(path: &Path, meta: &RecordingMeta, set: &SquareSet) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let mut w = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for record in square_records(meta, set) {
        w.serialize(record)?;
    }
    w.flush()?;
    Ok(())
}

pub fn read_squares(path: &Path) -> Result<Vec<SquareRecord>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut out = Vec::new();
    for (idx, record) in rdr.deserialize().enumerate() {
        let record: SquareRecord =
            record.with_context(|| format!("{}:{} malformed square row", path.display(), idx + 2))?;
        out.push(record);
    }
    Ok(out)
}
