use std::fmt::Display;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::squares::{GridMatrices, GridObserver};

/// Writes each grid matrix of a recording as a tab-separated file into the
/// recording's grid directory.
pub struct TsvMatrixWriter {
    pub dir: PathBuf,
}

impl TsvMatrixWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl GridObserver for TsvMatrixWriter {
    fn on_matrices(&mut self, recording: &str, matrices: &GridMatrices) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let path = |kind: &str| self.dir.join(format!("{recording}-{kind}.tsv"));
        write_matrix(&path("tau"), matrices, &matrices.tau)?;
        write_matrix(&path("density"), matrices, &matrices.density)?;
        write_matrix(&path("count"), matrices, &matrices.count)?;
        write_matrix(&path("variability"), matrices, &matrices.variability)?;
        let percentage: Vec<String> = matrices.percentage.iter().map(|p| format!("{p:.1}")).collect();
        write_matrix(&path("percentage"), matrices, &percentage)?;
        Ok(())
    }
}

fn write_matrix<T: Display>(path: &Path, matrices: &GridMatrices, values: &[T]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut w = BufWriter::new(file);
    for row in matrices.rows(values) {
        let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(w, "{}", line.join("\t"))?;
    }
    w.flush()?;
    Ok(())
}
