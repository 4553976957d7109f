use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::error::PaintError;
use crate::io::table::Table;
use crate::schema::v1::RecordingMeta;

pub const REQUIRED_COLUMNS: [&str; 12] = [
    "Recording Name",
    "Ext Recording Name",
    "Threshold",
    "Process",
    "Exclude",
    "Concentration",
    "Nr Spots",
    "Recording Sequence Nr",
    "Condition Nr",
    "Replicate Nr",
    "Experiment Date",
    "Experiment Name",
];

/// An experiment manifest: one row per recording, arbitrary extra columns
/// preserved.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub path: PathBuf,
    pub table: Table,
}

impl Manifest {
    /// Reads and validates a manifest. Any failure is a fatal precondition.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(PaintError::fatal(path, "manifest not found").into());
        }
        let table = Table::read(path).map_err(|e| PaintError::fatal(path, format!("{e:#}")))?;
        if table.is_empty() {
            return Err(PaintError::fatal(path, "manifest is empty").into());
        }
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| table.column(c).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(
                PaintError::fatal(path, format!("missing columns: {}", missing.join(", "))).into(),
            );
        }
        Ok(Self {
            path: path.to_path_buf(),
            table,
        })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn get(&self, row: usize, column: &str) -> &str {
        self.table.get(row, column).unwrap_or("")
    }

    pub fn should_process(&self, row: usize) -> bool {
        is_process_flag(self.get(row, "Process"))
    }

    /// `<Recording Name>-threshold-<Threshold>`.
    pub fn ext_recording_name(&self, row: usize) -> String {
        format!(
            "{}-threshold-{}",
            self.get(row, "Recording Name").trim(),
            self.get(row, "Threshold").trim()
        )
    }

    pub fn recording_meta(&self, row: usize) -> RecordingMeta {
        RecordingMeta {
            ext_recording_name: self.ext_recording_name(row),
            experiment_name: self.get(row, "Experiment Name").trim().to_string(),
            experiment_date: self.get(row, "Experiment Date").trim().to_string(),
            recording_sequence_nr: parse_int(self.get(row, "Recording Sequence Nr")),
            condition_nr: parse_int(self.get(row, "Condition Nr")),
            replicate_nr: parse_int(self.get(row, "Replicate Nr")),
            concentration: parse_float(self.get(row, "Concentration")),
            nr_spots: parse_int(self.get(row, "Nr Spots")),
        }
    }

    pub fn set(&mut self, row: usize, column: &str, value: impl ToString) {
        self.table.set(row, column, value);
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        self.table.write(path)
    }
}

/// `Yes`, `yes`, `Y` and `y` mark a row for processing.
pub fn is_process_flag(value: &str) -> bool {
    matches!(value.trim(), "Yes" | "yes" | "Y" | "y")
}

fn parse_int(value: &str) -> i64 {
    let v = value.trim();
    v.parse::<i64>()
        .ok()
        .or_else(|| v.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        .unwrap_or(0)
}

fn parse_float(value: &str) -> f64 {
    value.trim().parse::<f64>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_flag_variants() {
        for v in ["Yes", "yes", "Y", "y", " y "] {
            assert!(is_process_flag(v), "{v}");
        }
        for v in ["No", "n", "", "YES", "true"] {
            assert!(!is_process_flag(v), "{v}");
        }
    }

    #[test]
    fn integers_written_as_floats_parse() {
        assert_eq!(parse_int("3.0"), 3);
        assert_eq!(parse_int("x"), 0);
    }
}
