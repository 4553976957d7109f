use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::io::open_maybe_gz;

/// A loosely typed CSV table that keeps every column in its original order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn read(path: &Path) -> Result<Self> {
        let reader = open_maybe_gz(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers: Vec<String> = rdr
            .headers()
            .with_context(|| format!("failed to read header of {}", path.display()))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if headers.iter().all(|h| h.is_empty()) {
            bail!("{} has no header", path.display());
        }

        let mut rows = Vec::new();
        for (idx, record) in rdr.records().enumerate() {
            let record =
                record.with_context(|| format!("{}:{} malformed row", path.display(), idx + 2))?;
            let mut row: Vec<String> = record.iter().map(|v| v.to_string()).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }
        Ok(Self { headers, rows })
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let mut w = csv::Writer::from_path(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        w.write_record(&self.headers)?;
        for row in &self.rows {
            w.write_record(row)?;
        }
        w.flush()?;
        Ok(())
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Index of `name`, appending an empty column when it does not exist yet.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column(name) {
            return idx;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    pub fn get(&self, row: usize, name: &str) -> Option<&str> {
        let col = self.column(name)?;
        self.rows.get(row).map(|r| r[col].as_str())
    }

    pub fn set(&mut self, row: usize, name: &str, value: impl ToString) {
        let col = self.ensure_column(name);
        self.rows[row][col] = value.to_string();
    }

    /// Appends `other`'s rows, aligning columns by name. Columns missing on
    /// either side are filled with empty values.
    pub fn append(&mut self, other: &Table) {
        let mapping: Vec<usize> = other.headers.iter().map(|h| self.ensure_column(h)).collect();
        let width = self.headers.len();
        for src in &other.rows {
            let mut row = vec![String::new(); width];
            for (value, &col) in src.iter().zip(&mapping) {
                row[col] = value.clone();
            }
            self.rows.push(row);
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "y" | "1"
    )
}

pub fn format_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}
