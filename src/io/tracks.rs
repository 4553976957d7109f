use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::warn;

use crate::error::PaintError;
use crate::io::table::Table;
use crate::squares::Track;

pub const COL_X: &str = "TRACK_X_LOCATION";
pub const COL_Y: &str = "TRACK_Y_LOCATION";
pub const COL_DURATION: &str = "TRACK_DURATION";
pub const COL_DIFFUSION: &str = "DIFFUSION_COEFFICIENT";

/// Parsed tracks together with the raw rows they came from, so that the
/// table can be written back with square and label columns appended.
#[derive(Debug, Clone)]
pub struct TrackTable {
    pub table: Table,
    pub tracks: Vec<Track>,
    pub skipped_rows: usize,
}

pub fn read_tracks(path: &Path) -> Result<TrackTable> {
    if !path.is_file() {
        return Err(PaintError::MissingInput(path.to_path_buf()).into());
    }
    let raw = Table::read(path)?;
    parse_tracks(raw, &path.display().to_string())
}

pub fn parse_tracks(raw: Table, source: &str) -> Result<TrackTable> {
    let mut cols = [0usize; 4];
    for (slot, name) in cols.iter_mut().zip([COL_X, COL_Y, COL_DURATION, COL_DIFFUSION]) {
        *slot = match raw.column(name) {
            Some(idx) => idx,
            None => bail!("{} is missing column {}", source, name),
        };
    }

    let mut table = Table {
        headers: raw.headers.clone(),
        rows: Vec::with_capacity(raw.rows.len()),
    };
    let mut tracks = Vec::with_capacity(raw.rows.len());
    let mut skipped_rows = 0usize;
    for (idx, row) in raw.rows.into_iter().enumerate() {
        let number = |c: usize| row[c].trim().parse::<f64>().ok();
        let (Some(x), Some(y), Some(duration)) = (number(cols[0]), number(cols[1]), number(cols[2]))
        else {
            // TrackMate exports carry label and unit rows below the header.
            if tracks.is_empty() {
                skipped_rows += 1;
                continue;
            }
            bail!("{}:{} malformed track row", source, idx + 2);
        };
        tracks.push(Track {
            x,
            y,
            duration,
            diffusion_coefficient: number(cols[3]).unwrap_or(f64::NAN),
        });
        table.rows.push(row);
    }
    if skipped_rows > 0 {
        warn!(source, skipped_rows, "leading non-numeric track rows skipped");
    }
    Ok(TrackTable {
        table,
        tracks,
        skipped_rows,
    })
}

/// Writes the track table with `Square Nr` and `Label Nr` columns. Tracks
/// outside the field get an empty square number.
pub fn write_labelled_tracks(
    path: &Path,
    tracks: &TrackTable,
    track_squares: &[Option<usize>],
    track_labels: &[usize],
) -> Result<()> {
    if track_squares.len() != tracks.tracks.len() || track_labels.len() != tracks.tracks.len() {
        bail!(
            "square assignment length mismatch: {} tracks, {} squares, {} labels",
            tracks.tracks.len(),
            track_squares.len(),
            track_labels.len()
        );
    }
    let mut table = tracks.table.clone();
    let square_col = table.ensure_column("Square Nr");
    let label_col = table.ensure_column("Label Nr");
    for (i, row) in table.rows.iter_mut().enumerate() {
        row[square_col] = track_squares[i].map(|s| s.to_string()).unwrap_or_default();
        row[label_col] = track_labels[i].to_string();
    }
    table
        .write(path)
        .with_context(|| format!("failed to write labelled tracks {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[[&str; 4]]) -> Table {
        Table {
            headers: [COL_X, COL_Y, COL_DURATION, COL_DIFFUSION]
                .iter()
                .map(|h| h.to_string())
                .collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|v| v.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn missing_diffusion_keeps_the_track() {
        let raw = table(&[["1", "1", "1", "0.1"], ["2", "2", "0.5", ""], ["3", "3", "2", "0.2"]]);
        let parsed = parse_tracks(raw, "t.csv").unwrap();
        assert_eq!(parsed.tracks.len(), 3);
        assert_eq!(parsed.skipped_rows, 0);
        assert_eq!(parsed.tracks[1].duration, 0.5);
        assert!(parsed.tracks[1].diffusion_coefficient.is_nan());
        assert_eq!(parsed.table.len(), 3);
    }

    #[test]
    fn only_leading_label_rows_are_skipped() {
        let raw = table(&[
            ["X", "Y", "Duration", "Diffusion"],
            ["(micron)", "(micron)", "(sec)", ""],
            ["1", "1", "1", "0.1"],
        ]);
        let parsed = parse_tracks(raw, "t.csv").unwrap();
        assert_eq!(parsed.tracks.len(), 1);
        assert_eq!(parsed.skipped_rows, 2);

        let raw = table(&[["1", "1", "1", "0.1"], ["2", "", "1", "0.1"]]);
        let err = parse_tracks(raw, "t.csv").unwrap_err();
        assert!(format!("{err}").contains("t.csv:3"));
    }
}
