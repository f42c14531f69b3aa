// Candidate table ingestion from CSV.
//
// Accepts the prediction table written by the upstream model pipeline. Column
// names follow either this crate's names or the FPL ones (`element_type`,
// `now_cost`, `total_points`, `web_name`, `team_name`). Extra columns are
// ignored.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::candidate::{adapt, AdaptedTable, MalformedRecord, RawRow, SkippedRow};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("{path} produced zero valid candidates ({skipped} rows skipped)")]
    Empty { path: String, skipped: usize },
}

/// CSV row as written by the prediction pipeline. Every field is optional;
/// the adapter decides what is missing.
#[derive(Debug, Deserialize)]
struct RawCsvRow {
    #[serde(default, alias = "id", alias = "element")]
    player_id: Option<String>,
    #[serde(default, alias = "element_type", alias = "pos")]
    position: Option<String>,
    #[serde(default, alias = "now_cost", alias = "price")]
    cost: Option<String>,
    #[serde(default, alias = "total_points", alias = "points")]
    predicted_points: Option<String>,
    #[serde(default, alias = "web_name")]
    name: Option<String>,
    #[serde(default, alias = "team_name")]
    team: Option<String>,
}

impl RawCsvRow {
    fn into_raw(self, row: usize) -> RawRow {
        // Tables without an id column identify players by web name.
        let player_id = self.player_id.or_else(|| self.name.clone());
        RawRow {
            row,
            player_id,
            position: self.position,
            cost: self.cost,
            predicted_points: self.predicted_points,
            name: self.name,
            team: self.team,
        }
    }
}

/// Read and adapt a candidate table from any reader.
///
/// Only a broken header is fatal; undecodable records become skipped-row
/// diagnostics alongside the adapter's own.
pub fn load_candidates_from_reader<R: Read>(rdr: R) -> Result<AdaptedTable, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    reader.headers()?;

    let mut rows = Vec::new();
    let mut undecodable = Vec::new();
    for (i, result) in reader.deserialize::<RawCsvRow>().enumerate() {
        let row = i + 1;
        match result {
            Ok(raw) => rows.push(raw.into_raw(row)),
            Err(e) => {
                warn!("skipping undecodable row {}: {}", row, e);
                undecodable.push(SkippedRow {
                    row,
                    player_id: None,
                    error: MalformedRecord::Undecodable(e.to_string()),
                });
            }
        }
    }

    let mut table = adapt(rows);
    if !undecodable.is_empty() {
        table.skipped.extend(undecodable);
        table.skipped.sort_by_key(|s| s.row);
    }
    Ok(table)
}

/// Load a candidate table from a CSV file. Fails when the file yields no
/// valid candidates at all.
pub fn load_candidates(path: &Path) -> Result<AdaptedTable, LoadError> {
    let file = std::fs::File::open(path).map_err(|e| LoadError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let table = load_candidates_from_reader(file).map_err(|e| LoadError::Csv {
        path: path.display().to_string(),
        source: e,
    })?;

    if table.candidates.is_empty() {
        return Err(LoadError::Empty {
            path: path.display().to_string(),
            skipped: table.skipped.len(),
        });
    }

    info!(
        "Loaded {} candidates from {} ({} rows skipped)",
        table.candidates.len(),
        path.display(),
        table.skipped.len()
    );
    Ok(table)
}
