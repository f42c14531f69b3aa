// Candidate records and the table adapter that builds them from raw rows.
//
// Raw rows arrive untyped (every field an optional string). The adapter
// validates each row independently: a bad row is reported and skipped, never
// fatal to the batch.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::position::Position;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One predicted-performance record for the target gameweek.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub player_id: String,
    pub position: Position,
    /// Price in budget units (e.g. millions).
    pub cost: f64,
    pub predicted_points: f64,
    /// Display name (FPL `web_name`), if the table carries one.
    #[serde(default)]
    pub name: Option<String>,
    /// Club name, if the table carries one.
    #[serde(default)]
    pub team: Option<String>,
}

impl Candidate {
    pub fn new(
        player_id: impl Into<String>,
        position: Position,
        cost: f64,
        predicted_points: f64,
    ) -> Self {
        Candidate {
            player_id: player_id.into(),
            position,
            cost,
            predicted_points,
            name: None,
            team: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    /// Name for display: the web name when present, otherwise the id.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.player_id)
    }

    /// Predicted points per unit of cost.
    pub fn points_per_million(&self) -> f64 {
        self.predicted_points / self.cost
    }
}

/// Value ordering shared by ranking, bench splitting and captaincy: higher
/// predicted points first, then the cheaper player, then the lower id.
pub fn value_order(a: &Candidate, b: &Candidate) -> Ordering {
    b.predicted_points
        .total_cmp(&a.predicted_points)
        .then_with(|| a.cost.total_cmp(&b.cost))
        .then_with(|| id_order(&a.player_id, &b.player_id))
}

/// Cheapest first, then the lower id.
pub fn cost_order(a: &Candidate, b: &Candidate) -> Ordering {
    a.cost
        .total_cmp(&b.cost)
        .then_with(|| id_order(&a.player_id, &b.player_id))
}

/// Player id ordering. FPL element ids are integers, so two ids that both
/// parse as unsigned integers compare numerically ("9" before "10"). Numeric
/// ids sort before other ids; anything else compares as plain text.
pub fn id_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// An incoming row before validation. `row` is the 1-based data row number
/// used in diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    pub row: usize,
    pub player_id: Option<String>,
    pub position: Option<String>,
    pub cost: Option<String>,
    pub predicted_points: Option<String>,
    pub name: Option<String>,
    pub team: Option<String>,
}

/// Why a row was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MalformedRecord {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` is not a number: {value:?}")]
    NotANumber { field: &'static str, value: String },

    #[error("field `{0}` is not a finite number")]
    NonFinite(&'static str),

    #[error("cost must be positive, got {0}")]
    NonPositiveCost(f64),

    #[error("unknown position {0:?}")]
    UnknownPosition(String),

    #[error("duplicate player_id {0:?}; keeping the first occurrence")]
    DuplicatePlayerId(String),

    #[error("row could not be decoded: {0}")]
    Undecodable(String),
}

/// Diagnostic for a row the adapter skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    pub row: usize,
    pub player_id: Option<String>,
    pub error: MalformedRecord,
}

impl fmt::Display for SkippedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.player_id {
            Some(id) => write!(f, "row {} ({}): {}", self.row, id, self.error),
            None => write!(f, "row {}: {}", self.row, self.error),
        }
    }
}

/// The valid subset of a row batch plus diagnostics for everything skipped.
#[derive(Debug, Clone, Default)]
pub struct AdaptedTable {
    pub candidates: Vec<Candidate>,
    pub skipped: Vec<SkippedRow>,
}

impl AdaptedTable {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// Normalize a batch of raw rows into candidates.
///
/// Rows are validated independently. Duplicate ids keep the first valid
/// occurrence; later ones are reported as skipped.
pub fn adapt<I>(rows: I) -> AdaptedTable
where
    I: IntoIterator<Item = RawRow>,
{
    let mut table = AdaptedTable::default();
    let mut seen: HashSet<String> = HashSet::new();

    for raw in rows {
        let row = raw.row;
        let player_id = non_empty(raw.player_id.as_deref()).map(str::to_string);
        match adapt_row(raw) {
            Ok(candidate) => {
                if !seen.insert(candidate.player_id.clone()) {
                    let error = MalformedRecord::DuplicatePlayerId(candidate.player_id.clone());
                    warn!("skipping row {}: {}", row, error);
                    table.skipped.push(SkippedRow {
                        row,
                        player_id,
                        error,
                    });
                    continue;
                }
                table.candidates.push(candidate);
            }
            Err(error) => {
                warn!("skipping row {}: {}", row, error);
                table.skipped.push(SkippedRow {
                    row,
                    player_id,
                    error,
                });
            }
        }
    }

    table
}

/// Validate a single row.
pub fn adapt_row(raw: RawRow) -> Result<Candidate, MalformedRecord> {
    let player_id = non_empty(raw.player_id.as_deref())
        .ok_or(MalformedRecord::MissingField("player_id"))?
        .to_string();

    let position_str =
        non_empty(raw.position.as_deref()).ok_or(MalformedRecord::MissingField("position"))?;
    let position = Position::from_str_pos(position_str)
        .ok_or_else(|| MalformedRecord::UnknownPosition(position_str.to_string()))?;

    let cost = parse_number("cost", raw.cost.as_deref())?;
    if cost <= 0.0 {
        return Err(MalformedRecord::NonPositiveCost(cost));
    }

    let predicted_points = parse_number("predicted_points", raw.predicted_points.as_deref())?;

    Ok(Candidate {
        player_id,
        position,
        cost,
        predicted_points,
        name: non_empty(raw.name.as_deref()).map(str::to_string),
        team: non_empty(raw.team.as_deref()).map(str::to_string),
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_number(field: &'static str, value: Option<&str>) -> Result<f64, MalformedRecord> {
    let text = non_empty(value).ok_or(MalformedRecord::MissingField(field))?;
    let parsed: f64 = text.parse().map_err(|_| MalformedRecord::NotANumber {
        field,
        value: text.to_string(),
    })?;
    if !parsed.is_finite() {
        return Err(MalformedRecord::NonFinite(field));
    }
    Ok(parsed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
