// Top-N player ranking, per position and overall.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::candidate::{value_order, Candidate};
use crate::position::Position;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RankerError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Per-position groups, each sorted by predicted points (highest first),
/// then cost (cheapest first), then id. Every position has a group, possibly
/// empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedList {
    /// Requested group length; groups are shorter when a position has fewer
    /// candidates.
    pub n: usize,
    pub groups: BTreeMap<Position, Vec<Candidate>>,
}

impl RankedList {
    pub fn group(&self, position: Position) -> &[Candidate] {
        self.groups.get(&position).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Groups in position order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &[Candidate])> {
        self.groups.iter().map(|(p, g)| (*p, g.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn checked_n(n: i64) -> Result<usize, RankerError> {
    usize::try_from(n)
        .map_err(|_| RankerError::InvalidArgument(format!("n must be >= 0, got {n}")))
}

/// Top `n` candidates at every position.
pub fn rank(candidates: &[Candidate], n: i64) -> Result<RankedList, RankerError> {
    let n = checked_n(n)?;

    let mut groups: BTreeMap<Position, Vec<Candidate>> =
        Position::ALL.into_iter().map(|p| (p, Vec::new())).collect();
    for c in candidates {
        groups.entry(c.position).or_default().push(c.clone());
    }
    for group in groups.values_mut() {
        group.sort_by(value_order);
        group.truncate(n);
    }

    Ok(RankedList { n, groups })
}

/// Top `n` candidates regardless of position, in the same order.
pub fn rank_overall(candidates: &[Candidate], n: i64) -> Result<Vec<Candidate>, RankerError> {
    let n = checked_n(n)?;
    let mut all = candidates.to_vec();
    all.sort_by(value_order);
    all.truncate(n);
    Ok(all)
}
