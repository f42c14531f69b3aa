// Position quota policy: starting and bench slot counts per position.

use serde::Serialize;

use crate::position::Position;

/// Default cost discretization: prices move in steps of 0.1.
pub const DEFAULT_BUDGET_UNIT: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyError {
    #[error("invalid quota policy: {0}")]
    InvalidPolicy(String),
}

/// Slot counts for a single position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PositionSlots {
    pub starting: usize,
    pub bench: usize,
}

impl PositionSlots {
    pub fn total(&self) -> usize {
        self.starting + self.bench
    }
}

/// Immutable per-position quota table plus the budget unit used to index
/// costs during selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotaPolicy {
    slots: [PositionSlots; 4],
    budget_unit: f64,
}

impl QuotaPolicy {
    /// Build a policy from `(position, starting, bench)` entries.
    ///
    /// Counts are signed so that negative configuration values reach
    /// validation instead of wrapping. Positions not listed get no slots.
    /// A position listed twice is rejected.
    pub fn new<I>(quotas: I, budget_unit: f64) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = (Position, i64, i64)>,
    {
        if !budget_unit.is_finite() || budget_unit <= 0.0 {
            return Err(PolicyError::InvalidPolicy(format!(
                "budget unit must be a positive number, got {budget_unit}"
            )));
        }

        let mut slots = [PositionSlots::default(); 4];
        let mut listed = [false; 4];
        for (position, starting, bench) in quotas {
            if listed[position.index()] {
                return Err(PolicyError::InvalidPolicy(format!(
                    "position {position} listed more than once"
                )));
            }
            listed[position.index()] = true;

            if starting < 0 || bench < 0 {
                return Err(PolicyError::InvalidPolicy(format!(
                    "{position} counts must be >= 0, got starting={starting} bench={bench}"
                )));
            }
            slots[position.index()] = PositionSlots {
                starting: starting as usize,
                bench: bench as usize,
            };
        }

        let policy = QuotaPolicy { slots, budget_unit };
        if policy.total_squad_size() == 0 {
            return Err(PolicyError::InvalidPolicy(
                "total squad size must be greater than 0".into(),
            ));
        }
        Ok(policy)
    }

    /// Standard 15-man squad: 2 GK, 5 DEF, 5 MID, 3 FWD, with a 4-4-2
    /// starting line-up and one bench player per position.
    pub fn standard() -> Self {
        QuotaPolicy {
            slots: [
                PositionSlots { starting: 1, bench: 1 },
                PositionSlots { starting: 4, bench: 1 },
                PositionSlots { starting: 4, bench: 1 },
                PositionSlots { starting: 2, bench: 1 },
            ],
            budget_unit: DEFAULT_BUDGET_UNIT,
        }
    }

    pub fn slots_for(&self, position: Position) -> PositionSlots {
        self.slots[position.index()]
    }

    pub fn total_squad_size(&self) -> usize {
        self.slots.iter().map(PositionSlots::total).sum()
    }

    pub fn starting_size(&self) -> usize {
        self.slots.iter().map(|s| s.starting).sum()
    }

    pub fn bench_size(&self) -> usize {
        self.slots.iter().map(|s| s.bench).sum()
    }

    pub fn budget_unit(&self) -> f64 {
        self.budget_unit
    }

    /// Positions with at least one slot, in squad order.
    pub fn active_positions(&self) -> impl Iterator<Item = Position> + '_ {
        Position::ALL
            .into_iter()
            .filter(|p| self.slots_for(*p).total() > 0)
    }
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        QuotaPolicy::standard()
    }
}
