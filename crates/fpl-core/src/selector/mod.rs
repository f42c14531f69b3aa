// Budget-constrained squad selection.
//
// Chooses, per position, exactly the quota's number of players so that total
// predicted points are maximal and total cost stays within budget. Costs are
// indexed in the policy's budget unit (rounded up, so the real total never
// exceeds the budget). The exact path is a dynamic program, wrapped in a
// best-first exclusion search when a per-club limit applies. A greedy swap
// search is the explicit, reported fallback when the exact search exceeds
// its time limit or would outgrow its memory bound.

mod dp;
mod greedy;

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashSet};
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::candidate::{cost_order, id_order, value_order, Candidate};
use crate::position::Position;
use crate::quota::QuotaPolicy;

/// Tolerance used when mapping real costs onto the budget-unit grid.
const GRID_EPSILON: f64 = 1e-9;

/// Largest single cost, in budget units, the grid represents.
const MAX_GRID_UNITS: f64 = u32::MAX as f64;

/// Exact solves the club-limit search may run before giving up.
const MAX_CLUB_NODES: usize = 1024;

// ---------------------------------------------------------------------------
// Request / result types
// ---------------------------------------------------------------------------

/// How bench slots are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchMode {
    /// Bench slots are optimized together with starters and their predicted
    /// points count toward the objective.
    Joint,
    /// Only starters are optimized. Each position's bench is the cheapest
    /// candidates left after the starters are chosen.
    CheapestFill,
}

impl BenchMode {
    pub fn from_auto_select(auto_select_bench: bool) -> Self {
        if auto_select_bench {
            BenchMode::CheapestFill
        } else {
            BenchMode::Joint
        }
    }
}

/// What to do when the exact search is abandoned (time limit or table size).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Return the greedy approximation, marked as such.
    #[default]
    Greedy,
    /// Return `SelectorError::TimedOut` or `SelectorError::SearchTooLarge`.
    Fail,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionRequest {
    pub budget: f64,
    pub auto_select_bench: bool,
    /// Wall-clock bound on the exact search. `None` means unbounded.
    pub time_limit: Option<Duration>,
    pub fallback: FallbackPolicy,
    /// At most this many players from one club. Players without a team are
    /// not counted. `None` means no limit.
    pub max_per_club: Option<usize>,
}

impl SelectionRequest {
    pub fn new(budget: f64) -> Self {
        SelectionRequest {
            budget,
            auto_select_bench: false,
            time_limit: None,
            fallback: FallbackPolicy::Greedy,
            max_per_club: None,
        }
    }

    pub fn with_auto_select_bench(mut self, auto_select_bench: bool) -> Self {
        self.auto_select_bench = auto_select_bench;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_max_per_club(mut self, limit: usize) -> Self {
        self.max_per_club = Some(limit);
        self
    }

    pub fn bench_mode(&self) -> BenchMode {
        BenchMode::from_auto_select(self.auto_select_bench)
    }
}

/// Which search produced a squad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionMethod {
    /// Optimal at the policy's cost discretization.
    Exact,
    /// Approximate; `reason` says why the exact search was abandoned.
    Greedy { reason: String },
}

impl SelectionMethod {
    pub fn is_exact(&self) -> bool {
        matches!(self, SelectionMethod::Exact)
    }
}

impl fmt::Display for SelectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionMethod::Exact => write!(f, "exact"),
            SelectionMethod::Greedy { reason } => write!(f, "greedy ({reason})"),
        }
    }
}

/// A selected squad. Starters and bench are each ordered by position, then
/// by predicted points (highest first).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Squad {
    pub starters: Vec<Candidate>,
    pub bench: Vec<Candidate>,
    pub budget: f64,
    pub bench_mode: BenchMode,
    pub method: SelectionMethod,
}

impl Squad {
    /// Every selected player, starters first.
    pub fn players(&self) -> impl Iterator<Item = &Candidate> {
        self.starters.iter().chain(self.bench.iter())
    }

    pub fn len(&self) -> usize {
        self.starters.len() + self.bench.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_cost(&self) -> f64 {
        self.players().map(|c| c.cost).sum()
    }

    pub fn total_predicted_points(&self) -> f64 {
        self.players().map(|c| c.predicted_points).sum()
    }

    pub fn starting_points(&self) -> f64 {
        self.starters.iter().map(|c| c.predicted_points).sum()
    }

    /// Budget left unspent.
    pub fn bank(&self) -> f64 {
        self.budget - self.total_cost()
    }

    /// Highest-scoring starter; ties go to the cheaper, then lower id.
    pub fn captain(&self) -> Option<&Candidate> {
        self.starters.iter().min_by(|a, b| value_order(a, b))
    }

    /// Second-highest-scoring starter.
    pub fn vice_captain(&self) -> Option<&Candidate> {
        let mut ranked: Vec<&Candidate> = self.starters.iter().collect();
        ranked.sort_by(|a, b| value_order(a, b));
        ranked.get(1).copied()
    }

    /// (starters, bench) selected at `position`.
    pub fn count_for(&self, position: Position) -> (usize, usize) {
        (
            self.starters.iter().filter(|c| c.position == position).count(),
            self.bench.iter().filter(|c| c.position == position).count(),
        )
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SelectorError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(
        "not enough {position} candidates: {required} required, {available} available; \
         add at least {shortfall} more"
    )]
    InsufficientCandidates {
        position: Position,
        required: usize,
        available: usize,
        shortfall: usize,
    },

    #[error(
        "no squad fits a budget of {budget:.1}: the cheapest legal squad costs \
         {minimum_budget:.1}; raise the budget by at least {shortfall:.1}"
    )]
    InfeasibleBudget {
        budget: f64,
        minimum_budget: f64,
        shortfall: f64,
    },

    #[error("exact selection exceeded its time limit after {elapsed:?}")]
    TimedOut { elapsed: Duration },

    #[error("exact selection abandoned: {reason}")]
    SearchTooLarge { reason: String },

    #[error(
        "no squad within the budget has at most {limit} players per club; \
         raise the budget or the club limit"
    )]
    ClubLimit { limit: usize },
}

// ---------------------------------------------------------------------------
// Internal plumbing shared with dp / greedy
// ---------------------------------------------------------------------------

/// One candidate as seen by the search: discretized cost and objective value.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GroupItem {
    pub units: usize,
    pub value: f64,
    /// Interned club index; `None` when the candidate has no team.
    pub club: Option<usize>,
}

/// Quota and mode for one position group.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GroupPlan {
    pub position: Position,
    pub starting: usize,
    pub bench: usize,
    pub mode: BenchMode,
}

/// Indices into a group's items. Under joint selection every pick lands in
/// `starters` and is split afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct GroupChoice {
    pub starters: Vec<usize>,
    pub bench: Vec<usize>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct TimedOut;

/// Optional wall-clock deadline checked between units of DP work.
pub(crate) struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    #[cfg(test)]
    pub(crate) fn none() -> Self {
        Deadline { at: None }
    }

    pub(crate) fn after(limit: Option<Duration>) -> Self {
        Deadline {
            // A limit too large to represent is no limit.
            at: limit.and_then(|l| Instant::now().checked_add(l)),
        }
    }

    #[cfg(test)]
    pub(crate) fn expired() -> Self {
        Deadline {
            at: Some(Instant::now()),
        }
    }

    pub(crate) fn check(&self) -> Result<(), TimedOut> {
        match self.at {
            Some(at) if Instant::now() >= at => Err(TimedOut),
            _ => Ok(()),
        }
    }
}

/// Round a cost up onto the unit grid. `None` when the result is beyond
/// `MAX_GRID_UNITS`.
fn cost_units(cost: f64, unit: f64) -> Option<usize> {
    let units = ((cost / unit) - GRID_EPSILON).ceil().max(0.0);
    (units <= MAX_GRID_UNITS).then_some(units as usize)
}

/// Round a budget down onto the unit grid, capped at `cap` units.
fn budget_units(budget: f64, unit: f64, cap: usize) -> usize {
    let units = ((budget / unit) + GRID_EPSILON).floor().max(0.0);
    if units >= cap as f64 {
        cap
    } else {
        units as usize
    }
}

fn infeasible(budget: f64, minimum_units: usize, unit: f64) -> SelectorError {
    let minimum_budget = units_to_money(minimum_units, unit);
    SelectorError::InfeasibleBudget {
        budget,
        minimum_budget,
        shortfall: ((minimum_budget - budget) * 1e6).round() / 1e6,
    }
}

fn units_to_money(units: usize, unit: f64) -> f64 {
    // Re-round so that e.g. 122 * 0.1 prints and compares as 12.2.
    let raw = units as f64 * unit;
    (raw * 1e6).round() / 1e6
}

/// Sum of the `take` smallest (or largest) units in a group.
fn extreme_units(items: &[GroupItem], take: usize, largest: bool) -> Option<usize> {
    let mut units: Vec<usize> = items.iter().map(|item| item.units).collect();
    if largest {
        units.sort_unstable_by(|a, b| b.cmp(a));
    } else {
        units.sort_unstable();
    }
    units
        .into_iter()
        .take(take)
        .try_fold(0usize, |total, u| total.checked_add(u))
}

fn grid_overflow() -> SelectorError {
    SelectorError::InvalidArgument(
        "squad cost is too large to index in the budget unit".to_string(),
    )
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Select the squad with the most predicted points that fits the policy and
/// budget, and the request's club limit when it sets one.
///
/// Deterministic: the result does not depend on the order of `candidates`.
pub fn select(
    candidates: &[Candidate],
    policy: &QuotaPolicy,
    request: &SelectionRequest,
) -> Result<Squad, SelectorError> {
    let started = Instant::now();
    validate(candidates, request)?;

    let mode = request.bench_mode();
    let unit = policy.budget_unit();

    // Group candidates per position in the order the search visits them.
    let mut pools: Vec<(GroupPlan, Vec<&Candidate>)> = Vec::new();
    for position in policy.active_positions() {
        let slots = policy.slots_for(position);
        let mut pool: Vec<&Candidate> = candidates
            .iter()
            .filter(|c| c.position == position)
            .collect();
        if pool.len() < slots.total() {
            return Err(SelectorError::InsufficientCandidates {
                position,
                required: slots.total(),
                available: pool.len(),
                shortfall: slots.total() - pool.len(),
            });
        }
        match mode {
            BenchMode::Joint => pool.sort_by(|a, b| id_order(&a.player_id, &b.player_id)),
            BenchMode::CheapestFill => pool.sort_by(|a, b| cost_order(a, b)),
        }
        let plan = GroupPlan {
            position,
            starting: slots.starting,
            bench: slots.bench,
            mode,
        };
        pools.push((plan, pool));
    }

    // Clubs are interned in name order so indices do not depend on input order.
    let clubs: BTreeMap<&str, usize> = candidates
        .iter()
        .filter_map(|c| c.team.as_deref())
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .enumerate()
        .map(|(i, team)| (team, i))
        .collect();

    let mut groups: Vec<(GroupPlan, Vec<GroupItem>)> = Vec::with_capacity(pools.len());
    for (plan, pool) in &pools {
        let mut items = Vec::with_capacity(pool.len());
        for c in pool {
            let units = cost_units(c.cost, unit).ok_or_else(|| {
                SelectorError::InvalidArgument(format!(
                    "candidate {} cost {} is too large for a budget unit of {}",
                    c.player_id, c.cost, unit
                ))
            })?;
            items.push(GroupItem {
                units,
                value: c.predicted_points,
                club: c.team.as_deref().and_then(|team| clubs.get(team).copied()),
            });
        }
        groups.push((*plan, items));
    }

    // The cheapest legal squad takes the cheapest candidates at every
    // position; it is reachable under both bench modes.
    let mut minimum_units = 0usize;
    let mut maximum_units = 0usize;
    for (plan, items) in &groups {
        let take = plan.starting + plan.bench;
        minimum_units = extreme_units(items, take, false)
            .and_then(|u| minimum_units.checked_add(u))
            .ok_or_else(grid_overflow)?;
        maximum_units = extreme_units(items, take, true)
            .and_then(|u| maximum_units.checked_add(u))
            .ok_or_else(grid_overflow)?;
    }

    // Spending beyond the priciest possible squad never helps; cap the table.
    let capacity = budget_units(request.budget, unit, maximum_units);
    if minimum_units > capacity {
        return Err(infeasible(request.budget, minimum_units, unit));
    }

    let deadline = Deadline::after(request.time_limit);
    let cells = dp::table_cells(&groups, capacity);
    let exact = if cells > dp::MAX_DP_CELLS {
        Err(Abandoned::TooLarge(format!(
            "exact table would need {cells} cells (limit {})",
            dp::MAX_DP_CELLS
        )))
    } else {
        solve_exact(&groups, capacity, request.max_per_club, &deadline)
    };

    let (choices, method) = match exact {
        Ok(ExactOutcome::Found(choices)) => (choices, SelectionMethod::Exact),
        Ok(ExactOutcome::OverBudget) => {
            return Err(infeasible(request.budget, minimum_units, unit));
        }
        Ok(ExactOutcome::ClubLimit) => {
            return Err(club_limit_error(request.max_per_club));
        }
        Err(abandoned) => {
            let elapsed = started.elapsed();
            let reason = match (abandoned, request.fallback) {
                (Abandoned::TimedOut, FallbackPolicy::Fail) => {
                    return Err(SelectorError::TimedOut { elapsed })
                }
                (Abandoned::TooLarge(reason), FallbackPolicy::Fail) => {
                    return Err(SelectorError::SearchTooLarge { reason })
                }
                (Abandoned::TimedOut, FallbackPolicy::Greedy) => {
                    format!("exact search exceeded time limit after {elapsed:?}")
                }
                (Abandoned::TooLarge(reason), FallbackPolicy::Greedy) => reason,
            };
            warn!("Falling back to greedy selection: {}", reason);
            // The budget check above guarantees the cheapest squad fits, so
            // a greedy miss can only come from the club limit.
            let choices = greedy::solve(&groups, capacity, request.max_per_club)
                .ok_or_else(|| club_limit_error(request.max_per_club))?;
            (choices, SelectionMethod::Greedy { reason })
        }
    };

    let squad = assemble(&pools, &choices, request, mode, method);
    info!(
        "Selected {} players ({} mode, {}): cost {:.1}/{:.1}, predicted {:.2} in {:?}",
        squad.len(),
        match mode {
            BenchMode::Joint => "joint",
            BenchMode::CheapestFill => "cheapest-fill",
        },
        squad.method,
        squad.total_cost(),
        request.budget,
        squad.total_predicted_points(),
        started.elapsed()
    );
    Ok(squad)
}

fn club_limit_error(limit: Option<usize>) -> SelectorError {
    SelectorError::ClubLimit {
        limit: limit.unwrap_or(0),
    }
}

// ---------------------------------------------------------------------------
// Exact search under the club limit
// ---------------------------------------------------------------------------

/// Why the exact search stopped without an answer.
enum Abandoned {
    TimedOut,
    TooLarge(String),
}

impl From<TimedOut> for Abandoned {
    fn from(_: TimedOut) -> Self {
        Abandoned::TimedOut
    }
}

enum ExactOutcome {
    Found(Vec<GroupChoice>),
    /// No squad fits the budget at all.
    OverBudget,
    /// Squads fit the budget, but none respects the club limit.
    ClubLimit,
}

/// An exact solve with some (group, item) pairs excluded. Its value bounds
/// every node reached by excluding more.
struct Node {
    value: f64,
    seq: usize,
    excluded: BTreeSet<(usize, usize)>,
    choices: Vec<GroupChoice>,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Node {}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Node {
    /// Highest value first; among equals, the node solved earlier.
    fn cmp(&self, other: &Self) -> Ordering {
        self.value
            .total_cmp(&other.value)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Solve with `excluded` items removed. Choices index the full groups.
fn solve_without(
    groups: &[(GroupPlan, Vec<GroupItem>)],
    excluded: &BTreeSet<(usize, usize)>,
    capacity: usize,
    deadline: &Deadline,
) -> Result<Option<(f64, Vec<GroupChoice>)>, TimedOut> {
    let mut kept: Vec<Vec<usize>> = Vec::with_capacity(groups.len());
    let mut reduced: Vec<(GroupPlan, Vec<GroupItem>)> = Vec::with_capacity(groups.len());
    for (g, (plan, items)) in groups.iter().enumerate() {
        let keep: Vec<usize> = (0..items.len())
            .filter(|&i| !excluded.contains(&(g, i)))
            .collect();
        if keep.len() < plan.starting + plan.bench {
            return Ok(None);
        }
        reduced.push((*plan, keep.iter().map(|&i| items[i]).collect()));
        kept.push(keep);
    }

    let Some(choices) = dp::solve(&reduced, capacity, deadline)? else {
        return Ok(None);
    };
    let mut value = 0.0;
    let choices: Vec<GroupChoice> = choices
        .into_iter()
        .zip(&kept)
        .enumerate()
        .map(|(g, (choice, keep))| {
            value += choice
                .starters
                .iter()
                .map(|&i| groups[g].1[keep[i]].value)
                .sum::<f64>();
            GroupChoice {
                starters: choice.starters.iter().map(|&i| keep[i]).collect(),
                bench: choice.bench.iter().map(|&i| keep[i]).collect(),
            }
        })
        .collect();
    Ok(Some((value, choices)))
}

/// The first club over `limit`, as (group, item) pairs of its first
/// `limit + 1` selected players. `None` when the squad is within the limit.
fn club_overflow(
    groups: &[(GroupPlan, Vec<GroupItem>)],
    choices: &[GroupChoice],
    limit: Option<usize>,
) -> Option<Vec<(usize, usize)>> {
    let limit = limit?;
    let mut by_club: BTreeMap<usize, Vec<(usize, usize)>> = BTreeMap::new();
    for (g, choice) in choices.iter().enumerate() {
        for &i in choice.starters.iter().chain(&choice.bench) {
            if let Some(club) = groups[g].1[i].club {
                by_club.entry(club).or_default().push((g, i));
            }
        }
    }
    by_club.into_values().find(|members| members.len() > limit).map(|mut members| {
        members.sort_unstable();
        members.truncate(limit + 1);
        members
    })
}

/// Exact selection. With a club limit, a best-first search over excluded
/// players: a squad over the limit spawns one child per player of the
/// offending club (any legal squad drops at least one of them), and the first
/// node popped that respects the limit is optimal.
fn solve_exact(
    groups: &[(GroupPlan, Vec<GroupItem>)],
    capacity: usize,
    max_per_club: Option<usize>,
    deadline: &Deadline,
) -> Result<ExactOutcome, Abandoned> {
    let root = BTreeSet::new();
    let Some((value, choices)) = solve_without(groups, &root, capacity, deadline)? else {
        return Ok(ExactOutcome::OverBudget);
    };

    let mut heap = BinaryHeap::new();
    let mut seen: HashSet<BTreeSet<(usize, usize)>> = HashSet::new();
    seen.insert(root.clone());
    heap.push(Node {
        value,
        seq: 0,
        excluded: root,
        choices,
    });
    let mut solved = 1;

    while let Some(node) = heap.pop() {
        let Some(offenders) = club_overflow(groups, &node.choices, max_per_club) else {
            if node.seq > 0 {
                info!(
                    "Club limit met after {} exact solves ({} players excluded)",
                    solved,
                    node.excluded.len()
                );
            }
            return Ok(ExactOutcome::Found(node.choices));
        };
        for offender in offenders {
            let mut excluded = node.excluded.clone();
            excluded.insert(offender);
            if !seen.insert(excluded.clone()) {
                continue;
            }
            if solved == MAX_CLUB_NODES {
                return Err(Abandoned::TooLarge(format!(
                    "club-limit search exceeded {MAX_CLUB_NODES} exact solves"
                )));
            }
            deadline.check()?;
            let child = solve_without(groups, &excluded, capacity, deadline)?;
            solved += 1;
            if let Some((value, choices)) = child {
                heap.push(Node {
                    value,
                    seq: solved,
                    excluded,
                    choices,
                });
            }
        }
    }
    Ok(ExactOutcome::ClubLimit)
}

/// Reject inputs the search cannot reason about.
fn validate(candidates: &[Candidate], request: &SelectionRequest) -> Result<(), SelectorError> {
    if !request.budget.is_finite() || request.budget <= 0.0 {
        return Err(SelectorError::InvalidArgument(format!(
            "budget must be a positive number, got {}",
            request.budget
        )));
    }
    if request.max_per_club == Some(0) {
        return Err(SelectorError::InvalidArgument(
            "max_per_club must be at least 1".to_string(),
        ));
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for c in candidates {
        if !c.cost.is_finite() || c.cost <= 0.0 {
            return Err(SelectorError::InvalidArgument(format!(
                "candidate {} has non-positive cost {}",
                c.player_id, c.cost
            )));
        }
        if !c.predicted_points.is_finite() {
            return Err(SelectorError::InvalidArgument(format!(
                "candidate {} has non-finite predicted points",
                c.player_id
            )));
        }
        if !seen.insert(c.player_id.as_str()) {
            return Err(SelectorError::InvalidArgument(format!(
                "duplicate player_id {}",
                c.player_id
            )));
        }
    }
    Ok(())
}

/// Turn per-group index choices into a squad.
fn assemble(
    pools: &[(GroupPlan, Vec<&Candidate>)],
    choices: &[GroupChoice],
    request: &SelectionRequest,
    mode: BenchMode,
    method: SelectionMethod,
) -> Squad {
    let mut starters: Vec<Candidate> = Vec::new();
    let mut bench: Vec<Candidate> = Vec::new();

    for ((plan, pool), choice) in pools.iter().zip(choices) {
        match mode {
            BenchMode::Joint => {
                let mut picks: Vec<&Candidate> =
                    choice.starters.iter().map(|&i| pool[i]).collect();
                picks.sort_by(|a, b| value_order(a, b));
                let (first, rest) = picks.split_at(plan.starting.min(picks.len()));
                starters.extend(first.iter().map(|c| (*c).clone()));
                bench.extend(rest.iter().map(|c| (*c).clone()));
            }
            BenchMode::CheapestFill => {
                // The bench is the cheapest candidates left after the
                // starters, skipping any the club-limit search excluded.
                let mut chosen: Vec<Candidate> =
                    choice.starters.iter().map(|&i| pool[i].clone()).collect();
                if request.max_per_club.is_none() {
                    debug_assert_eq!(
                        cheapest_remaining(pool.iter().copied(), &chosen, plan.bench)
                            .iter()
                            .map(|c| c.player_id.as_str())
                            .collect::<Vec<_>>(),
                        choice
                            .bench
                            .iter()
                            .map(|&i| pool[i].player_id.as_str())
                            .collect::<Vec<_>>()
                    );
                }
                chosen.sort_by(value_order);
                starters.extend(chosen);
                let mut filler: Vec<Candidate> =
                    choice.bench.iter().map(|&i| pool[i].clone()).collect();
                filler.sort_by(value_order);
                bench.extend(filler);
            }
        }
    }

    Squad {
        starters,
        bench,
        budget: request.budget,
        bench_mode: mode,
        method,
    }
}

/// The `count` cheapest candidates from `pool` that are not already among
/// `starters`, cheapest first (ties by lower id).
///
/// This is the bench rule of cheapest-fill selection.
pub fn cheapest_remaining<'a, I>(pool: I, starters: &[Candidate], count: usize) -> Vec<&'a Candidate>
where
    I: IntoIterator<Item = &'a Candidate>,
{
    let taken: HashSet<&str> = starters.iter().map(|c| c.player_id.as_str()).collect();
    let mut remaining: Vec<&Candidate> = pool
        .into_iter()
        .filter(|c| !taken.contains(c.player_id.as_str()))
        .collect();
    remaining.sort_by(|a, b| cost_order(a, b));
    remaining.truncate(count);
    remaining
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
