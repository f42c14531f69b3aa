// Exact budget-bounded dynamic program.
//
// Two stages, both stored as flat arenas of indexed cells:
//
// 1. Per position group, a suffix DP over the group's items with state
//    (item, starter picks left, bench picks left, exact cost units). Layer
//    values roll over two buffers; only the decision byte per cell is kept
//    for reconstruction.
// 2. Group curves (best value at full quota for every exact cost) are merged
//    by max-plus convolution over cost, keeping the split per stage.
//
// Items within a group arrive pre-sorted (by id for joint selection, by cost
// then id for cheapest-fill). On equal values the earlier item is taken, so
// ties resolve toward the front of that order.

use tracing::debug;

use super::{BenchMode, Deadline, GroupChoice, GroupItem, GroupPlan, TimedOut};

/// Values closer than this are treated as equal when breaking ties.
pub(crate) const VALUE_EPSILON: f64 = 1e-9;

const SKIP: u8 = 0;
const STARTER: u8 = 1;
const BENCH: u8 = 2;

/// Decision arena and best-value curve for one position group.
struct GroupTable {
    /// Dimensions of one layer: (starter picks + 1, bench picks + 1, capacity + 1).
    a_dim: usize,
    b_dim: usize,
    c_dim: usize,
    /// `decisions[i * layer + cell]` is the choice made for item `i`.
    decisions: Vec<u8>,
    /// Best value with the full quota filled, for each exact cost.
    curve: Vec<f64>,
}

impl GroupTable {
    fn layer_len(&self) -> usize {
        self.a_dim * self.b_dim * self.c_dim
    }

    fn cell(&self, a: usize, b: usize, c: usize) -> usize {
        (a * self.b_dim + b) * self.c_dim + c
    }
}

/// Upper bound on decision cells across all group tables. Each cell is one
/// byte of arena plus its share of the rolling value layers.
pub(crate) const MAX_DP_CELLS: usize = 64 * 1024 * 1024;

/// (starter picks, bench picks) tracked by a group's state.
fn pick_dims(plan: GroupPlan) -> (usize, usize) {
    match plan.mode {
        BenchMode::Joint => (plan.starting + plan.bench, 0),
        BenchMode::CheapestFill => (plan.starting, plan.bench),
    }
}

/// Decision cells `solve` would allocate for `capacity`, saturating at
/// `usize::MAX`.
pub(crate) fn table_cells(groups: &[(GroupPlan, Vec<GroupItem>)], capacity: usize) -> usize {
    groups.iter().fold(0usize, |total, (plan, items)| {
        let (a_max, b_max) = pick_dims(*plan);
        let layer = (a_max + 1)
            .saturating_mul(b_max + 1)
            .saturating_mul(capacity.saturating_add(1));
        total.saturating_add(items.len().saturating_mul(layer))
    })
}

/// Build the table for one group.
fn solve_group(
    items: &[GroupItem],
    plan: GroupPlan,
    capacity: usize,
    deadline: &Deadline,
) -> Result<GroupTable, TimedOut> {
    let (a_max, b_max) = pick_dims(plan);

    let mut table = GroupTable {
        a_dim: a_max + 1,
        b_dim: b_max + 1,
        c_dim: capacity + 1,
        decisions: Vec::new(),
        curve: Vec::new(),
    };
    let layer = table.layer_len();
    table.decisions = vec![SKIP; items.len() * layer];

    // Layer for "no items left": only the empty selection at cost 0.
    let mut next = vec![f64::NEG_INFINITY; layer];
    next[table.cell(0, 0, 0)] = 0.0;
    let mut cur = vec![f64::NEG_INFINITY; layer];

    for i in (0..items.len()).rev() {
        deadline.check()?;
        let item = items[i];
        let base = i * layer;

        for a in 0..=a_max {
            for b in 0..=b_max {
                for c in 0..=capacity {
                    let idx = table.cell(a, b, c);
                    let fits = c >= item.units;

                    let starter = if a > 0 && fits {
                        item.value + next[table.cell(a - 1, b, c - item.units)]
                    } else {
                        f64::NEG_INFINITY
                    };

                    // Under cheapest-fill the first non-starters in cost order
                    // must fill the bench, so skipping is only allowed once
                    // the bench is full.
                    let (other, other_choice) = if b > 0 {
                        if fits {
                            (next[table.cell(a, b - 1, c - item.units)], BENCH)
                        } else {
                            (f64::NEG_INFINITY, BENCH)
                        }
                    } else {
                        (next[idx], SKIP)
                    };

                    if starter > f64::NEG_INFINITY && starter + VALUE_EPSILON >= other {
                        cur[idx] = starter;
                        table.decisions[base + idx] = STARTER;
                    } else {
                        cur[idx] = other;
                        table.decisions[base + idx] = other_choice;
                    }
                }
            }
        }

        std::mem::swap(&mut cur, &mut next);
    }

    // `next` now holds layer 0.
    table.curve = (0..=capacity)
        .map(|c| next[table.cell(a_max, b_max, c)])
        .collect();
    Ok(table)
}

/// Walk the decision arena forward from the full-quota cell at `cost`.
fn reconstruct_group(table: &GroupTable, items: &[GroupItem], cost: usize) -> GroupChoice {
    let layer = table.layer_len();
    let mut a = table.a_dim - 1;
    let mut b = table.b_dim - 1;
    let mut c = cost;
    let mut choice = GroupChoice::default();

    for (i, item) in items.iter().enumerate() {
        if a == 0 && b == 0 {
            break;
        }
        match table.decisions[i * layer + table.cell(a, b, c)] {
            STARTER => {
                choice.starters.push(i);
                a -= 1;
                c -= item.units;
            }
            BENCH => {
                choice.bench.push(i);
                b -= 1;
                c -= item.units;
            }
            _ => {}
        }
    }
    choice
}

/// Solve all groups exactly within `capacity` budget units.
///
/// Returns `Ok(None)` when no combination fits. Callers bound the table size
/// with `table_cells` first.
pub(crate) fn solve(
    groups: &[(GroupPlan, Vec<GroupItem>)],
    capacity: usize,
    deadline: &Deadline,
) -> Result<Option<Vec<GroupChoice>>, TimedOut> {
    let mut tables = Vec::with_capacity(groups.len());
    for (plan, items) in groups {
        let table = solve_group(items, *plan, capacity, deadline)?;
        debug!(
            "DP group {}: {} items, {} decision cells",
            plan.position,
            items.len(),
            table.decisions.len()
        );
        tables.push(table);
    }

    let Some(first) = tables.first() else {
        return Ok(Some(Vec::new()));
    };

    // Max-plus convolution across groups. `splits[g][c]` is the cost spent
    // on groups 0..g when the running total is c after group g.
    let mut total = first.curve.clone();
    let mut splits: Vec<Vec<usize>> = Vec::with_capacity(tables.len());
    splits.push(Vec::new());

    for table in tables.iter().skip(1) {
        deadline.check()?;
        let mut merged = vec![f64::NEG_INFINITY; capacity + 1];
        let mut split = vec![0usize; capacity + 1];
        for (c1, &left) in total.iter().enumerate() {
            if left == f64::NEG_INFINITY {
                continue;
            }
            for (c2, &right) in table.curve.iter().enumerate().take(capacity + 1 - c1) {
                if right == f64::NEG_INFINITY {
                    continue;
                }
                let value = left + right;
                let c = c1 + c2;
                if value > merged[c] + VALUE_EPSILON {
                    merged[c] = value;
                    split[c] = c1;
                }
            }
        }
        total = merged;
        splits.push(split);
    }

    // Best value at any cost within budget; equal values prefer the cheaper.
    let mut best: Option<(usize, f64)> = None;
    for (c, &value) in total.iter().enumerate() {
        if value == f64::NEG_INFINITY {
            continue;
        }
        match best {
            Some((_, v)) if value <= v + VALUE_EPSILON => {}
            _ => best = Some((c, value)),
        }
    }
    let Some((best_cost, best_value)) = best else {
        return Ok(None);
    };
    debug!("DP optimum {:.3} at {} units", best_value, best_cost);

    // Peel the per-group costs back off the running total.
    let mut group_costs = vec![0usize; tables.len()];
    let mut c = best_cost;
    for g in (1..tables.len()).rev() {
        let c1 = splits[g][c];
        group_costs[g] = c - c1;
        c = c1;
    }
    group_costs[0] = c;

    let choices = tables
        .iter()
        .zip(groups)
        .zip(group_costs)
        .map(|((table, (_, items)), cost)| reconstruct_group(table, items, cost))
        .collect();
    Ok(Some(choices))
}
