// Greedy approximation used when the exact search is abandoned.
//
// Starts from the cheapest legal squad. Under a club limit it first swaps
// players out of over-represented clubs, then repeatedly applies the single
// same-position swap with the largest gain that keeps the squad within
// budget and the limit. Stops at a local optimum or after a fixed number of
// swaps.

use super::dp::VALUE_EPSILON;
use super::{BenchMode, GroupChoice, GroupItem, GroupPlan};

/// Upper bound on improving swaps before the search gives up.
const MAX_SWAPS: usize = 10_000;

/// Current selection for one group: which items count toward the objective.
struct GroupState {
    picked: Vec<bool>,
}

/// Cost and bench for a group given its picked items.
///
/// Joint selection has no separate bench at this stage. Cheapest-fill takes
/// the first `bench` unpicked items, relying on the cost ordering of `items`.
fn evaluate(items: &[GroupItem], plan: GroupPlan, picked: &[bool]) -> (usize, f64, Vec<usize>) {
    let mut units = 0;
    let mut value = 0.0;
    let mut bench = Vec::new();
    for (i, item) in items.iter().enumerate() {
        if picked[i] {
            units += item.units;
            value += item.value;
        } else if plan.mode == BenchMode::CheapestFill && bench.len() < plan.bench {
            units += item.units;
            bench.push(i);
        }
    }
    (units, value, bench)
}

fn pick_count(plan: GroupPlan) -> usize {
    match plan.mode {
        BenchMode::Joint => plan.starting + plan.bench,
        BenchMode::CheapestFill => plan.starting,
    }
}

/// Club counts over the whole squad, checked against an optional limit.
struct ClubTally<'g> {
    groups: &'g [(GroupPlan, Vec<GroupItem>)],
    limit: Option<usize>,
    clubs: usize,
}

impl<'g> ClubTally<'g> {
    fn new(groups: &'g [(GroupPlan, Vec<GroupItem>)], limit: Option<usize>) -> Self {
        let clubs = groups
            .iter()
            .flat_map(|(_, items)| items.iter().filter_map(|item| item.club))
            .max()
            .map_or(0, |club| club + 1);
        ClubTally {
            groups,
            limit,
            clubs,
        }
    }

    /// Players over the limit, summed across clubs. `replace` substitutes one
    /// group's members.
    fn excess(&self, members: &[Vec<usize>], replace: Option<(usize, &[usize])>) -> usize {
        let Some(limit) = self.limit else {
            return 0;
        };
        let mut counts = vec![0usize; self.clubs];
        for (g, current) in members.iter().enumerate() {
            let group_members = match replace {
                Some((rg, trial)) if rg == g => trial,
                _ => current.as_slice(),
            };
            for &i in group_members {
                if let Some(club) = self.groups[g].1[i].club {
                    counts[club] += 1;
                }
            }
        }
        counts.iter().map(|&n| n.saturating_sub(limit)).sum()
    }
}

/// Squad members of a group: picks followed by the bench.
fn members(picked: &[bool], bench: Vec<usize>) -> Vec<usize> {
    let mut out: Vec<usize> = (0..picked.len()).filter(|&i| picked[i]).collect();
    out.extend(bench);
    out
}

/// Run the swap search. Returns `None` when even the cheapest squad is over
/// `capacity` units, or when no squad within `capacity` could be brought
/// under `max_per_club`.
pub(crate) fn solve(
    groups: &[(GroupPlan, Vec<GroupItem>)],
    capacity: usize,
    max_per_club: Option<usize>,
) -> Option<Vec<GroupChoice>> {
    let tally = ClubTally::new(groups, max_per_club);

    // Cheapest legal squad: the first picks in cost order.
    let mut states: Vec<GroupState> = groups
        .iter()
        .map(|(plan, items)| {
            let mut order: Vec<usize> = (0..items.len()).collect();
            order.sort_by_key(|&i| (items[i].units, i));
            let mut picked = vec![false; items.len()];
            let need = pick_count(*plan);
            match plan.mode {
                BenchMode::Joint => order.iter().take(need).for_each(|&i| picked[i] = true),
                // Items are already in cost order; the bench follows the
                // starters.
                BenchMode::CheapestFill => (0..need).for_each(|i| picked[i] = true),
            }
            GroupState { picked }
        })
        .collect();

    let mut group_units = Vec::with_capacity(groups.len());
    let mut group_members = Vec::with_capacity(groups.len());
    for ((plan, items), state) in groups.iter().zip(&states) {
        let (units, _, bench) = evaluate(items, *plan, &state.picked);
        group_units.push(units);
        group_members.push(members(&state.picked, bench));
    }
    if group_units.iter().sum::<usize>() > capacity {
        return None;
    }

    // Repair: swap clubs down to the limit, spending as little as possible.
    let mut excess = tally.excess(&group_members, None);
    let mut swaps = 0;
    while excess > 0 {
        if swaps == MAX_SWAPS {
            return None;
        }
        swaps += 1;
        let spent: usize = group_units.iter().sum();
        // (excess, squad units, group, out, in, group units, group members)
        let mut best: Option<(usize, usize, usize, usize, usize, usize, Vec<usize>)> = None;

        for (g, ((plan, items), state)) in groups.iter().zip(&states).enumerate() {
            let others = spent - group_units[g];
            let mut trial = state.picked.clone();

            for out in (0..items.len()).filter(|&i| state.picked[i]) {
                for inc in (0..items.len()).filter(|&i| !state.picked[i]) {
                    trial[out] = false;
                    trial[inc] = true;
                    let (units, _, bench) = evaluate(items, *plan, &trial);
                    let trial_members = members(&trial, bench);
                    trial[out] = true;
                    trial[inc] = false;

                    if others + units > capacity {
                        continue;
                    }
                    let after =
                        tally.excess(&group_members, Some((g, trial_members.as_slice())));
                    if after >= excess {
                        continue;
                    }
                    let key = (after, others + units);
                    if best.as_ref().map_or(true, |b| key < (b.0, b.1)) {
                        best = Some((after, others + units, g, out, inc, units, trial_members));
                    }
                }
            }
        }

        let Some((after, _, g, out, inc, units, trial_members)) = best else {
            return None;
        };
        states[g].picked[out] = false;
        states[g].picked[inc] = true;
        group_units[g] = units;
        group_members[g] = trial_members;
        excess = after;
    }

    for _ in 0..MAX_SWAPS {
        let spent: usize = group_units.iter().sum();
        // (gain, group, out, in, new group units, new group members)
        let mut best: Option<(f64, usize, usize, usize, usize, Vec<usize>)> = None;

        for (g, ((plan, items), state)) in groups.iter().zip(&states).enumerate() {
            let (_, current_value, _) = evaluate(items, *plan, &state.picked);
            let others = spent - group_units[g];
            let mut trial = state.picked.clone();

            for out in (0..items.len()).filter(|&i| state.picked[i]) {
                for inc in (0..items.len()).filter(|&i| !state.picked[i]) {
                    trial[out] = false;
                    trial[inc] = true;
                    let (units, value, bench) = evaluate(items, *plan, &trial);
                    let trial_members = members(&trial, bench);
                    trial[out] = true;
                    trial[inc] = false;

                    if others + units > capacity {
                        continue;
                    }
                    let gain = value - current_value;
                    if gain <= VALUE_EPSILON {
                        continue;
                    }
                    let improves = best.as_ref().map_or(true, |b| gain > b.0 + VALUE_EPSILON);
                    if improves
                        && tally.excess(&group_members, Some((g, trial_members.as_slice()))) == 0
                    {
                        best = Some((gain, g, out, inc, units, trial_members));
                    }
                }
            }
        }

        let Some((_, g, out, inc, units, trial_members)) = best else {
            break;
        };
        states[g].picked[out] = false;
        states[g].picked[inc] = true;
        group_units[g] = units;
        group_members[g] = trial_members;
    }

    let choices = groups
        .iter()
        .zip(&states)
        .map(|((plan, items), state)| {
            let (_, _, bench) = evaluate(items, *plan, &state.picked);
            GroupChoice {
                starters: (0..items.len()).filter(|&i| state.picked[i]).collect(),
                bench,
            }
        })
        .collect();
    Some(choices)
}
