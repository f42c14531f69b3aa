// Library root: candidate table, quota policy, squad selector, ranker and
// report formatting for gameweek squad selection.

pub mod candidate;
pub mod loader;
pub mod position;
pub mod quota;
pub mod ranker;
pub mod report;
pub mod selector;

pub use candidate::{
    adapt, cost_order, id_order, value_order, AdaptedTable, Candidate, MalformedRecord, RawRow,
    SkippedRow,
};
pub use loader::{load_candidates, load_candidates_from_reader, LoadError};
pub use position::Position;
pub use quota::{PolicyError, PositionSlots, QuotaPolicy, DEFAULT_BUDGET_UNIT};
pub use ranker::{rank, rank_overall, RankedList, RankerError};
pub use report::{PlayerRow, RankingGroup, RankingReport, SquadReport};
pub use selector::{
    cheapest_remaining, select, BenchMode, FallbackPolicy, SelectionMethod, SelectionRequest,
    SelectorError, Squad,
};
