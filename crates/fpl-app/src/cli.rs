// Command line arguments. Every value flag overrides the matching
// squad.toml setting.

use clap::Parser;
use std::path::PathBuf;

use crate::config::{Config, OutputFormat};

/// Pick the best fantasy squad for the next gameweek from predicted points.
#[derive(Debug, Parser)]
#[command(name = "fpl-squad")]
#[command(about = "Budget-constrained squad selection from predicted points")]
pub struct Cli {
    /// Directory holding config/ and defaults/ (default: current directory)
    #[arg(long)]
    pub config_dir: Option<PathBuf>,

    /// Candidate CSV with predicted points
    #[arg(long)]
    pub data_path: Option<PathBuf>,

    /// Total budget in millions
    #[arg(long)]
    pub budget: Option<f64>,

    /// Players to list per position in the ranking
    #[arg(long, allow_negative_numbers = true)]
    pub tops: Option<i64>,

    /// Optimize the starting XI only; fill the bench with the cheapest players left
    #[arg(long)]
    pub auto_select_bench: bool,

    /// Print the top players per position
    #[arg(long)]
    pub run_top_players: bool,

    /// Select and print the best squad
    #[arg(long)]
    pub run_best_team: bool,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Time limit for the exact search, in milliseconds
    #[arg(long)]
    pub time_limit_ms: Option<u64>,

    /// Most players allowed from one club
    #[arg(long)]
    pub max_per_club: Option<usize>,
}

/// Which reports a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPlan {
    pub top_players: bool,
    pub best_team: bool,
}

impl Default for RunPlan {
    fn default() -> Self {
        RunPlan {
            top_players: true,
            best_team: true,
        }
    }
}

impl Cli {
    /// Neither run flag means both.
    pub fn plan(&self) -> RunPlan {
        if !self.run_top_players && !self.run_best_team {
            return RunPlan::default();
        }
        RunPlan {
            top_players: self.run_top_players,
            best_team: self.run_best_team,
        }
    }

    /// Apply command-line overrides on top of the loaded config.
    pub fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.data_path {
            config.data.candidates = path.clone();
        }
        if let Some(budget) = self.budget {
            config.budget = budget;
        }
        if let Some(tops) = self.tops {
            config.ranking.top_n = tops;
        }
        if self.auto_select_bench {
            config.selection.auto_select_bench = true;
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if let Some(ms) = self.time_limit_ms {
            config.selection.time_limit_ms = Some(ms);
        }
        if let Some(limit) = self.max_per_club {
            config.selection.max_per_club = Some(limit);
        }
    }
}
