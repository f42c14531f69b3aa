// One run of the tool: load candidates, then rank and select concurrently on
// the blocking pool, then render the reports.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use fpl_core::{
    load_candidates, rank, rank_overall, select, Candidate, RankingReport, SkippedRow,
    SquadReport,
};

use crate::cli::RunPlan;
use crate::config::{Config, OutputFormat};

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub generated_at: DateTime<Utc>,
    pub candidates: usize,
    #[serde(skip)]
    pub skipped: Vec<SkippedRow>,
    pub ranking: Option<RankingReport>,
    pub squad: Option<SquadReport>,
}

/// Load the candidate table named in `config` and run the planned reports.
pub async fn run(config: &Config, plan: RunPlan) -> Result<RunOutput> {
    let path = config.data.candidates.clone();
    let table = tokio::task::spawn_blocking(move || load_candidates(&path))
        .await
        .context("candidate loading task failed")?
        .with_context(|| {
            format!(
                "failed to load candidates from {}",
                config.data.candidates.display()
            )
        })?;

    for row in &table.skipped {
        warn!("Skipped candidate {}", row);
    }

    let mut output = run_with_candidates(config, plan, table.candidates).await?;
    output.skipped = table.skipped;
    Ok(output)
}

/// Rank and select over an already-loaded candidate list.
pub async fn run_with_candidates(
    config: &Config,
    plan: RunPlan,
    candidates: Vec<Candidate>,
) -> Result<RunOutput> {
    let count = candidates.len();
    let candidates = Arc::new(candidates);
    let policy = Arc::new(config.policy.clone());
    let request = config.request();
    let top_n = config.ranking.top_n;

    let ranking_task = plan.top_players.then(|| {
        let candidates = Arc::clone(&candidates);
        tokio::task::spawn_blocking(move || {
            let ranked = rank(&candidates, top_n)?;
            let overall = rank_overall(&candidates, top_n)?;
            Ok::<_, fpl_core::RankerError>((ranked, overall))
        })
    });
    let squad_task = plan.best_team.then(|| {
        let candidates = Arc::clone(&candidates);
        let policy = Arc::clone(&policy);
        tokio::task::spawn_blocking(move || select(&candidates, &policy, &request))
    });

    let (ranking, squad) = tokio::join!(
        async {
            match ranking_task {
                Some(task) => Some(task.await),
                None => None,
            }
        },
        async {
            match squad_task {
                Some(task) => Some(task.await),
                None => None,
            }
        }
    );

    let ranking = match ranking {
        Some(joined) => {
            let (ranked, overall) = joined
                .context("ranking task failed")?
                .context("failed to rank players")?;
            info!(
                "Ranked top {} players per position and {} overall",
                ranked.n,
                overall.len()
            );
            Some(RankingReport::from_ranked(&ranked).with_overall(&overall))
        }
        None => None,
    };

    let squad = match squad {
        Some(joined) => {
            let squad = joined
                .context("selection task failed")?
                .context("failed to select squad")?;
            if !squad.method.is_exact() {
                warn!("Squad is approximate: {}", squad.method);
            }
            Some(SquadReport::from_squad(&squad))
        }
        None => None,
    };

    Ok(RunOutput {
        generated_at: Utc::now(),
        candidates: count,
        skipped: Vec::new(),
        ranking,
        squad,
    })
}

/// Render the reports in the requested format.
pub fn render(output: &RunOutput, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(output).context("failed to serialize output")
        }
        OutputFormat::Table => {
            let mut text = String::new();
            if let Some(ranking) = &output.ranking {
                text.push_str(&ranking.to_string());
            }
            if let Some(squad) = &output.squad {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(&squad.to_string());
            }
            if !output.skipped.is_empty() {
                text.push_str(&format!(
                    "\n{} input rows skipped; see logs/fpl-squad.log\n",
                    output.skipped.len()
                ));
            }
            Ok(text)
        }
    }
}
