// Result formatting: serializable report structs with a plain-text table
// rendering for the terminal.

use std::fmt;

use serde::Serialize;

use crate::candidate::Candidate;
use crate::position::Position;
use crate::ranker::RankedList;
use crate::selector::{BenchMode, SelectionMethod, Squad};

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// One player line in a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerRow {
    pub player_id: String,
    pub name: Option<String>,
    pub team: Option<String>,
    pub position: Position,
    pub cost: f64,
    pub predicted_points: f64,
    pub points_per_million: f64,
}

impl From<&Candidate> for PlayerRow {
    fn from(c: &Candidate) -> Self {
        PlayerRow {
            player_id: c.player_id.clone(),
            name: c.name.clone(),
            team: c.team.clone(),
            position: c.position,
            cost: c.cost,
            predicted_points: c.predicted_points,
            points_per_million: round2(c.points_per_million()),
        }
    }
}

impl PlayerRow {
    fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.player_id)
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

const TABLE_HEADER: &str = "  Pos  Player                Team          Cost    Pts  Pts/M";

fn write_row(f: &mut fmt::Formatter<'_>, row: &PlayerRow, marker: &str) -> fmt::Result {
    writeln!(
        f,
        "{:>1} {:<4} {:<21} {:<12} {:>5.1} {:>6.2} {:>6.2}",
        marker,
        row.position.display_str(),
        truncate(row.label(), 21),
        truncate(row.team.as_deref().unwrap_or("-"), 12),
        row.cost,
        row.predicted_points,
        row.points_per_million,
    )
}

/// Clip to `width` characters so columns stay aligned.
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width - 1).collect();
        out.push('~');
        out
    }
}

// ---------------------------------------------------------------------------
// Squad report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SquadReport {
    pub starters: Vec<PlayerRow>,
    pub bench: Vec<PlayerRow>,
    pub total_cost: f64,
    pub total_predicted_points: f64,
    pub starting_points: f64,
    pub captain: Option<String>,
    pub vice_captain: Option<String>,
    pub budget: f64,
    pub bank: f64,
    pub bench_mode: BenchMode,
    pub method: SelectionMethod,
}

impl SquadReport {
    pub fn from_squad(squad: &Squad) -> Self {
        SquadReport {
            starters: squad.starters.iter().map(PlayerRow::from).collect(),
            bench: squad.bench.iter().map(PlayerRow::from).collect(),
            total_cost: round1(squad.total_cost()),
            total_predicted_points: round2(squad.total_predicted_points()),
            starting_points: round2(squad.starting_points()),
            captain: squad.captain().map(|c| c.player_id.clone()),
            vice_captain: squad.vice_captain().map(|c| c.player_id.clone()),
            budget: squad.budget,
            bank: round1(squad.bank()),
            bench_mode: squad.bench_mode,
            method: squad.method.clone(),
        }
    }

    fn marker(&self, row: &PlayerRow) -> &'static str {
        if self.captain.as_deref() == Some(row.player_id.as_str()) {
            "C"
        } else if self.vice_captain.as_deref() == Some(row.player_id.as_str()) {
            "V"
        } else {
            ""
        }
    }
}

impl fmt::Display for SquadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BEST SQUAD ({})", self.method)?;
        writeln!(f, "{TABLE_HEADER}")?;
        for row in &self.starters {
            write_row(f, row, self.marker(row))?;
        }
        if !self.bench.is_empty() {
            writeln!(f, "  -- bench --")?;
            for row in &self.bench {
                write_row(f, row, "")?;
            }
        }
        writeln!(f)?;
        writeln!(f, "Total Cost:      {:.1} / {:.1}", self.total_cost, self.budget)?;
        writeln!(f, "Expected Points: {:.2}", self.total_predicted_points)?;
        writeln!(f, "Starting Points: {:.2}", self.starting_points)?;
        writeln!(f, "Bank:            {:.1}", self.bank)
    }
}

// ---------------------------------------------------------------------------
// Ranking report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingGroup {
    pub position: Position,
    pub players: Vec<PlayerRow>,
    pub total_cost: f64,
    pub total_predicted_points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingReport {
    pub top_n: usize,
    pub groups: Vec<RankingGroup>,
    /// Top players across all positions; empty unless attached.
    pub overall: Vec<PlayerRow>,
}

impl RankingReport {
    pub fn from_ranked(ranked: &RankedList) -> Self {
        let groups = ranked
            .iter()
            .map(|(position, players)| RankingGroup {
                position,
                players: players.iter().map(PlayerRow::from).collect(),
                total_cost: round1(players.iter().map(|c| c.cost).sum()),
                total_predicted_points: round2(players.iter().map(|c| c.predicted_points).sum()),
            })
            .collect();
        RankingReport {
            top_n: ranked.n,
            groups,
            overall: Vec::new(),
        }
    }

    /// Attach the cross-position list from `rank_overall`.
    pub fn with_overall(mut self, overall: &[Candidate]) -> Self {
        self.overall = overall.iter().map(PlayerRow::from).collect();
        self
    }
}

impl fmt::Display for RankingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TOP {} PLAYERS BY POSITION", self.top_n)?;
        for group in &self.groups {
            writeln!(f)?;
            writeln!(f, "{} ({})", group.position, group.players.len())?;
            if group.players.is_empty() {
                writeln!(f, "  (no candidates)")?;
                continue;
            }
            writeln!(f, "{TABLE_HEADER}")?;
            for row in &group.players {
                write_row(f, row, "")?;
            }
            writeln!(
                f,
                "  Total: cost {:.1}, points {:.2}",
                group.total_cost, group.total_predicted_points
            )?;
        }
        if !self.overall.is_empty() {
            writeln!(f)?;
            writeln!(f, "TOP {} OVERALL", self.overall.len())?;
            writeln!(f, "{TABLE_HEADER}")?;
            for row in &self.overall {
                write_row(f, row, "")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quota::QuotaPolicy;
    use crate::ranker::{rank, rank_overall};
    use crate::selector::{select, SelectionRequest};

    fn squad() -> Squad {
        let pool = vec![
            Candidate::new("G1", Position::Goalkeeper, 4.0, 5.0).with_name("Raya"),
            Candidate::new("G2", Position::Goalkeeper, 4.5, 3.0),
            Candidate::new("D1", Position::Defender, 4.0, 6.0)
                .with_name("Gabriel")
                .with_team("Arsenal"),
            Candidate::new("D2", Position::Defender, 4.2, 4.0),
        ];
        let policy = QuotaPolicy::new(
            vec![(Position::Goalkeeper, 1, 0), (Position::Defender, 1, 1)],
            0.1,
        )
        .unwrap();
        select(&pool, &policy, &SelectionRequest::new(13.0)).unwrap()
    }

    #[test]
    fn squad_report_totals() {
        let report = SquadReport::from_squad(&squad());
        assert_eq!(report.starters.len(), 2);
        assert_eq!(report.bench.len(), 1);
        assert_eq!(report.total_cost, 12.2);
        assert_eq!(report.total_predicted_points, 15.0);
        assert_eq!(report.starting_points, 11.0);
        assert_eq!(report.bank, 0.8);
        assert_eq!(report.captain.as_deref(), Some("D1"));
        assert_eq!(report.vice_captain.as_deref(), Some("G1"));
        assert_eq!(report.starters[1].points_per_million, 1.5);
    }

    #[test]
    fn squad_table_marks_captaincy() {
        let text = SquadReport::from_squad(&squad()).to_string();
        assert!(text.contains("BEST SQUAD (exact)"));
        assert!(text.contains("C DEF  Gabriel"));
        assert!(text.contains("V GK   Raya"));
        assert!(text.contains("-- bench --"));
        assert!(text.contains("Total Cost:      12.2 / 13.0"));
        assert!(text.contains("Bank:            0.8"));
    }

    #[test]
    fn squad_report_serializes() {
        let json = serde_json::to_value(SquadReport::from_squad(&squad())).unwrap();
        assert_eq!(json["captain"], "D1");
        assert_eq!(json["method"]["kind"], "exact");
        assert_eq!(json["bench_mode"], "joint");
        assert_eq!(json["starters"][0]["position"], "goalkeeper");
        assert_eq!(json["bench"][0]["player_id"], "D2");
        assert!(json["bench"][0]["name"].is_null());
    }

    #[test]
    fn ranking_report_groups_and_totals() {
        let pool = vec![
            Candidate::new("m1", Position::Midfielder, 8.0, 6.0),
            Candidate::new("m2", Position::Midfielder, 6.5, 7.5),
            Candidate::new("f1", Position::Forward, 9.0, 7.0),
        ];
        let report = RankingReport::from_ranked(&rank(&pool, 5).unwrap());
        assert_eq!(report.top_n, 5);
        assert_eq!(report.groups.len(), 4);
        let mids = &report.groups[2];
        assert_eq!(mids.position, Position::Midfielder);
        assert_eq!(mids.players[0].player_id, "m2");
        assert_eq!(mids.total_cost, 14.5);
        assert_eq!(mids.total_predicted_points, 13.5);

        let text = report.to_string();
        assert!(text.contains("TOP 5 PLAYERS BY POSITION"));
        assert!(text.contains("(no candidates)"));
        assert!(text.contains("Total: cost 14.5, points 13.50"));
    }

    #[test]
    fn long_names_are_clipped() {
        assert_eq!(truncate("Alexander-Arnold", 8), "Alexand~");
        assert_eq!(truncate("Son", 8), "Son");
    }

    #[test]
    fn overall_section_follows_position_groups() {
        let pool = vec![
            Candidate::new("m1", Position::Midfielder, 8.0, 6.0),
            Candidate::new("m2", Position::Midfielder, 6.5, 7.5),
            Candidate::new("f1", Position::Forward, 9.0, 7.0).with_name("Haaland"),
            Candidate::new("g1", Position::Goalkeeper, 4.5, 2.0),
        ];
        let plain = RankingReport::from_ranked(&rank(&pool, 2).unwrap());
        assert!(plain.overall.is_empty());
        assert!(!plain.to_string().contains("OVERALL"));

        let report = plain.with_overall(&rank_overall(&pool, 3).unwrap());
        let ids: Vec<&str> = report.overall.iter().map(|r| r.player_id.as_str()).collect();
        assert_eq!(ids, vec!["m2", "f1", "m1"]);

        let text = report.to_string();
        let groups_at = text.find("TOP 2 PLAYERS BY POSITION").unwrap();
        let overall_at = text.find("TOP 3 OVERALL").unwrap();
        assert!(groups_at < overall_at);
        assert!(text[overall_at..].contains("FWD  Haaland"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["overall"][0]["player_id"], "m2");
    }
}
