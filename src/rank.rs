use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::elimination::{norm, RateMatrix};
use crate::error::Result;
use crate::game::{GameCode, SiteType};
use crate::league::League;
use crate::season::Gender;
use crate::team::TeamRef;
use crate::win_prob::ValuationModel;

/// Final result of one game, as fed to the ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct GameOutcome {
    pub code: GameCode,
    pub home: TeamRef,
    pub visitor: TeamRef,
    pub home_score: u32,
    pub visitor_score: u32,
    pub gender: Gender,
}

impl GameOutcome {
    pub fn from_scores(
        code: GameCode,
        home: TeamRef,
        visitor: TeamRef,
        home_score: u32,
        visitor_score: u32,
        gender: Gender,
    ) -> Self {
        Self {
            code,
            home,
            visitor,
            home_score,
            visitor_score,
            gender,
        }
    }

    pub fn site(&self) -> SiteType {
        self.code.site()
    }

    /// Home minus visitor.
    pub fn margin(&self) -> i64 {
        self.home_score as i64 - self.visitor_score as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankConfig {
    pub valuation: ValuationModel,
    /// Pivots at or below this magnitude are treated as zero.
    pub pivot_tolerance: f64,
    /// Residual norm above which the solution is reported as inexact.
    pub residual_tolerance: f64,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            valuation: ValuationModel::default(),
            pivot_tolerance: 1e-12,
            residual_tolerance: 1e-6,
        }
    }
}

impl RankConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub wins: u32,
    pub games: u32,
}

/// Teams seen in a season's outcomes and the rate matrix between them.
#[derive(Debug, Clone)]
pub struct OutcomeGraph {
    teams: Vec<TeamRef>,
    records: Vec<TeamRecord>,
    edges: Vec<(usize, usize)>,
    matrix: RateMatrix,
}

impl OutcomeGraph {
    /// Index teams in first-seen order (anything outside the league's
    /// Division-I roster folds into the non-D1 team) and accumulate one
    /// valuated edge pair per game.
    pub fn build(league: &League, outcomes: &[GameOutcome], valuation: &ValuationModel) -> Self {
        let mut index: HashMap<u64, usize> = HashMap::new();
        let mut teams: Vec<TeamRef> = Vec::new();
        let mut records: Vec<TeamRecord> = Vec::new();
        let mut games: Vec<(usize, usize, f64)> = Vec::with_capacity(outcomes.len());

        let mut vertex = |team: &TeamRef| -> usize {
            let team = if league.contains(team) {
                team.clone()
            } else {
                league.non_d1().clone()
            };
            *index.entry(team.prime_id()).or_insert_with(|| {
                teams.push(team);
                records.push(TeamRecord::default());
                teams.len() - 1
            })
        };

        let mut pairs = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            let h = vertex(&outcome.home);
            let v = vertex(&outcome.visitor);
            pairs.push((h, v));
        }

        for (outcome, &(h, v)) in outcomes.iter().zip(&pairs) {
            let split = valuation.valuate(outcome.margin() as f64, outcome.site(), outcome.gender);
            games.push((h, v, split.visitor_to_home));
            records[h].games += 1;
            records[v].games += 1;
            if outcome.margin() > 0 {
                records[h].wins += 1;
            } else {
                records[v].wins += 1;
            }
        }

        let mut matrix = RateMatrix::zeros(teams.len());
        for &(h, v, to_home) in &games {
            matrix.add_game(h, v, to_home);
        }

        Self {
            teams,
            records,
            edges: pairs,
            matrix,
        }
    }

    pub fn teams(&self) -> &[TeamRef] {
        &self.teams
    }

    pub fn records(&self) -> &[TeamRecord] {
        &self.records
    }

    pub fn matrix(&self) -> &RateMatrix {
        &self.matrix
    }

    /// Component label per vertex, from the game edges.
    fn components(&self) -> Vec<usize> {
        let mut parent: Vec<usize> = (0..self.teams.len()).collect();
        fn find(parent: &mut [usize], mut x: usize) -> usize {
            while parent[x] != x {
                parent[x] = parent[parent[x]];
                x = parent[x];
            }
            x
        }
        for &(a, b) in &self.edges {
            let ra = find(&mut parent, a);
            let rb = find(&mut parent, b);
            if ra != rb {
                parent[ra] = rb;
            }
        }
        (0..self.teams.len()).map(|i| find(&mut parent, i)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub team: TeamRef,
    pub rank: usize,
    /// Equilibrium value; the average team in its component sits at 1.0.
    pub value: f64,
    pub wins: u32,
    pub games: u32,
    /// Expected neutral-site margin against the median team.
    pub points_over_median: f64,
}

impl RankingEntry {
    pub fn losses(&self) -> u32 {
        self.games - self.wins
    }

    pub fn win_pct(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.wins as f64 / self.games as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub entries: Vec<RankingEntry>,
    /// Independent blocks found during back substitution; 1 for a fully
    /// connected season.
    pub component_count: usize,
    /// |D·V| of the normalized solution.
    pub residual_norm: f64,
}

impl Ranking {
    pub fn is_connected(&self) -> bool {
        self.component_count <= 1
    }

    pub fn get(&self, team_name: &str) -> Option<&RankingEntry> {
        self.entries.iter().find(|e| e.team.name() == team_name)
    }
}

/// Rank every team appearing in `outcomes` by the stationary distribution
/// of the random walk over valuated game results.
pub fn compute_rankings(league: &League, outcomes: &[GameOutcome], cfg: &RankConfig) -> Ranking {
    let graph = OutcomeGraph::build(league, outcomes, &cfg.valuation);
    let n = graph.teams.len();
    if n == 0 {
        return Ranking {
            entries: Vec::new(),
            component_count: 0,
            residual_norm: 0.0,
        };
    }

    let reduced = graph.matrix.reduce(cfg.pivot_tolerance);
    let null = reduced.back_substitute();
    let mut values = null.values;

    // Each block of the graph is only defined up to its own scale.
    let labels = graph.components();
    let mut sums: HashMap<usize, (f64, usize)> = HashMap::new();
    for (&label, &v) in labels.iter().zip(&values) {
        let slot = sums.entry(label).or_insert((0.0, 0));
        slot.0 += v;
        slot.1 += 1;
    }
    for (label, v) in labels.iter().zip(values.iter_mut()) {
        if let Some(&(sum, count)) = sums.get(label) {
            let mean = sum / count as f64;
            if mean != 0.0 {
                *v /= mean;
            }
        }
    }

    let residual_norm = norm(&graph.matrix.mul_vec(&values));

    tracing::info!(
        teams = n,
        games = outcomes.len(),
        components = null.free_rows,
        residual = residual_norm,
        "ranking solved"
    );
    if null.free_rows > 1 {
        tracing::warn!(
            components = null.free_rows,
            "outcome graph is not connected; values are only comparable within a component"
        );
    }
    if null.free_rows != sums.len() {
        tracing::warn!(
            eliminated = null.free_rows,
            linked = sums.len(),
            "component counts disagree"
        );
    }
    if residual_norm > cfg.residual_tolerance {
        tracing::warn!(residual = residual_norm, "equilibrium residual above tolerance");
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        values[b]
            .partial_cmp(&values[a])
            .unwrap_or(Ordering::Equal)
            .then_with(|| graph.teams[a].name().cmp(graph.teams[b].name()))
    });

    let median = values[order[n / 2]];
    let gender = league.season().gender();
    let entries = order
        .iter()
        .enumerate()
        .map(|(pos, &i)| {
            let prediction =
                cfg.valuation
                    .predict_game(values[i], median, SiteType::Neutral, gender);
            RankingEntry {
                team: graph.teams[i].clone(),
                rank: pos + 1,
                value: values[i],
                wins: graph.records[i].wins,
                games: graph.records[i].games,
                points_over_median: prediction.expected_margin,
            }
        })
        .collect();

    Ranking {
        entries,
        component_count: null.free_rows,
        residual_norm,
    }
}
