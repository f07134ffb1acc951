use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::game::{Game, GameCode, PlayRow};
use crate::league::League;
use crate::rank::GameOutcome;
use crate::team::Team;

/// One game as delivered by a play-by-play source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub code: String,
    /// Home team name or external id.
    pub home: String,
    /// Visiting team name or external id.
    pub visitor: String,
    pub rows: Vec<PlayRow>,
}

/// All games of one season with play-by-play, keyed and ordered by hashcode.
#[derive(Debug, Clone)]
pub struct SeasonGames {
    league: League,
    games: BTreeMap<GameCode, Game>,
    empty_games: Vec<GameCode>,
    rejected: Vec<String>,
}

impl SeasonGames {
    pub fn new(league: League) -> Self {
        Self {
            league,
            games: BTreeMap::new(),
            empty_games: Vec::new(),
            rejected: Vec::new(),
        }
    }

    /// Build a season, skipping games that fail to construct. Empty games are
    /// listed in [`SeasonGames::empty_games`], every other failure in
    /// [`SeasonGames::rejected`].
    pub fn from_records<I>(league: League, records: I) -> Self
    where
        I: IntoIterator<Item = GameRecord>,
    {
        let mut season = Self::new(league);
        for record in records {
            let code = record.code.clone();
            match season.add(record) {
                Ok(()) => {}
                Err(err) if err.is_empty_game() => {
                    tracing::warn!(%err, "skipping game without play-by-play");
                    if let Ok(code) = GameCode::parse(&code) {
                        season.empty_games.push(code);
                    }
                }
                Err(err) => {
                    tracing::warn!(%err, code = %code, "rejecting game");
                    season.rejected.push(code);
                }
            }
        }
        tracing::debug!(
            season = %season.league.season(),
            games = season.games.len(),
            empty = season.empty_games.len(),
            rejected = season.rejected.len(),
            "season loaded"
        );
        season
    }

    /// Construct and insert one game. A hashcode already present is kept and
    /// the new record ignored.
    pub fn add(&mut self, record: GameRecord) -> Result<()> {
        let code = GameCode::parse(&record.code)?;
        if self.games.contains_key(&code) {
            tracing::debug!(code = %code, "duplicate game ignored");
            return Ok(());
        }
        let home = self.league.lookup(&record.home);
        let visitor = self.league.lookup(&record.visitor);
        let game = Game::new(code.clone(), home, visitor, record.rows)?;
        self.games.insert(code, game);
        Ok(())
    }

    pub fn league(&self) -> &League {
        &self.league
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn get(&self, code: &GameCode) -> Option<&Game> {
        self.games.get(code)
    }

    pub fn empty_games(&self) -> &[GameCode] {
        &self.empty_games
    }

    /// Raw codes of games rejected for reasons other than missing plays.
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    /// Games in hashcode (date) order.
    pub fn iter(&self) -> impl Iterator<Item = &Game> {
        self.games.values()
    }

    /// Games `team` took part in, in hashcode order.
    pub fn schedule(&self, team: &Team) -> Vec<&Game> {
        self.iter().filter(|g| g.involves(team)).collect()
    }

    /// Final-score outcomes for the ranking, read off the last play of each
    /// game.
    pub fn outcomes(&self) -> Vec<GameOutcome> {
        let gender = self.league.season().gender();
        self.iter()
            .map(|g| {
                let (home_score, visitor_score) = g.final_score();
                GameOutcome::from_scores(
                    g.code().clone(),
                    g.home().clone(),
                    g.visitor().clone(),
                    home_score,
                    visitor_score,
                    gender,
                )
            })
            .collect()
    }

    /// Number of possessions per game, in hashcode order.
    pub fn bout_counts(&self) -> Vec<(GameCode, usize)> {
        self.games
            .par_iter()
            .map(|(code, g)| (code.clone(), g.bouts().count()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::season::{Gender, SeasonId};
    use crate::team::assign_prime_ids;

    fn league() -> League {
        let season = SeasonId::new(Gender::Women, 2012).unwrap();
        League::from_roster(season, assign_prime_ids([("Baylor", "51"), ("Connecticut", "164")]))
    }

    fn row(team: &str, hs: u32, vs: u32, description: &str) -> PlayRow {
        PlayRow {
            period: 1,
            clock: "10:00".into(),
            visitor_score: vs,
            home_score: hs,
            team: team.into(),
            description: description.into(),
        }
    }

    fn record(code: &str, home: &str, visitor: &str, rows: Vec<PlayRow>) -> GameRecord {
        GameRecord {
            code: code.into(),
            home: home.into(),
            visitor: visitor.into(),
            rows,
        }
    }

    #[test]
    fn failures_are_scoped_to_single_games() {
        let records = vec![
            record(
                "20130105H0000015",
                "Baylor",
                "Connecticut",
                vec![row("hm", 2, 0, "made layup"), row("vs", 2, 3, "made three")],
            ),
            record("20121230N0000015", "Connecticut", "Baylor", Vec::new()),
            record("20121201H0000015", "51", "164", vec![row("Duke", 0, 0, "made layup")]),
            record("2012", "51", "164", vec![row("hm", 0, 0, "made layup")]),
        ];
        let season = SeasonGames::from_records(league(), records);
        assert_eq!(season.len(), 1);
        assert_eq!(season.empty_games().len(), 1);
        assert_eq!(season.empty_games()[0].as_str(), "20121230N0000015");
        assert_eq!(season.rejected(), &["20121201H0000015".to_string(), "2012".to_string()]);
    }

    #[test]
    fn games_iterate_in_code_order_and_form_schedules() {
        let lg = league();
        let baylor = lg.lookup("Baylor");
        let records = vec![
            record("20130105H0000015", "Baylor", "Connecticut", vec![row("hm", 60, 55, "end of game")]),
            record("20121110N0000006", "Baylor", "Mars Hill", vec![row("hm", 90, 40, "end of game")]),
            record("20121110N0000006", "Baylor", "Mars Hill", vec![row("hm", 1, 0, "dup")]),
        ];
        let season = SeasonGames::from_records(lg, records);
        let codes: Vec<&str> = season.iter().map(|g| g.code().as_str()).collect();
        assert_eq!(codes, vec!["20121110N0000006", "20130105H0000015"]);
        assert_eq!(season.schedule(&baylor).len(), 2);

        let outcomes = season.outcomes();
        assert_eq!(outcomes[0].margin(), 50);
        assert_eq!(outcomes[0].gender, Gender::Women);
        assert!(outcomes[0].visitor.is_non_d1());
    }
}
