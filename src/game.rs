use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::bout::Bouts;
use crate::error::{CbbError, Result};
use crate::team::{Team, TeamRef};

const CODE_LEN: usize = 16;
const PRODUCT_DIGITS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SiteType {
    Hosted,
    Neutral,
}

impl SiteType {
    pub fn flag(self) -> char {
        match self {
            SiteType::Hosted => 'H',
            SiteType::Neutral => 'N',
        }
    }

    pub fn from_flag(flag: char) -> Option<Self> {
        match flag.to_ascii_uppercase() {
            'H' => Some(SiteType::Hosted),
            'N' => Some(SiteType::Neutral),
            _ => None,
        }
    }
}

/// Game hashcode: `yyyymmdd`, a site flag and the zero-padded product of both
/// teams' prime ids, e.g. `20120128H2585753`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameCode {
    raw: String,
    date: NaiveDate,
    site: SiteType,
    prime_product: u64,
}

impl GameCode {
    pub fn new(date: NaiveDate, site: SiteType, home: &Team, visitor: &Team) -> Self {
        let prime_product = home.prime_id() * visitor.prime_id();
        let raw = format!(
            "{}{}{:0width$}",
            date.format("%Y%m%d"),
            site.flag(),
            prime_product,
            width = PRODUCT_DIGITS
        );
        Self {
            raw,
            date,
            site,
            prime_product,
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = || CbbError::InvalidGameCode {
            raw: raw.to_string(),
        };
        if raw.len() != CODE_LEN || !raw.is_ascii() {
            return Err(invalid());
        }
        let date = NaiveDate::parse_from_str(&raw[..8], "%Y%m%d").map_err(|_| invalid())?;
        let site = raw[8..9]
            .chars()
            .next()
            .and_then(SiteType::from_flag)
            .ok_or_else(invalid)?;
        let product = &raw[9..];
        if !product.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let prime_product = product.parse::<u64>().map_err(|_| invalid())?;
        Ok(Self {
            raw: raw.to_string(),
            date,
            site,
            prime_product,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn site(&self) -> SiteType {
        self.site
    }

    pub fn prime_product(&self) -> u64 {
        self.prime_product
    }

    /// True when the code's product matches this pairing of teams.
    pub fn pairs(&self, a: &Team, b: &Team) -> bool {
        a.prime_id() * b.prime_id() == self.prime_product
    }
}

impl fmt::Display for GameCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for GameCode {
    type Err = CbbError;

    fn from_str(raw: &str) -> Result<Self> {
        Self::parse(raw)
    }
}

/// Raw play row as handed over by a play-by-play source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayRow {
    pub period: u32,
    pub clock: String,
    pub visitor_score: u32,
    pub home_score: u32,
    /// `hm`, `vs`, or either team's name.
    pub team: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Play {
    pub period: u32,
    pub clock: String,
    pub visitor_score: u32,
    pub home_score: u32,
    pub team: TeamRef,
    pub description: String,
}

impl fmt::Display for Play {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{:02},{:02},{},{}",
            self.period, self.clock, self.visitor_score, self.home_score, self.team, self.description
        )
    }
}

/// One contest: two teams and a non-empty, ordered play list.
#[derive(Debug, Clone)]
pub struct Game {
    code: GameCode,
    home: TeamRef,
    visitor: TeamRef,
    plays: Vec<Play>,
}

impl Game {
    /// Fails with `EmptyGame` when no row has a period of at least 1, and with
    /// `UnknownActingTeam` when a row names neither participant.
    pub fn new(code: GameCode, home: TeamRef, visitor: TeamRef, rows: Vec<PlayRow>) -> Result<Self> {
        let mut plays = Vec::with_capacity(rows.len());
        for row in rows {
            if row.period == 0 {
                continue;
            }
            let team = resolve_acting_team(&code, &home, &visitor, &row.team)?;
            plays.push(Play {
                period: row.period,
                clock: row.clock,
                visitor_score: row.visitor_score,
                home_score: row.home_score,
                team,
                description: row.description,
            });
        }

        if plays.is_empty() {
            return Err(CbbError::EmptyGame {
                code: code.to_string(),
                home: home.name().to_string(),
                visitor: visitor.name().to_string(),
            });
        }

        Ok(Self {
            code,
            home,
            visitor,
            plays,
        })
    }

    pub fn code(&self) -> &GameCode {
        &self.code
    }

    pub fn home(&self) -> &TeamRef {
        &self.home
    }

    pub fn visitor(&self) -> &TeamRef {
        &self.visitor
    }

    pub fn plays(&self) -> &[Play] {
        &self.plays
    }

    pub fn date(&self) -> NaiveDate {
        self.code.date()
    }

    pub fn site(&self) -> SiteType {
        self.code.site()
    }

    pub fn is_hosted(&self) -> bool {
        self.site() == SiteType::Hosted
    }

    pub fn involves(&self, team: &Team) -> bool {
        self.home.as_ref() == team || self.visitor.as_ref() == team
    }

    /// (home, visitor) score after the last recorded play.
    pub fn final_score(&self) -> (u32, u32) {
        self.plays
            .last()
            .map(|p| (p.home_score, p.visitor_score))
            .unwrap_or((0, 0))
    }

    /// Segment the play list into possessions.
    pub fn bouts(&self) -> Bouts<'_> {
        Bouts::new(&self.plays)
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} @ {}", self.code, self.visitor, self.home)
    }
}

fn resolve_acting_team(
    code: &GameCode,
    home: &TeamRef,
    visitor: &TeamRef,
    token: &str,
) -> Result<TeamRef> {
    let token = token.trim();
    if token == "hm" || token == home.name() {
        Ok(home.clone())
    } else if token == "vs" || token == visitor.name() {
        Ok(visitor.clone())
    } else {
        Err(CbbError::UnknownActingTeam {
            code: code.to_string(),
            token: token.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn teams() -> (TeamRef, TeamRef) {
        (
            Arc::new(Team::new("North Carolina St.", "490", 3, true)),
            Arc::new(Team::new("Elon", "191", 5, true)),
        )
    }

    fn row(team: &str, description: &str) -> PlayRow {
        PlayRow {
            period: 1,
            clock: "19:40".into(),
            visitor_score: 0,
            home_score: 2,
            team: team.into(),
            description: description.into(),
        }
    }

    #[test]
    fn code_formats_and_parses() {
        let (hm, vs) = teams();
        let date = NaiveDate::from_ymd_opt(2012, 1, 28).unwrap();
        let code = GameCode::new(date, SiteType::Hosted, &hm, &vs);
        assert_eq!(code.as_str(), "20120128H0000015");
        let parsed: GameCode = code.as_str().parse().unwrap();
        assert_eq!(parsed, code);
        assert_eq!(parsed.site(), SiteType::Hosted);
        assert!(parsed.pairs(&vs, &hm));
    }

    #[test]
    fn malformed_codes_are_rejected() {
        for raw in ["20120128H258575", "20121328H2585753", "20120128X2585753", "20120128H25857a3"] {
            assert!(
                matches!(GameCode::parse(raw), Err(CbbError::InvalidGameCode { .. })),
                "{raw} should not parse"
            );
        }
    }

    #[test]
    fn empty_game_carries_diagnostics() {
        let (hm, vs) = teams();
        let code = GameCode::parse("20120128H2585753").unwrap();
        let err = Game::new(code, hm, vs, Vec::new()).unwrap_err();
        assert!(err.is_empty_game());
        let msg = err.to_string();
        assert!(msg.contains("20120128H2585753"));
        assert!(msg.contains("Elon vs. North Carolina St."));
    }

    #[test]
    fn acting_team_tokens_resolve_roles_and_names() {
        let (hm, vs) = teams();
        let code = GameCode::parse("20120128N2585753").unwrap();
        let game = Game::new(
            code,
            hm.clone(),
            vs.clone(),
            vec![row("hm", "made layup"), row("Elon", "defensive rebound"), row("vs", "turnover")],
        )
        .unwrap();
        assert_eq!(game.plays()[0].team, hm);
        assert_eq!(game.plays()[1].team, vs);
        assert_eq!(game.plays()[2].team, vs);
        assert!(!game.is_hosted());
        assert_eq!(game.to_string(), "20120128N2585753: Elon @ North Carolina St.");
    }

    #[test]
    fn unknown_acting_team_is_fatal() {
        let (hm, vs) = teams();
        let code = GameCode::parse("20120128H2585753").unwrap();
        let err = Game::new(code, hm, vs, vec![row("Duke", "made jumper")]).unwrap_err();
        assert!(matches!(err, CbbError::UnknownActingTeam { ref token, .. } if token == "Duke"));
    }

    #[test]
    fn final_score_comes_from_the_last_play() {
        let (hm, vs) = teams();
        let code = GameCode::parse("20120128H2585753").unwrap();
        let mut last = row("vs", "end of game");
        last.home_score = 71;
        last.visitor_score = 64;
        let game = Game::new(code, hm, vs, vec![row("hm", "made layup"), last]).unwrap();
        assert_eq!(game.final_score(), (71, 64));
    }
}
