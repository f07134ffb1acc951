use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::season::SeasonId;
use crate::team::{RosterRow, Team, TeamRef, NON_D1_PRIME};

/// The three disjoint key spaces a team can be found under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TeamKey {
    Name(String),
    ExternalId(String),
    Prime(u64),
}

impl From<&str> for TeamKey {
    /// All-digit strings are external ids, anything else is a team name.
    fn from(raw: &str) -> Self {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            TeamKey::ExternalId(raw.to_string())
        } else {
            TeamKey::Name(raw.to_string())
        }
    }
}

impl From<&String> for TeamKey {
    fn from(raw: &String) -> Self {
        TeamKey::from(raw.as_str())
    }
}

impl From<u64> for TeamKey {
    fn from(prime: u64) -> Self {
        TeamKey::Prime(prime)
    }
}

/// Season-scoped team registry with three-way lookup.
#[derive(Debug, Clone)]
pub struct League {
    season: SeasonId,
    registry: HashMap<TeamKey, TeamRef>,
    roster: Vec<TeamRef>,
    non_d1: TeamRef,
}

impl League {
    /// Build from roster rows. The row carrying prime 2 becomes the non-D1
    /// sentinel; a default sentinel is used when the source has none.
    pub fn from_roster<I>(season: SeasonId, rows: I) -> Self
    where
        I: IntoIterator<Item = RosterRow>,
    {
        let mut registry = HashMap::new();
        let mut roster = Vec::new();
        let mut non_d1: Option<TeamRef> = None;

        for row in rows {
            let sentinel = row.prime_id == NON_D1_PRIME;
            let team: TeamRef = Arc::new(Team::new(
                row.name,
                row.external_id,
                row.prime_id,
                !sentinel,
            ));
            registry.insert(TeamKey::Name(team.name().to_string()), team.clone());
            registry.insert(
                TeamKey::ExternalId(team.external_id().to_string()),
                team.clone(),
            );
            registry.insert(TeamKey::Prime(team.prime_id()), team.clone());
            if sentinel {
                non_d1 = Some(team);
            } else {
                roster.push(team);
            }
        }

        let non_d1 = match non_d1 {
            Some(team) => team,
            None => {
                let team: TeamRef = Arc::new(Team::non_d1());
                registry.insert(TeamKey::Name(team.name().to_string()), team.clone());
                registry.insert(
                    TeamKey::ExternalId(team.external_id().to_string()),
                    team.clone(),
                );
                registry.insert(TeamKey::Prime(team.prime_id()), team.clone());
                team
            }
        };

        roster.sort_by(|a, b| a.name().cmp(b.name()));
        tracing::debug!(season = %season, teams = roster.len(), "league roster loaded");

        Self {
            season,
            registry,
            roster,
            non_d1,
        }
    }

    /// Build from a roster whose source name carries the season label,
    /// e.g. `team_hashcodes_M_11-12.csv`.
    pub fn from_source_name<I>(source_name: &str, rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = RosterRow>,
    {
        let season = SeasonId::from_source_name(source_name)?;
        Ok(Self::from_roster(season, rows))
    }

    /// Share another league's registry.
    pub fn from_league(other: &League) -> Self {
        other.clone()
    }

    pub fn season(&self) -> SeasonId {
        self.season
    }

    /// Resolve a team name, numeric external id or prime id.
    ///
    /// Unknown ids and primes resolve to the non-D1 sentinel; unknown names
    /// resolve to a transient non-D1 team carrying that name.
    pub fn lookup(&self, key: impl Into<TeamKey>) -> TeamRef {
        let key = key.into();
        if let Some(team) = self.registry.get(&key) {
            return team.clone();
        }
        match key {
            TeamKey::Name(name) => Arc::new(Team::non_d1_named(name)),
            TeamKey::ExternalId(_) | TeamKey::Prime(_) => self.non_d1.clone(),
        }
    }

    pub fn get(&self, key: impl Into<TeamKey>) -> Option<&TeamRef> {
        self.registry.get(&key.into())
    }

    /// True when `team` is a Division-I member of this roster.
    pub fn contains(&self, team: &Team) -> bool {
        team.is_division_one()
            && self
                .registry
                .get(&TeamKey::Prime(team.prime_id()))
                .is_some_and(|t| t.as_ref() == team)
    }

    pub fn non_d1(&self) -> &TeamRef {
        &self.non_d1
    }

    /// Number of Division-I teams.
    pub fn team_count(&self) -> usize {
        self.roster.len()
    }

    /// Division-I teams in name order.
    pub fn iter(&self) -> std::slice::Iter<'_, TeamRef> {
        self.roster.iter()
    }
}

impl<'a> IntoIterator for &'a League {
    type Item = &'a TeamRef;
    type IntoIter = std::slice::Iter<'a, TeamRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::season::Gender;
    use crate::team::assign_prime_ids;

    fn league() -> League {
        let season = SeasonId::new(Gender::Men, 2011).unwrap();
        let rows = assign_prime_ids([
            ("North Carolina St.", "490"),
            ("Elon", "191"),
            ("Duke", "193"),
        ]);
        League::from_roster(season, rows)
    }

    #[test]
    fn every_team_is_reachable_three_ways() {
        let lg = league();
        for team in &lg {
            assert_eq!(lg.lookup(team.name()), *team);
            assert_eq!(lg.lookup(team.external_id()), *team);
            assert_eq!(lg.lookup(team.prime_id()), *team);
        }
    }

    #[test]
    fn iteration_is_d1_only_in_name_order() {
        let lg = league();
        let names: Vec<&str> = lg.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["Duke", "Elon", "North Carolina St."]);
        assert_eq!(lg.team_count(), 3);
    }

    #[test]
    fn unknown_ids_fall_back_to_the_sentinel() {
        let lg = league();
        assert_eq!(lg.lookup("99999"), *lg.non_d1());
        assert_eq!(lg.lookup(97u64), *lg.non_d1());
        let transient = lg.lookup("Mars Hill");
        assert_eq!(transient.name(), "Mars Hill");
        assert!(transient.is_non_d1());
        assert!(!lg.contains(&transient));
    }

    #[test]
    fn missing_sentinel_row_is_filled_in() {
        let season = SeasonId::new(Gender::Women, 2012).unwrap();
        let lg = League::from_roster(
            season,
            vec![RosterRow {
                name: "Baylor".into(),
                external_id: "51".into(),
                prime_id: 3,
            }],
        );
        assert_eq!(lg.lookup("0"), *lg.non_d1());
        assert_eq!(lg.lookup(2u64).name(), crate::team::NON_D1_NAME);
    }

    #[test]
    fn source_name_sets_the_season() {
        let lg = League::from_source_name("team_hashcodes_W_10-11.csv", Vec::new()).unwrap();
        assert_eq!(lg.season().label(), "W_10-11");
        assert!(League::from_source_name("roster.csv", Vec::new()).is_err());
        let copy = League::from_league(&lg);
        assert_eq!(copy.season(), lg.season());
    }
}
