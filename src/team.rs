use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Prime id reserved for the non-Division-I placeholder.
pub const NON_D1_PRIME: u64 = 2;
pub const NON_D1_EXTERNAL_ID: &str = "0";
pub const NON_D1_NAME: &str = "non-Div I Schools";

pub type TeamRef = Arc<Team>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Team {
    name: String,
    external_id: String,
    prime_id: u64,
    division_one: bool,
}

impl Team {
    pub fn new(
        name: impl Into<String>,
        external_id: impl Into<String>,
        prime_id: u64,
        division_one: bool,
    ) -> Self {
        Self {
            name: name.into(),
            external_id: external_id.into(),
            prime_id,
            division_one,
        }
    }

    /// The shared stand-in for every opponent outside Division I.
    pub fn non_d1() -> Self {
        Self::non_d1_named(NON_D1_NAME)
    }

    /// A transient non-D1 team that keeps the name it was asked for.
    pub fn non_d1_named(name: impl Into<String>) -> Self {
        Self::new(name, NON_D1_EXTERNAL_ID, NON_D1_PRIME, false)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn prime_id(&self) -> u64 {
        self.prime_id
    }

    pub fn is_division_one(&self) -> bool {
        self.division_one
    }

    pub fn is_non_d1(&self) -> bool {
        self.prime_id == NON_D1_PRIME
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// One roster line: (team name, external id, prime id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterRow {
    pub name: String,
    pub external_id: String,
    pub prime_id: u64,
}

/// Sort `(name, external id)` pairs by name, put the non-D1 sentinel first and
/// hand out consecutive primes starting from 2.
pub fn assign_prime_ids<I, N, E>(teams: I) -> Vec<RosterRow>
where
    I: IntoIterator<Item = (N, E)>,
    N: Into<String>,
    E: Into<String>,
{
    let mut pairs: Vec<(String, String)> = teams
        .into_iter()
        .map(|(n, e)| (n.into(), e.into()))
        .filter(|(_, e)| e != NON_D1_EXTERNAL_ID)
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    pairs.dedup_by(|a, b| a.0 == b.0);

    let primes = first_primes(pairs.len() + 1);
    let mut rows = Vec::with_capacity(pairs.len() + 1);
    rows.push(RosterRow {
        name: NON_D1_NAME.to_string(),
        external_id: NON_D1_EXTERNAL_ID.to_string(),
        prime_id: NON_D1_PRIME,
    });
    for ((name, external_id), prime_id) in pairs.into_iter().zip(primes.into_iter().skip(1)) {
        rows.push(RosterRow {
            name,
            external_id,
            prime_id,
        });
    }
    rows
}

fn first_primes(n: usize) -> Vec<u64> {
    let mut out: Vec<u64> = Vec::with_capacity(n);
    let mut candidate = 2u64;
    while out.len() < n {
        let is_prime = out
            .iter()
            .take_while(|p| **p * **p <= candidate)
            .all(|p| candidate % p != 0);
        if is_prime {
            out.push(candidate);
        }
        candidate += 1;
    }
    out
}
