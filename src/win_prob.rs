use std::f64::consts::{PI, SQRT_2};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::game::SiteType;
use crate::season::Gender;

// Fitted offline from historical final margins (home - visitor).
const MEN_HOME_EDGE: f64 = 4.45703;
const MEN_SCORE_STDDEV: f64 = 12.75732;
const WOMEN_HOME_EDGE: f64 = 3.94315;
const WOMEN_SCORE_STDDEV: f64 = 16.36411;

const PROB_FLOOR: f64 = 1e-12;

/// Normal model of the final margin for one league.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarginParams {
    /// Mean home-court advantage in points.
    pub home_edge: f64,
    pub score_stddev: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationModel {
    pub men: MarginParams,
    pub women: MarginParams,
}

impl Default for ValuationModel {
    fn default() -> Self {
        Self {
            men: MarginParams {
                home_edge: MEN_HOME_EDGE,
                score_stddev: MEN_SCORE_STDDEV,
            },
            women: MarginParams {
                home_edge: WOMEN_HOME_EDGE,
                score_stddev: WOMEN_SCORE_STDDEV,
            },
        }
    }
}

/// Random-walker vote split for one game. `visitor_to_home` is the share of
/// voters who judge the home side stronger; the two shares sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WinSplit {
    pub visitor_to_home: f64,
    pub home_to_visitor: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GamePrediction {
    pub home_win_prob: f64,
    /// Expected home margin in points.
    pub expected_margin: f64,
}

impl ValuationModel {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn params(&self, gender: Gender) -> MarginParams {
        match gender {
            Gender::Men => self.men,
            Gender::Women => self.women,
        }
    }

    /// Value a final margin (home - visitor): the fraction of historical
    /// outcomes this result beats, after removing the home edge for hosted
    /// games.
    pub fn valuate(&self, margin: f64, site: SiteType, gender: Gender) -> WinSplit {
        let p = self.params(gender);
        let adjusted = match site {
            SiteType::Hosted => margin - p.home_edge,
            SiteType::Neutral => margin,
        };
        let visitor_to_home = 0.5 * (1.0 + erf(adjusted / (SQRT_2 * p.score_stddev)));
        WinSplit {
            visitor_to_home,
            home_to_visitor: 1.0 - visitor_to_home,
        }
    }

    /// Neutral-site margin whose valuation gives `visitor_to_home`.
    pub fn implied_margin(&self, visitor_to_home: f64, gender: Gender) -> f64 {
        let p = visitor_to_home.clamp(PROB_FLOOR, 1.0 - PROB_FLOOR);
        SQRT_2 * self.params(gender).score_stddev * erf_inv(2.0 * p - 1.0)
    }

    /// Predict a game from two equilibrium values. The value ratio is read as
    /// the stationary vote split between the two sides.
    pub fn predict_game(
        &self,
        home_value: f64,
        visitor_value: f64,
        site: SiteType,
        gender: Gender,
    ) -> GamePrediction {
        let total = home_value + visitor_value;
        let share = if total > 0.0 {
            home_value / total
        } else {
            0.5
        };
        let params = self.params(gender);
        let mut expected_margin = self.implied_margin(share, gender);
        if site == SiteType::Hosted {
            expected_margin += params.home_edge;
        }
        let home_win_prob =
            0.5 * (1.0 + erf(expected_margin / (SQRT_2 * params.score_stddev)));
        GamePrediction {
            home_win_prob,
            expected_margin,
        }
    }
}

/// Gauss error function: Maclaurin series near zero, Laplace continued
/// fraction for the tail.
fn erf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    let z = x.abs();
    let v = if z < 2.5 {
        erf_series(z)
    } else {
        1.0 - erfc_tail(z)
    };
    v.copysign(x)
}

fn erf_series(z: f64) -> f64 {
    let z2 = z * z;
    let mut a = z;
    let mut sum = z;
    for n in 1..200 {
        a *= -z2 / n as f64;
        let term = a / (2 * n + 1) as f64;
        sum += term;
        if term.abs() <= 1e-17 * sum.abs() {
            break;
        }
    }
    sum * 2.0 / PI.sqrt()
}

fn erfc_tail(z: f64) -> f64 {
    const DEPTH: usize = 80;
    let mut t = z;
    for k in (1..=DEPTH).rev() {
        t = z + (k as f64 / 2.0) / t;
    }
    (-z * z).exp() / (PI.sqrt() * t)
}

fn erf_inv(y: f64) -> f64 {
    if y == 0.0 {
        return 0.0;
    }
    if y <= -1.0 {
        return f64::NEG_INFINITY;
    }
    if y >= 1.0 {
        return f64::INFINITY;
    }

    // Winitzki's closed form as a starting point, then Newton.
    const A: f64 = 0.147;
    let ln = (1.0 - y * y).ln();
    let t = 2.0 / (PI * A) + ln / 2.0;
    let mut x = ((t * t - ln / A).sqrt() - t).sqrt().copysign(y);

    for _ in 0..12 {
        let slope = 2.0 / PI.sqrt() * (-x * x).exp();
        if slope <= 0.0 {
            break;
        }
        let step = (erf(x) - y) / slope;
        x -= step;
        if step.abs() <= 1e-15 * (1.0 + x.abs()) {
            break;
        }
    }
    x
}
