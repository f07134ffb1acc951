use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CbbError, Result};

/// First season with play-by-play coverage.
pub const FIRST_SEASON_YEAR: i32 = 2009;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Gender {
    Men,
    Women,
}

impl Gender {
    pub fn code(self) -> char {
        match self {
            Gender::Men => 'M',
            Gender::Women => 'W',
        }
    }
}

impl FromStr for Gender {
    type Err = CbbError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim() {
            "M" | "m" => Ok(Gender::Men),
            "W" | "w" => Ok(Gender::Women),
            _ => Err(CbbError::InvalidGender {
                raw: raw.to_string(),
            }),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A (gender, starting year) season, rendered as e.g. `M_11-12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeasonId {
    gender: Gender,
    start_year: i32,
}

impl SeasonId {
    pub fn new(gender: Gender, start_year: i32) -> Result<Self> {
        if start_year < FIRST_SEASON_YEAR {
            return Err(CbbError::InvalidYear {
                raw: start_year.to_string(),
            });
        }
        Ok(Self { gender, start_year })
    }

    /// Build from loosely typed parts, e.g. `("w", "2011")`.
    pub fn parse(gender: &str, year: &str) -> Result<Self> {
        let gender = gender.parse::<Gender>()?;
        let start_year = year.trim().parse::<i32>().map_err(|_| CbbError::InvalidYear {
            raw: year.to_string(),
        })?;
        Self::new(gender, start_year)
    }

    /// Parse a `{M|W}_{yy}-{yy}` label.
    pub fn parse_label(label: &str) -> Result<Self> {
        let invalid = || CbbError::InvalidSeasonLabel {
            label: label.to_string(),
        };
        let (gender, years) = label.split_once('_').ok_or_else(invalid)?;
        let (first, second) = years.split_once('-').ok_or_else(invalid)?;
        let first = parse_two_digits(first).ok_or_else(invalid)?;
        let second = parse_two_digits(second).ok_or_else(invalid)?;
        if (first + 1) % 100 != second {
            return Err(invalid());
        }
        let gender = gender.parse::<Gender>()?;
        Self::new(gender, 2000 + first)
    }

    /// Find the season token inside a source name such as
    /// `team_hashcodes_M_09-10.csv`.
    pub fn from_source_name(name: &str) -> Result<Self> {
        let chars: Vec<char> = name.chars().collect();
        for window in chars.windows(7) {
            let looks_like_label = matches!(window[0], 'M' | 'W' | 'm' | 'w')
                && window[1] == '_'
                && window[2].is_ascii_digit()
                && window[3].is_ascii_digit()
                && window[4] == '-'
                && window[5].is_ascii_digit()
                && window[6].is_ascii_digit();
            if looks_like_label {
                let label: String = window.iter().collect();
                return Self::parse_label(&label);
            }
        }
        Err(CbbError::InvalidSeasonLabel {
            label: name.to_string(),
        })
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    pub fn label(&self) -> String {
        format!(
            "{}_{:02}-{:02}",
            self.gender.code(),
            self.start_year % 100,
            (self.start_year + 1) % 100
        )
    }
}

impl fmt::Display for SeasonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for SeasonId {
    type Err = CbbError;

    fn from_str(raw: &str) -> Result<Self> {
        Self::parse_label(raw)
    }
}

fn parse_two_digits(raw: &str) -> Option<i32> {
    if raw.len() != 2 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_uses_two_digit_years() {
        let sn = SeasonId::new(Gender::Men, 2011).unwrap();
        assert_eq!(sn.label(), "M_11-12");
        let sn = SeasonId::new(Gender::Women, 2099).unwrap();
        assert_eq!(sn.to_string(), "W_99-00");
    }

    #[test]
    fn rejects_years_before_coverage() {
        let err = SeasonId::new(Gender::Men, 2008).unwrap_err();
        assert!(matches!(err, CbbError::InvalidYear { .. }));
        assert!(matches!(
            SeasonId::parse("M", "twenty"),
            Err(CbbError::InvalidYear { .. })
        ));
    }

    #[test]
    fn gender_is_case_insensitive() {
        let sn = SeasonId::parse("w", "2012").unwrap();
        assert_eq!(sn.gender(), Gender::Women);
        assert!(matches!(
            SeasonId::parse("X", "2012"),
            Err(CbbError::InvalidGender { .. })
        ));
    }

    #[test]
    fn label_round_trips_through_parse() {
        let sn: SeasonId = "W_10-11".parse().unwrap();
        assert_eq!(sn, SeasonId::new(Gender::Women, 2010).unwrap());
    }

    #[test]
    fn mismatched_years_are_rejected() {
        assert!(matches!(
            SeasonId::parse_label("M_11-13"),
            Err(CbbError::InvalidSeasonLabel { .. })
        ));
        assert!(matches!(
            SeasonId::parse_label("M11-12"),
            Err(CbbError::InvalidSeasonLabel { .. })
        ));
    }

    #[test]
    fn source_names_carry_the_season() {
        let sn = SeasonId::from_source_name("team_hashcodes_M_09-10.csv").unwrap();
        assert_eq!(sn.label(), "M_09-10");
        let sn = SeasonId::from_source_name("pbp_data_W_12-13.xml").unwrap();
        assert_eq!(sn.gender(), Gender::Women);
        assert!(SeasonId::from_source_name("hashcodes.csv").is_err());
    }

    #[test]
    fn ordering_is_gender_then_year() {
        let a = SeasonId::new(Gender::Men, 2012).unwrap();
        let b = SeasonId::new(Gender::Women, 2010).unwrap();
        let c = SeasonId::new(Gender::Men, 2010).unwrap();
        let mut all = vec![a, b, c];
        all.sort();
        assert_eq!(all, vec![c, a, b]);
    }
}
