use thiserror::Error;

/// Errors raised by the season model, game construction and config loading.
///
/// Every variant is scoped to the smallest unit it concerns (one label, one
/// game). Ranking-graph connectivity and elimination residuals are reported
/// as diagnostics on [`crate::rank::Ranking`], never through this type.
#[derive(Error, Debug)]
pub enum CbbError {
    #[error("season label {label:?} is not valid")]
    InvalidSeasonLabel { label: String },

    #[error("gender must be \"M\" or \"W\", got {raw:?}")]
    InvalidGender { raw: String },

    #[error("season year {raw:?} is not a valid year (2009 or later)")]
    InvalidYear { raw: String },

    #[error("game code {raw:?} is malformed")]
    InvalidGameCode { raw: String },

    #[error("no play-by-play data in {code}, {visitor} vs. {home}")]
    EmptyGame {
        code: String,
        home: String,
        visitor: String,
    },

    #[error("play in {code} references team {token:?} outside the game")]
    UnknownActingTeam { code: String, token: String },

    #[error("invalid config: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

impl CbbError {
    /// True for the one error a season build records and skips silently.
    pub fn is_empty_game(&self) -> bool {
        matches!(self, CbbError::EmptyGame { .. })
    }
}

pub type Result<T> = std::result::Result<T, CbbError>;
