pub mod bout;
pub mod elimination;
pub mod error;
pub mod game;
pub mod league;
pub mod rank;
pub mod season;
pub mod season_games;
pub mod team;
pub mod win_prob;
