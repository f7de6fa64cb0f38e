pub mod achievements;
pub mod player_stats;
pub mod scoring;
