use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::achievements::UnlockState;
use crate::engine::player_stats::PlayerStats;

const SCHEMA_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatsData {
    pub schema_version: u32,
    pub stats: PlayerStats,
}

impl Default for PlayerStatsData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            stats: PlayerStats::default(),
        }
    }
}

impl PlayerStatsData {
    pub fn new(stats: PlayerStats) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            stats,
        }
    }

    /// Check if loaded data has a stale schema version and needs reset.
    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }
}

/// Unlock overlay for one catalog entry, keyed by id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AchievementRecord {
    pub id: String,
    #[serde(flatten)]
    pub state: UnlockState,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AchievementsData {
    pub schema_version: u32,
    pub achievements: Vec<AchievementRecord>,
}

impl Default for AchievementsData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            achievements: Vec::new(),
        }
    }
}

impl AchievementsData {
    pub fn new(achievements: Vec<AchievementRecord>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            achievements,
        }
    }

    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }
}

pub const EXPORT_VERSION: &str = "1.0";

/// Portable bundle written by `--export` and read back by `--import`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportData {
    pub stats: PlayerStats,
    pub achievements: Vec<AchievementRecord>,
    pub export_date: DateTime<Utc>,
    pub version: String,
}
