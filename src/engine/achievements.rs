use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_embed::Embed;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::player_stats::PlayerStats;
use crate::session::result::RoundSession;
use crate::session::tier::{Tier, TimeOfDay};

#[derive(Embed)]
#[folder = "assets/catalog/"]
struct CatalogAssets;

const CATALOG_FILE: &str = "achievements.toml";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    Speed,
    Accuracy,
    Endurance,
    Consistency,
    Exploration,
    Master,
    Special,
}

impl AchievementCategory {
    pub fn all() -> &'static [AchievementCategory] {
        &[
            AchievementCategory::Speed,
            AchievementCategory::Accuracy,
            AchievementCategory::Endurance,
            AchievementCategory::Consistency,
            AchievementCategory::Exploration,
            AchievementCategory::Master,
            AchievementCategory::Special,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            AchievementCategory::Speed => "Velocidad",
            AchievementCategory::Accuracy => "Precisi\u{f3}n",
            AchievementCategory::Endurance => "Resistencia",
            AchievementCategory::Consistency => "Consistencia",
            AchievementCategory::Exploration => "Exploraci\u{f3}n",
            AchievementCategory::Master => "Maestr\u{ed}a",
            AchievementCategory::Special => "Especiales",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
}

impl Operator {
    pub fn compare(self, actual: u32, target: u32) -> bool {
        match self {
            Operator::Eq => actual == target,
            Operator::Gt => actual > target,
            Operator::Ge => actual >= target,
            Operator::Lt => actual < target,
            Operator::Le => actual <= target,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMetric {
    Wpm,
    Accuracy,
    FirstCompletion,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalMetric {
    GamesPlayed,
    GamesCompleted,
    GoldMedals,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakMetric {
    WinStreak,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialMetric {
    AllLevelsCompleted,
    AllTimesPlayed,
    NightGames,
    MorningGames,
    PerfectBeginnerGame,
    AverageWpmGames,
    SecretCondition,
}

/// Unlock rule of a catalog entry, one variant per evaluation strategy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AchievementCondition {
    SingleGame {
        metric: SessionMetric,
        operator: Operator,
        value: u32,
    },
    TotalGames {
        metric: TotalMetric,
        operator: Operator,
        value: u32,
    },
    Streak {
        metric: StreakMetric,
        operator: Operator,
        value: u32,
    },
    Special {
        metric: SpecialMetric,
        operator: Operator,
        value: u32,
        #[serde(default)]
        min_games: Option<u32>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardKind {
    Cosmetic,
    Unlock,
    Title,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AchievementReward {
    pub kind: RewardKind,
    pub item: String,
    pub description: String,
}

/// Static catalog entry. Immutable at runtime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AchievementDef {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub icon: String,
    pub category: AchievementCategory,
    pub condition: AchievementCondition,
    #[serde(default)]
    pub reward: Option<AchievementReward>,
    #[serde(default)]
    pub secret: bool,
}

/// Mutable overlay joined onto a catalog entry. `unlocked` only ever goes false -> true.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UnlockState {
    pub unlocked: bool,
    #[serde(default)]
    pub unlocked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub progress: Option<u32>,
    #[serde(default)]
    pub max_progress: Option<u32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Achievement {
    pub def: AchievementDef,
    pub state: UnlockState,
}

impl Achievement {
    pub fn locked(def: AchievementDef) -> Self {
        Self {
            def,
            state: UnlockState::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.def.id
    }

    pub fn is_unlocked(&self) -> bool {
        self.state.unlocked
    }

    /// Secret entries stay masked until unlocked.
    pub fn is_hidden(&self) -> bool {
        self.def.secret && !self.state.unlocked
    }

    pub fn display_name(&self) -> &str {
        if self.is_hidden() { "???" } else { &self.def.name }
    }

    pub fn display_description(&self) -> &str {
        if self.is_hidden() {
            "Logro secreto"
        } else {
            &self.def.description
        }
    }

    /// Latch the unlock. Returns false if it was already unlocked.
    pub fn unlock(&mut self, at: DateTime<Utc>) -> bool {
        if self.state.unlocked {
            return false;
        }
        self.state.unlocked = true;
        self.state.unlocked_at = Some(at);
        if let Some(max) = self.state.max_progress {
            self.state.progress = Some(max);
        }
        true
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("achievement catalog asset '{0}' is missing")]
    Missing(&'static str),
    #[error("achievement catalog is not valid UTF-8")]
    Encoding,
    #[error("achievement catalog does not parse: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("achievement with empty id")]
    EmptyId,
    #[error("duplicate achievement id '{0}'")]
    DuplicateId(String),
    #[error("achievement '{0}': average_wpm_games needs a positive min_games")]
    MissingMinGames(String),
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(rename = "achievement", default)]
    achievements: Vec<AchievementDef>,
}

/// The validated, ordered list of achievement definitions.
#[derive(Clone, Debug)]
pub struct Catalog {
    entries: Vec<AchievementDef>,
}

impl Catalog {
    pub fn load_embedded() -> Result<Self, CatalogError> {
        let file = CatalogAssets::get(CATALOG_FILE).ok_or(CatalogError::Missing(CATALOG_FILE))?;
        let content = std::str::from_utf8(file.data.as_ref()).map_err(|_| CatalogError::Encoding)?;
        Self::from_toml(content)
    }

    pub fn from_toml(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(content)?;
        Self::new(file.achievements)
    }

    pub fn new(entries: Vec<AchievementDef>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for def in &entries {
            if def.id.trim().is_empty() {
                return Err(CatalogError::EmptyId);
            }
            if !seen.insert(def.id.as_str()) {
                return Err(CatalogError::DuplicateId(def.id.clone()));
            }
            if let AchievementCondition::Special {
                metric: SpecialMetric::AverageWpmGames,
                min_games,
                ..
            } = def.condition
                && min_games.unwrap_or(0) == 0
            {
                return Err(CatalogError::MissingMinGames(def.id.clone()));
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[AchievementDef] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&AchievementDef> {
        self.entries.iter().find(|d| d.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whether `condition` holds for a just-finished session and the stats after it.
///
/// Metrics without a tracked counter evaluate to false.
pub fn condition_met(
    condition: &AchievementCondition,
    session: &RoundSession,
    stats: &PlayerStats,
) -> bool {
    match *condition {
        AchievementCondition::SingleGame {
            metric,
            operator,
            value,
        } => match metric {
            SessionMetric::Wpm => operator.compare(session.wpm, value),
            SessionMetric::Accuracy => operator.compare(session.accuracy, value),
            SessionMetric::FirstCompletion => session.completed,
        },
        AchievementCondition::TotalGames {
            metric,
            operator,
            value,
        } => operator.compare(total_metric(metric, stats), value),
        AchievementCondition::Streak {
            metric: StreakMetric::WinStreak,
            operator,
            value,
        } => operator.compare(stats.longest_streak, value),
        AchievementCondition::Special {
            metric,
            operator,
            value,
            min_games,
        } => match metric {
            SpecialMetric::AllLevelsCompleted => Tier::all()
                .iter()
                .all(|&t| stats.tier_stats(t).games_completed > 0),
            SpecialMetric::AllTimesPlayed => [TimeOfDay::Morning, TimeOfDay::Afternoon, TimeOfDay::Night]
                .iter()
                .all(|&t| stats.games_at(t) > 0),
            SpecialMetric::NightGames => operator.compare(stats.night_games, value),
            SpecialMetric::MorningGames => operator.compare(stats.morning_games, value),
            SpecialMetric::PerfectBeginnerGame => {
                session.tier == Tier::Principiante && session.errors == 0 && session.completed
            }
            SpecialMetric::AverageWpmGames => min_games
                .and_then(|n| stats.recent_average_wpm(n as usize))
                .is_some_and(|avg| operator.compare(avg, value)),
            SpecialMetric::SecretCondition => false,
        },
    }
}

fn total_metric(metric: TotalMetric, stats: &PlayerStats) -> u32 {
    match metric {
        TotalMetric::GamesPlayed => stats.total_games_played,
        TotalMetric::GamesCompleted => stats.total_games_completed,
        TotalMetric::GoldMedals => stats.gold_medals,
    }
}

/// Counter progress toward a cumulative condition, as `(current, target)`.
pub fn progress(condition: &AchievementCondition, stats: &PlayerStats) -> Option<(u32, u32)> {
    match *condition {
        AchievementCondition::TotalGames { metric, value, .. } => {
            Some((total_metric(metric, stats).min(value), value))
        }
        AchievementCondition::Streak { value, .. } => Some((stats.longest_streak.min(value), value)),
        AchievementCondition::Special {
            metric: SpecialMetric::NightGames,
            value,
            ..
        } => Some((stats.night_games.min(value), value)),
        AchievementCondition::Special {
            metric: SpecialMetric::MorningGames,
            value,
            ..
        } => Some((stats.morning_games.min(value), value)),
        _ => None,
    }
}

/// Indices of achievements that go from locked to unlocked because of `session`.
///
/// Already-unlocked entries are skipped, so evaluating the same session twice
/// after applying the first result yields nothing new.
pub fn evaluate(
    achievements: &[Achievement],
    session: &RoundSession,
    stats_after: &PlayerStats,
) -> Vec<usize> {
    achievements
        .iter()
        .enumerate()
        .filter(|(_, a)| !a.is_unlocked())
        .filter(|(_, a)| condition_met(&a.def.condition, session, stats_after))
        .map(|(i, _)| i)
        .collect()
}
