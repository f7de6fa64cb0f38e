use std::collections::{BTreeSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::scoring;
use crate::session::result::RoundSession;
use crate::session::round::Medal;
use crate::session::tier::{Tier, TimeOfDay};

/// Window of recent sessions used for the average-speed achievement.
pub const RECENT_WPM_WINDOW: usize = 20;
/// How many applied session ids are remembered to reject double application.
pub const RECENT_SESSION_IDS: usize = 100;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelStats {
    pub games_played: u32,
    pub games_completed: u32,
    pub best_wpm: u32,
    pub best_accuracy: u32,
    pub average_wpm: u32,
    pub average_accuracy: u32,
    pub total_time_spent: u64,
}

impl LevelStats {
    fn apply(&mut self, session: &RoundSession) {
        self.games_played += 1;
        if session.completed {
            self.games_completed += 1;
        }
        self.best_wpm = self.best_wpm.max(session.wpm);
        self.best_accuracy = self.best_accuracy.max(session.accuracy);
        self.total_time_spent += session.duration_secs;
        self.average_wpm = running_mean(self.average_wpm, session.wpm, self.games_played);
        self.average_accuracy =
            running_mean(self.average_accuracy, session.accuracy, self.games_played);
    }
}

/// `round((old * (n - 1) + sample) / n)`
fn running_mean(old: u32, sample: u32, n: u32) -> u32 {
    if n == 0 {
        return 0;
    }
    let total = old as f64 * (n - 1) as f64 + sample as f64;
    (total / n as f64).round() as u32
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDayPreference {
    #[default]
    Auto,
    Morning,
    Afternoon,
    Night,
}

impl TimeOfDayPreference {
    pub fn pinned(self) -> Option<TimeOfDay> {
        match self {
            TimeOfDayPreference::Auto => None,
            TimeOfDayPreference::Morning => Some(TimeOfDay::Morning),
            TimeOfDayPreference::Afternoon => Some(TimeOfDay::Afternoon),
            TimeOfDayPreference::Night => Some(TimeOfDay::Night),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerPreferences {
    pub selected_skin: String,
    pub selected_time_of_day: TimeOfDayPreference,
    pub sound_enabled: bool,
    pub particles_enabled: bool,
    pub reduced_motion: bool,
    pub color_blind_mode: bool,
}

impl Default for PlayerPreferences {
    fn default() -> Self {
        Self {
            selected_skin: "default".to_string(),
            selected_time_of_day: TimeOfDayPreference::Auto,
            sound_enabled: true,
            particles_enabled: true,
            reduced_motion: false,
            color_blind_mode: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStats {
    pub total_games_played: u32,
    pub total_games_completed: u32,
    pub total_characters_typed: u64,
    pub total_errors: u64,
    pub total_time_spent: u64,

    pub best_wpm: u32,
    pub best_accuracy: u32,
    /// Seconds of the quickest completed round, 0 until one exists.
    pub fastest_completion: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub gold_medals: u32,
    pub morning_games: u32,
    pub afternoon_games: u32,
    pub night_games: u32,
    pub recent_wpm: VecDeque<u32>,

    pub principiante_stats: LevelStats,
    pub intermedio_stats: LevelStats,
    pub avanzado_stats: LevelStats,

    pub level: u32,
    pub experience: u64,
    pub experience_to_next: u64,

    pub achievements: BTreeSet<String>,
    pub unlocked_customizations: BTreeSet<String>,
    pub preferences: PlayerPreferences,

    pub first_play_date: DateTime<Utc>,
    pub last_play_date: DateTime<Utc>,
    pub recent_session_ids: VecDeque<String>,
}

impl Default for PlayerStats {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            total_games_played: 0,
            total_games_completed: 0,
            total_characters_typed: 0,
            total_errors: 0,
            total_time_spent: 0,
            best_wpm: 0,
            best_accuracy: 0,
            fastest_completion: 0,
            current_streak: 0,
            longest_streak: 0,
            gold_medals: 0,
            morning_games: 0,
            afternoon_games: 0,
            night_games: 0,
            recent_wpm: VecDeque::new(),
            principiante_stats: LevelStats::default(),
            intermedio_stats: LevelStats::default(),
            avanzado_stats: LevelStats::default(),
            level: 1,
            experience: 0,
            experience_to_next: scoring::xp_for_level(1),
            achievements: BTreeSet::new(),
            unlocked_customizations: BTreeSet::from(["default".to_string()]),
            preferences: PlayerPreferences::default(),
            first_play_date: now,
            last_play_date: now,
            recent_session_ids: VecDeque::new(),
        }
    }
}

impl PlayerStats {
    pub fn tier_stats(&self, tier: Tier) -> &LevelStats {
        match tier {
            Tier::Principiante => &self.principiante_stats,
            Tier::Intermedio => &self.intermedio_stats,
            Tier::Avanzado => &self.avanzado_stats,
        }
    }

    fn tier_stats_mut(&mut self, tier: Tier) -> &mut LevelStats {
        match tier {
            Tier::Principiante => &mut self.principiante_stats,
            Tier::Intermedio => &mut self.intermedio_stats,
            Tier::Avanzado => &mut self.avanzado_stats,
        }
    }

    pub fn games_at(&self, time_of_day: TimeOfDay) -> u32 {
        match time_of_day {
            TimeOfDay::Morning => self.morning_games,
            TimeOfDay::Afternoon => self.afternoon_games,
            TimeOfDay::Night => self.night_games,
        }
    }

    pub fn has_applied(&self, session_id: &str) -> bool {
        self.recent_session_ids.iter().any(|id| id == session_id)
    }

    /// Fold a finished round into the counters. Returns false, leaving the
    /// stats untouched, if this session id was already applied.
    pub fn apply_session(&mut self, session: &RoundSession) -> bool {
        if self.has_applied(&session.id) {
            return false;
        }

        self.total_games_played += 1;
        if session.completed {
            self.total_games_completed += 1;
        }
        self.total_characters_typed += session.characters_typed as u64;
        self.total_errors += session.errors as u64;
        self.total_time_spent += session.duration_secs;

        self.best_wpm = self.best_wpm.max(session.wpm);
        self.best_accuracy = self.best_accuracy.max(session.accuracy);
        if session.completed
            && (self.fastest_completion == 0 || session.duration_secs < self.fastest_completion)
        {
            self.fastest_completion = session.duration_secs;
        }

        if session.completed {
            self.current_streak += 1;
            self.longest_streak = self.longest_streak.max(self.current_streak);
        } else {
            self.current_streak = 0;
        }
        if session.medal_earned == Some(Medal::Gold) {
            self.gold_medals += 1;
        }
        match session.time_of_day {
            TimeOfDay::Morning => self.morning_games += 1,
            TimeOfDay::Afternoon => self.afternoon_games += 1,
            TimeOfDay::Night => self.night_games += 1,
        }
        self.recent_wpm.push_back(session.wpm);
        while self.recent_wpm.len() > RECENT_WPM_WINDOW {
            self.recent_wpm.pop_front();
        }

        self.tier_stats_mut(session.tier).apply(session);

        self.recent_session_ids.push_back(session.id.clone());
        while self.recent_session_ids.len() > RECENT_SESSION_IDS {
            self.recent_session_ids.pop_front();
        }

        self.last_play_date = Utc::now();
        true
    }

    /// Add XP and recompute level from the total. Returns the new level on level-up.
    pub fn grant_experience(&mut self, xp: u64) -> Option<u32> {
        let before = self.level;
        self.experience += xp;
        self.level = scoring::level_from_xp(self.experience);
        self.experience_to_next = scoring::xp_to_next_level(self.experience);
        (self.level > before).then_some(self.level)
    }

    /// Mean WPM over the most recent `games` sessions, if that many exist.
    pub fn recent_average_wpm(&self, games: usize) -> Option<u32> {
        if games == 0 || self.recent_wpm.len() < games {
            return None;
        }
        let sum: u64 = self.recent_wpm.iter().rev().take(games).map(|&w| w as u64).sum();
        Some((sum as f64 / games as f64).round() as u32)
    }
}
