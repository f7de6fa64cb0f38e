use anyhow::{Result, bail};
use chrono::Utc;

use crate::engine::achievements::{self, Achievement, AchievementCategory, Catalog};
use crate::engine::player_stats::{PlayerPreferences, PlayerStats};
use crate::engine::scoring;
use crate::session::result::RoundSession;
use crate::store::json_store::JsonStore;
use crate::store::schema::{
    AchievementRecord, AchievementsData, EXPORT_VERSION, ExportData, PlayerStatsData,
};

/// What recording one round changed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordOutcome {
    /// False when the session id had already been recorded.
    pub applied: bool,
    pub unlocked: Vec<Achievement>,
    pub xp_gained: u64,
    pub level_up: Option<u32>,
}

/// Lifetime stats plus the achievement overlay, written through to disk after
/// every mutation when backed by a `JsonStore`.
pub struct ProgressionStore {
    stats: PlayerStats,
    achievements: Vec<Achievement>,
    store: Option<JsonStore>,
}

impl ProgressionStore {
    pub fn in_memory(catalog: &Catalog) -> Self {
        let mut this = Self {
            stats: PlayerStats::default(),
            achievements: merge_overlay(catalog, &[]),
            store: None,
        };
        this.refresh_progress();
        this
    }

    /// Load durable state. Missing, corrupt or outdated records start fresh.
    pub fn open(store: JsonStore, catalog: &Catalog) -> Self {
        if store.check_interrupted_save() {
            log::warn!("[STORE] recovered from an interrupted save");
        }

        let stats = match store.load_stats() {
            Some(data) if !data.needs_reset() => data.stats,
            Some(_) => {
                log::warn!("[STORE] player stats schema changed, starting fresh");
                PlayerStats::default()
            }
            None => {
                log::warn!("[STORE] player stats unreadable, starting fresh");
                PlayerStats::default()
            }
        };
        let records = match store.load_achievements() {
            Some(data) if !data.needs_reset() => data.achievements,
            Some(_) => {
                log::warn!("[STORE] achievement schema changed, starting fresh");
                Vec::new()
            }
            None => {
                log::warn!("[STORE] achievements unreadable, starting fresh");
                Vec::new()
            }
        };

        let mut this = Self {
            stats,
            achievements: merge_overlay(catalog, &records),
            store: Some(store),
        };
        this.sync_unlocked_ids();
        this.refresh_progress();
        log::info!(
            "[STORE] loaded: level {} with {} games and {}/{} achievements",
            this.stats.level,
            this.stats.total_games_played,
            this.unlocked().count(),
            this.achievements.len()
        );
        this
    }

    pub fn stats(&self) -> &PlayerStats {
        &self.stats
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    pub fn is_persistent(&self) -> bool {
        self.store.is_some()
    }

    /// Fold a finished round in, unlock what it earned, grant XP for each
    /// unlock, then persist. Recording the same session id twice is a no-op.
    pub fn record_session(&mut self, session: &RoundSession) -> RecordOutcome {
        if !self.stats.apply_session(session) {
            log::debug!("[STORE] session {} already recorded", session.id);
            return RecordOutcome::default();
        }

        let now = Utc::now();
        let mut unlocked = Vec::new();
        let mut xp_gained = 0;
        for idx in achievements::evaluate(&self.achievements, session, &self.stats) {
            let achievement = &mut self.achievements[idx];
            if self.stats.achievements.contains(&achievement.def.id) || !achievement.unlock(now) {
                continue;
            }
            let xp = scoring::achievement_xp(achievement.def.category);
            xp_gained += xp;
            self.stats.achievements.insert(achievement.def.id.clone());
            if let Some(reward) = &achievement.def.reward {
                self.stats
                    .unlocked_customizations
                    .insert(reward.item.clone());
            }
            log::info!(
                "[ACHIEVEMENT] unlocked {} (+{xp} XP)",
                achievement.def.id
            );
            unlocked.push(achievement.clone());
        }

        let level_up = self.stats.grant_experience(xp_gained);
        if let Some(level) = level_up {
            log::info!("[STORE] level up: {level}");
        }
        self.refresh_progress();
        self.persist();

        RecordOutcome {
            applied: true,
            unlocked,
            xp_gained,
            level_up,
        }
    }

    pub fn update_preferences(&mut self, update: impl FnOnce(&mut PlayerPreferences)) {
        update(&mut self.stats.preferences);
        self.persist();
    }

    /// Back to first-launch state; the durable records are removed.
    pub fn reset_player_data(&mut self) {
        self.stats = PlayerStats::default();
        for achievement in &mut self.achievements {
            *achievement = Achievement::locked(achievement.def.clone());
        }
        self.refresh_progress();
        if let Some(store) = &self.store
            && let Err(e) = store.clear()
        {
            log::error!("[STORE] failed to clear player data: {e:#}");
        }
        log::info!("[STORE] player data reset");
    }

    pub fn export_player_data(&self) -> Result<String> {
        let data = ExportData {
            stats: self.stats.clone(),
            achievements: self.records(),
            export_date: Utc::now(),
            version: EXPORT_VERSION.to_string(),
        };
        Ok(serde_json::to_string_pretty(&data)?)
    }

    /// Replace all progression with an exported bundle. On any error the
    /// current state is left as it was.
    pub fn import_player_data(&mut self, json: &str) -> Result<()> {
        let data: ExportData = serde_json::from_str(json)?;
        if data.version != EXPORT_VERSION {
            bail!(
                "Unsupported export version: {} (expected {})",
                data.version,
                EXPORT_VERSION
            );
        }

        let defs: Vec<_> = self.achievements.iter().map(|a| a.def.clone()).collect();
        let catalog = Catalog::new(defs)?;
        let mut imported = Self {
            stats: data.stats,
            achievements: merge_overlay(&catalog, &data.achievements),
            store: None,
        };
        imported.sync_unlocked_ids();
        imported.refresh_progress();

        if let Some(store) = &self.store {
            store.save_snapshot(
                &PlayerStatsData::new(imported.stats.clone()),
                &AchievementsData::new(imported.records()),
            )?;
        }
        self.stats = imported.stats;
        self.achievements = imported.achievements;
        log::info!("[STORE] imported player data");
        Ok(())
    }

    pub fn unlocked(&self) -> impl Iterator<Item = &Achievement> {
        self.achievements.iter().filter(|a| a.is_unlocked())
    }

    pub fn locked(&self) -> impl Iterator<Item = &Achievement> {
        self.achievements.iter().filter(|a| !a.is_unlocked())
    }

    pub fn by_category(&self, category: AchievementCategory) -> Vec<&Achievement> {
        self.achievements
            .iter()
            .filter(|a| a.def.category == category)
            .collect()
    }

    /// `(current, target)` for counter-based achievements.
    pub fn achievement_progress(&self, id: &str) -> Option<(u32, u32)> {
        let achievement = self.achievements.iter().find(|a| a.id() == id)?;
        Some((achievement.state.progress?, achievement.state.max_progress?))
    }

    fn records(&self) -> Vec<AchievementRecord> {
        self.achievements
            .iter()
            .map(|a| AchievementRecord {
                id: a.def.id.clone(),
                state: a.state.clone(),
            })
            .collect()
    }

    fn refresh_progress(&mut self) {
        for achievement in self.achievements.iter_mut().filter(|a| !a.is_unlocked()) {
            if let Some((current, target)) = achievements::progress(&achievement.def.condition, &self.stats) {
                achievement.state.progress = Some(current);
                achievement.state.max_progress = Some(target);
            }
        }
    }

    /// Align the stats id set and the overlay in both directions. The two
    /// files are recovered separately, so either side may have lost unlocks;
    /// an id known to either one stays unlocked and is never granted again.
    fn sync_unlocked_ids(&mut self) {
        let recorded_at = self.stats.last_play_date;
        for achievement in &mut self.achievements {
            if achievement.is_unlocked() {
                self.stats.achievements.insert(achievement.def.id.clone());
            } else if self.stats.achievements.contains(&achievement.def.id) {
                achievement.unlock(recorded_at);
                log::info!("[STORE] restored unlock of {}", achievement.def.id);
            }
        }
    }

    fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(e) = store.save_snapshot(
            &PlayerStatsData::new(self.stats.clone()),
            &AchievementsData::new(self.records()),
        ) {
            log::error!("[STORE] failed to save progression: {e:#}");
        }
    }
}

/// Catalog order wins; overlay records for ids no longer in the catalog are dropped.
fn merge_overlay(catalog: &Catalog, records: &[AchievementRecord]) -> Vec<Achievement> {
    catalog
        .entries()
        .iter()
        .map(|def| {
            let mut achievement = Achievement::locked(def.clone());
            if let Some(record) = records.iter().find(|r| r.id == def.id) {
                achievement.state = record.state.clone();
            }
            achievement
        })
        .collect()
}
