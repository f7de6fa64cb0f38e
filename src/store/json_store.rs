use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Result, bail};

use crate::store::schema::{AchievementsData, PlayerStatsData};

const STATS_FILE: &str = "typing_frog_player_stats.json";
const ACHIEVEMENTS_FILE: &str = "typing_frog_achievements.json";

pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("typefrog");
        Self::with_base_dir(base_dir)
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    /// Missing file is a fresh default; a file that exists but does not parse
    /// (corruption, schema mismatch) is `None`.
    fn load<T: serde::de::DeserializeOwned + Default>(&self, name: &str) -> Option<T> {
        let path = self.file_path(name);
        if path.exists() {
            let content = fs::read_to_string(&path).ok()?;
            serde_json::from_str(&content).ok()
        } else {
            Some(T::default())
        }
    }

    fn save<T: serde::Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    pub fn load_stats(&self) -> Option<PlayerStatsData> {
        self.load(STATS_FILE)
    }

    pub fn save_stats(&self, data: &PlayerStatsData) -> Result<()> {
        self.save(STATS_FILE, data)
    }

    pub fn load_achievements(&self) -> Option<AchievementsData> {
        self.load(ACHIEVEMENTS_FILE)
    }

    pub fn save_achievements(&self, data: &AchievementsData) -> Result<()> {
        self.save(ACHIEVEMENTS_FILE, data)
    }

    /// Write both records as one unit: two-phase commit with best-effort .bak rollback.
    ///
    /// Stage phase: write both files to .tmp. If either fails, clean up and bail.
    /// Commit phase: for each file, rename original to .bak, then .tmp to final.
    /// On commit failure, restore .bak files and clean up .tmp files.
    /// After success, delete .bak files.
    pub fn save_snapshot(&self, stats: &PlayerStatsData, achievements: &AchievementsData) -> Result<()> {
        let files: [(&str, String); 2] = [
            (STATS_FILE, serde_json::to_string_pretty(stats)?),
            (ACHIEVEMENTS_FILE, serde_json::to_string_pretty(achievements)?),
        ];

        let mut staged: Vec<PathBuf> = Vec::new();
        for (name, json) in &files {
            let tmp_path = self.file_path(name).with_extension("json.tmp");
            match (|| -> Result<()> {
                let mut file = fs::File::create(&tmp_path)?;
                file.write_all(json.as_bytes())?;
                file.sync_all()?;
                Ok(())
            })() {
                Ok(()) => staged.push(tmp_path),
                Err(e) => {
                    for tmp in &staged {
                        let _ = fs::remove_file(tmp);
                    }
                    bail!("Save failed during staging: {e}");
                }
            }
        }

        // (final_path, bak_path, had_original)
        let mut committed: Vec<(PathBuf, PathBuf, bool)> = Vec::new();
        for (i, (name, _)) in files.iter().enumerate() {
            let final_path = self.file_path(name);
            let bak_path = final_path.with_extension("json.bak");
            let had_original = final_path.exists();

            if had_original && let Err(e) = fs::rename(&final_path, &bak_path) {
                rollback(&committed);
                for tmp in &staged {
                    let _ = fs::remove_file(tmp);
                }
                bail!("Save failed during commit (backup): {e}");
            }

            if let Err(e) = fs::rename(&staged[i], &final_path) {
                if had_original && bak_path.exists() {
                    let _ = fs::rename(&bak_path, &final_path);
                }
                rollback(&committed);
                for tmp in &staged[i..] {
                    let _ = fs::remove_file(tmp);
                }
                bail!("Save failed during commit (rename): {e}");
            }

            committed.push((final_path, bak_path, had_original));
        }

        for (_, bak_path, had_original) in &committed {
            if *had_original {
                let _ = fs::remove_file(bak_path);
            }
        }
        Ok(())
    }

    /// Remove both durable records. Missing files are fine.
    pub fn clear(&self) -> Result<()> {
        for name in [STATS_FILE, ACHIEVEMENTS_FILE] {
            let path = self.file_path(name);
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    /// Check for leftover .bak files from an interrupted save.
    /// Returns true if recovery files were found (and cleaned up).
    pub fn check_interrupted_save(&self) -> bool {
        let mut found = false;
        for name in [STATS_FILE, ACHIEVEMENTS_FILE] {
            let bak_path = self.file_path(name).with_extension("json.bak");
            if bak_path.exists() {
                found = true;
                // The final file may be gone if the crash hit between the two renames.
                let final_path = self.file_path(name);
                if final_path.exists() {
                    let _ = fs::remove_file(&bak_path);
                } else {
                    let _ = fs::rename(&bak_path, &final_path);
                }
            }
        }
        found
    }
}

fn rollback(committed: &[(PathBuf, PathBuf, bool)]) {
    for (final_path, bak_path, had_original) in committed {
        if *had_original {
            let _ = fs::rename(bak_path, final_path);
        } else {
            let _ = fs::remove_file(final_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::achievements::UnlockState;
    use crate::engine::player_stats::PlayerStats;
    use crate::store::schema::AchievementRecord;
    use tempfile::TempDir;

    fn make_test_store() -> (TempDir, JsonStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    fn unlocked_record(id: &str) -> AchievementRecord {
        AchievementRecord {
            id: id.to_string(),
            state: UnlockState {
                unlocked: true,
                unlocked_at: Some(chrono::Utc::now()),
                ..UnlockState::default()
            },
        }
    }

    #[test]
    fn test_missing_files_load_as_defaults() {
        let (_dir, store) = make_test_store();
        let stats = store.load_stats().unwrap();
        assert!(!stats.needs_reset());
        assert_eq!(stats.stats.total_games_played, 0);
        assert!(store.load_achievements().unwrap().achievements.is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_as_none() {
        let (_dir, store) = make_test_store();
        fs::write(store.file_path(STATS_FILE), "{ definitely not json").unwrap();
        assert!(store.load_stats().is_none());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let (_dir, store) = make_test_store();
        let mut stats = PlayerStats::default();
        stats.total_games_played = 7;
        stats.achievements.insert("first_steps".to_string());
        let achievements = AchievementsData::new(vec![unlocked_record("first_steps")]);

        store
            .save_snapshot(&PlayerStatsData::new(stats.clone()), &achievements)
            .unwrap();

        let loaded = store.load_stats().unwrap();
        assert_eq!(loaded.stats.total_games_played, 7);
        assert_eq!(loaded.stats.first_play_date, stats.first_play_date);
        assert_eq!(store.load_achievements().unwrap(), achievements);
        assert!(!store.file_path("typing_frog_player_stats.json.bak").exists());
    }

    #[test]
    fn test_snapshot_overwrites_previous() {
        let (_dir, store) = make_test_store();
        let mut stats = PlayerStats::default();
        store
            .save_snapshot(&PlayerStatsData::new(stats.clone()), &AchievementsData::default())
            .unwrap();
        stats.total_games_played = 3;
        store
            .save_snapshot(&PlayerStatsData::new(stats), &AchievementsData::default())
            .unwrap();
        assert_eq!(store.load_stats().unwrap().stats.total_games_played, 3);
    }

    #[test]
    fn test_staging_failure_preserves_originals() {
        let (dir, store) = make_test_store();
        let mut stats = PlayerStats::default();
        stats.total_games_played = 42;
        store
            .save_snapshot(&PlayerStatsData::new(stats), &AchievementsData::default())
            .unwrap();
        let original = fs::read_to_string(store.file_path(STATS_FILE)).unwrap();

        let bad_dir = dir.path().join("nonexistent_subdir");
        let bad_store = JsonStore {
            base_dir: bad_dir.clone(),
        };
        let result = bad_store.save_snapshot(&PlayerStatsData::default(), &AchievementsData::default());
        assert!(result.unwrap_err().to_string().contains("Save failed during staging"));

        assert_eq!(fs::read_to_string(store.file_path(STATS_FILE)).unwrap(), original);
        assert!(!bad_dir.exists());
    }

    #[test]
    fn test_clear_removes_records() {
        let (_dir, store) = make_test_store();
        store
            .save_snapshot(&PlayerStatsData::default(), &AchievementsData::default())
            .unwrap();
        store.clear().unwrap();
        assert!(!store.file_path(STATS_FILE).exists());
        assert!(!store.file_path(ACHIEVEMENTS_FILE).exists());
        store.clear().unwrap();
    }

    #[test]
    fn test_check_interrupted_save_restores_lost_file() {
        let (_dir, store) = make_test_store();
        assert!(!store.check_interrupted_save());

        fs::write(store.file_path("typing_frog_achievements.json.bak"), "{}").unwrap();
        assert!(store.check_interrupted_save());
        assert!(store.file_path(ACHIEVEMENTS_FILE).exists());
        assert!(!store.file_path("typing_frog_achievements.json.bak").exists());
    }
}
