use crate::engine::achievements::AchievementCategory;

const BASE_LEVEL_XP: f64 = 1000.0;
const LEVEL_XP_GROWTH: f64 = 1.5;

/// XP needed to go from `level` to `level + 1`.
pub fn xp_for_level(level: u32) -> u64 {
    let exponent = level.max(1) as i32 - 1;
    (BASE_LEVEL_XP * LEVEL_XP_GROWTH.powi(exponent)).floor() as u64
}

/// Level reached with `experience` total XP, derived from scratch.
pub fn level_from_xp(experience: u64) -> u32 {
    let mut level = 1;
    let mut spent = 0u64;
    loop {
        let required = xp_for_level(level);
        if spent + required > experience {
            return level;
        }
        spent += required;
        level += 1;
    }
}

/// Cumulative XP at which `level` is reached (level 1 starts at 0).
pub fn xp_threshold(level: u32) -> u64 {
    (1..level.max(1)).map(xp_for_level).sum()
}

pub fn xp_to_next_level(experience: u64) -> u64 {
    let level = level_from_xp(experience);
    xp_threshold(level + 1) - experience
}

pub fn achievement_xp(category: AchievementCategory) -> u64 {
    match category {
        AchievementCategory::Speed => 100,
        AchievementCategory::Accuracy => 150,
        AchievementCategory::Endurance => 200,
        AchievementCategory::Consistency => 175,
        AchievementCategory::Exploration => 125,
        AchievementCategory::Master => 300,
        AchievementCategory::Special => 250,
    }
}
