use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::round::Medal;
use crate::session::tier::{Tier, TimeOfDay};

/// Immutable summary of a concluded round, the unit handed to progression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundSession {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub tier: Tier,
    pub time_of_day: TimeOfDay,
    pub duration_secs: u64,
    pub characters_typed: u32,
    pub errors: u32,
    pub accuracy: u32,
    pub wpm: u32,
    pub completed: bool,
    #[serde(default)]
    pub medal_earned: Option<Medal>,
    #[serde(default)]
    pub achievements_unlocked: Vec<String>,
}

/// Raw figures of a finished round, before rounding.
pub struct RoundFigures {
    pub correct_chars: u32,
    pub errors: u32,
    pub elapsed_secs: f64,
    pub completed: bool,
    pub medal: Option<Medal>,
}

impl RoundSession {
    pub fn from_round(
        id: String,
        started_at: DateTime<Utc>,
        tier: Tier,
        time_of_day: TimeOfDay,
        figures: &RoundFigures,
    ) -> Self {
        Self {
            id,
            started_at,
            tier,
            time_of_day,
            duration_secs: figures.elapsed_secs.max(0.0).round() as u64,
            characters_typed: figures.correct_chars,
            errors: figures.errors,
            accuracy: accuracy_percent(figures.correct_chars, figures.errors),
            wpm: words_per_minute(figures.correct_chars, figures.elapsed_secs),
            completed: figures.completed,
            medal_earned: figures.medal,
            achievements_unlocked: Vec::new(),
        }
    }
}

/// `round(correct / (correct + errors) * 100)`, 0 when nothing was attempted.
pub fn accuracy_percent(correct: u32, errors: u32) -> u32 {
    let attempted = correct + errors;
    if attempted == 0 {
        return 0;
    }
    (correct as f64 / attempted as f64 * 100.0).round() as u32
}

/// Five characters make a word.
pub fn words_per_minute(correct: u32, elapsed_secs: f64) -> u32 {
    if elapsed_secs < 0.1 {
        return 0;
    }
    ((correct as f64 / 5.0) / (elapsed_secs / 60.0)).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_zero_when_nothing_attempted() {
        assert_eq!(accuracy_percent(0, 0), 0);
    }

    #[test]
    fn test_accuracy_rounds_half_up() {
        assert_eq!(accuracy_percent(10, 0), 100);
        assert_eq!(accuracy_percent(2, 1), 67);
        assert_eq!(accuracy_percent(1, 3), 25);
    }

    #[test]
    fn test_wpm_from_correct_chars() {
        // 50 chars = 10 words in 30s -> 20 WPM
        assert_eq!(words_per_minute(50, 30.0), 20);
        assert_eq!(words_per_minute(50, 0.0), 0);
    }

    #[test]
    fn test_from_round_rounds_duration() {
        let figures = RoundFigures {
            correct_chars: 25,
            errors: 0,
            elapsed_secs: 14.6,
            completed: true,
            medal: Some(Medal::Gold),
        };
        let session = RoundSession::from_round(
            "game_1".to_string(),
            Utc::now(),
            Tier::Principiante,
            TimeOfDay::Morning,
            &figures,
        );
        assert_eq!(session.duration_secs, 15);
        assert_eq!(session.accuracy, 100);
        assert_eq!(session.wpm, 21);
        assert!(session.achievements_unlocked.is_empty());
    }

    #[test]
    fn test_session_dates_round_trip_as_iso8601() {
        let figures = RoundFigures {
            correct_chars: 5,
            errors: 1,
            elapsed_secs: 3.0,
            completed: false,
            medal: None,
        };
        let session = RoundSession::from_round(
            "game_2".to_string(),
            Utc::now(),
            Tier::Avanzado,
            TimeOfDay::Night,
            &figures,
        );
        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains("\"tier\":\"avanzado\""));
        let back: RoundSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }
}
