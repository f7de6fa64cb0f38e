use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::engine::achievements::Achievement;
use crate::generator::TextSource;
use crate::session::clock::RoundClock;
use crate::session::input::{self, CharStatus, CharacterCell};
use crate::session::result::{RoundFigures, RoundSession};
use crate::session::tier::{Tier, TimeOfDay};
use crate::store::progression::ProgressionStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    /// Fixed thresholds on lives left: 3+ gold, 2 silver, 1 bronze, 0 nothing.
    pub fn from_lives(lives: u32) -> Option<Medal> {
        match lives {
            0 => None,
            1 => Some(Medal::Bronze),
            2 => Some(Medal::Silver),
            _ => Some(Medal::Gold),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Medal::Gold => "Oro",
            Medal::Silver => "Plata",
            Medal::Bronze => "Bronce",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Medal::Gold => "\u{1f947}",
            Medal::Silver => "\u{1f948}",
            Medal::Bronze => "\u{1f949}",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndCause {
    Completed,
    Lives,
    Time,
}

impl EndCause {
    pub fn title(self) -> &'static str {
        match self {
            EndCause::Completed => "\u{a1}Texto completado!",
            EndCause::Lives => "Sin vidas",
            EndCause::Time => "Tiempo agotado",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundPhase {
    Idle,
    Playing,
    /// Round has ended; the summary is held until the end animation delay passes.
    Terminating(EndCause),
    GameOver(EndCause),
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoundStats {
    pub lives: u32,
    /// `None` in the untimed variant.
    pub time_remaining: Option<u32>,
    pub current_position: usize,
    pub correct_chars: u32,
    pub errors: u32,
    pub medal: Option<Medal>,
}

impl RoundStats {
    fn fresh(config: &RoundConfig) -> Self {
        Self {
            lives: config.max_lives,
            time_remaining: config.time_limit,
            current_position: 0,
            correct_chars: 0,
            errors: 0,
            medal: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoundConfig {
    pub max_lives: u32,
    pub time_limit: Option<u32>,
    pub death_delay: Duration,
    pub victory_delay: Duration,
    pub time_of_day_cycle: u32,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for RoundConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_lives: config.max_lives,
            time_limit: config.time_limit(),
            death_delay: Duration::from_millis(config.death_delay_ms),
            victory_delay: Duration::from_millis(config.victory_delay_ms),
            time_of_day_cycle: config.time_of_day_cycle_secs.max(1),
        }
    }
}

/// Discrete notifications for presentation. Drained with `GameEngine::drain_events`.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    CharJudged { position: usize, status: CharStatus },
    LifeLost { lives_left: u32 },
    RoundCompleted(RoundSession),
    AchievementUnlocked(Achievement),
    LevelUp(u32),
}

/// Read-only view of everything a frame needs.
pub struct Snapshot<'a> {
    pub phase: RoundPhase,
    pub stats: &'a RoundStats,
    pub cells: &'a [CharacterCell],
    pub tier: Tier,
    pub time_of_day: TimeOfDay,
    pub player_level: u32,
    pub medal: Option<Medal>,
}

struct PendingSummary {
    session: RoundSession,
    cause: EndCause,
    deadline: Instant,
}

/// Owns one round at a time and feeds finished rounds into progression.
///
/// Every input (keys, clock ticks, start, reset, advance) goes through `&mut self`,
/// so the caller's event loop serializes them.
pub struct GameEngine {
    config: RoundConfig,
    texts: Box<dyn TextSource>,
    clock: Box<dyn RoundClock>,
    progression: ProgressionStore,
    phase: RoundPhase,
    tier: Tier,
    time_of_day: TimeOfDay,
    cells: Vec<CharacterCell>,
    stats: RoundStats,
    round_id: u64,
    session_id: String,
    started_at: DateTime<Utc>,
    started: Instant,
    ticks: u32,
    pending: Option<PendingSummary>,
    last_session: Option<RoundSession>,
    events: Vec<GameEvent>,
    rng: SmallRng,
}

impl GameEngine {
    pub fn new(
        config: RoundConfig,
        texts: Box<dyn TextSource>,
        clock: Box<dyn RoundClock>,
        progression: ProgressionStore,
    ) -> Self {
        let stats = RoundStats::fresh(&config);
        Self {
            config,
            texts,
            clock,
            progression,
            phase: RoundPhase::Idle,
            tier: Tier::default(),
            time_of_day: TimeOfDay::for_tier(Tier::default()),
            cells: Vec::new(),
            stats,
            round_id: 0,
            session_id: String::new(),
            started_at: Utc::now(),
            started: Instant::now(),
            ticks: 0,
            pending: None,
            last_session: None,
            events: Vec::new(),
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn stats(&self) -> &RoundStats {
        &self.stats
    }

    pub fn cells(&self) -> &[CharacterCell] {
        &self.cells
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn time_of_day(&self) -> TimeOfDay {
        self.time_of_day
    }

    pub fn round_id(&self) -> u64 {
        self.round_id
    }

    pub fn progression(&self) -> &ProgressionStore {
        &self.progression
    }

    pub fn progression_mut(&mut self) -> &mut ProgressionStore {
        &mut self.progression
    }

    /// Summary of the most recently recorded round.
    pub fn last_session(&self) -> Option<&RoundSession> {
        self.last_session.as_ref()
    }

    pub fn texts_ready(&mut self) -> bool {
        self.texts.is_ready()
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            phase: self.phase,
            stats: &self.stats,
            cells: &self.cells,
            tier: self.tier,
            time_of_day: self.time_of_day,
            player_level: self.progression.stats().level,
            medal: self.stats.medal,
        }
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Words per minute so far in the running round.
    pub fn live_wpm(&self) -> u32 {
        match self.phase {
            RoundPhase::Playing => crate::session::result::words_per_minute(
                self.stats.correct_chars,
                self.started.elapsed().as_secs_f64(),
            ),
            _ => self.last_session.as_ref().map_or(0, |s| s.wpm),
        }
    }

    /// Begin a round on `tier`. Returns false, changing nothing, while texts are
    /// still loading. A round still waiting out its end delay is recorded first.
    pub fn start_round(&mut self, tier: Tier) -> bool {
        if !self.texts.is_ready() {
            log::debug!("[ROUND] start ignored: texts not ready");
            return false;
        }
        self.flush_pending();
        self.clock.stop();

        let text = self.texts.random_text(tier);
        self.cells = input::seed_cells(&text);
        self.tier = tier;
        self.stats = RoundStats::fresh(&self.config);
        self.time_of_day = self
            .progression
            .stats()
            .preferences
            .selected_time_of_day
            .pinned()
            .unwrap_or_else(|| TimeOfDay::for_tier(tier));
        self.ticks = 0;
        self.round_id += 1;
        self.session_id = self.new_session_id();
        self.started_at = Utc::now();
        self.started = Instant::now();
        self.phase = RoundPhase::Playing;

        if self.cells.is_empty() {
            // Nothing to type counts as done.
            self.terminate(EndCause::Completed);
            return true;
        }

        self.clock.start(self.round_id);
        log::info!(
            "[ROUND] #{} started: tier={} chars={} lives={} time={:?}",
            self.round_id,
            tier,
            self.cells.len(),
            self.stats.lives,
            self.stats.time_remaining
        );
        true
    }

    /// Judge one typed character. Control characters and keys outside a running
    /// round are ignored.
    pub fn key_press(&mut self, ch: char) {
        if self.phase != RoundPhase::Playing || !input::is_typeable(ch) {
            return;
        }
        let position = self.stats.current_position;
        let Some(judgement) = input::judge_cell(&mut self.cells, position, ch) else {
            return;
        };
        self.events.push(GameEvent::CharJudged {
            position,
            status: judgement.new_status,
        });

        if judgement.matched {
            self.stats.current_position += 1;
            self.stats.correct_chars += 1;
            if self.stats.current_position == self.cells.len() {
                self.terminate(EndCause::Completed);
            }
        } else {
            self.stats.lives = self.stats.lives.saturating_sub(1);
            self.stats.errors += 1;
            self.events.push(GameEvent::LifeLost {
                lives_left: self.stats.lives,
            });
            if self.stats.lives == 0 {
                self.terminate(EndCause::Lives);
            }
        }
    }

    /// Apply one clock tick. Ticks for another round, or outside play, are stale.
    pub fn clock_tick(&mut self, round_id: u64) {
        if self.phase != RoundPhase::Playing || round_id != self.round_id {
            return;
        }
        self.ticks += 1;
        if self
            .progression
            .stats()
            .preferences
            .selected_time_of_day
            .pinned()
            .is_none()
            && self.ticks % self.config.time_of_day_cycle.max(1) == 0
        {
            self.time_of_day = self.time_of_day.next();
        }

        if let Some(remaining) = self.stats.time_remaining {
            let remaining = remaining.saturating_sub(1);
            self.stats.time_remaining = Some(remaining);
            if remaining == 0 {
                self.terminate(EndCause::Time);
            }
        }
    }

    /// Finish a terminating round once its delay has passed.
    pub fn advance(&mut self, now: Instant) {
        if let Some(pending) = &self.pending
            && now >= pending.deadline
        {
            self.flush_pending();
        }
    }

    /// Abort or leave a round. A summary still waiting is recorded once; the
    /// round itself takes no further events.
    pub fn reset(&mut self) {
        self.clock.stop();
        self.flush_pending();
        if self.phase == RoundPhase::Playing {
            log::info!("[ROUND] #{} aborted", self.round_id);
        }
        self.phase = RoundPhase::Idle;
        self.cells.clear();
        self.stats = RoundStats::fresh(&self.config);
    }

    fn terminate(&mut self, cause: EndCause) {
        self.clock.stop();
        let medal = Medal::from_lives(self.stats.lives);
        self.stats.medal = medal;

        let figures = RoundFigures {
            correct_chars: self.stats.correct_chars,
            errors: self.stats.errors,
            elapsed_secs: self.started.elapsed().as_secs_f64(),
            completed: cause == EndCause::Completed,
            medal,
        };
        let session = RoundSession::from_round(
            self.session_id.clone(),
            self.started_at,
            self.tier,
            self.time_of_day,
            &figures,
        );
        let delay = match cause {
            EndCause::Completed => self.config.victory_delay,
            EndCause::Lives | EndCause::Time => self.config.death_delay,
        };
        log::info!(
            "[ROUND] #{} ended ({cause:?}): wpm={} accuracy={}% medal={:?}",
            self.round_id,
            session.wpm,
            session.accuracy,
            medal
        );
        self.pending = Some(PendingSummary {
            session,
            cause,
            deadline: Instant::now() + delay,
        });
        self.phase = RoundPhase::Terminating(cause);
    }

    fn flush_pending(&mut self) {
        let Some(PendingSummary { mut session, cause, .. }) = self.pending.take() else {
            return;
        };
        let outcome = self.progression.record_session(&session);
        session.achievements_unlocked = outcome.unlocked.iter().map(|a| a.def.id.clone()).collect();

        self.events.push(GameEvent::RoundCompleted(session.clone()));
        for achievement in outcome.unlocked {
            self.events.push(GameEvent::AchievementUnlocked(achievement));
        }
        if let Some(level) = outcome.level_up {
            self.events.push(GameEvent::LevelUp(level));
        }
        self.last_session = Some(session);
        if matches!(self.phase, RoundPhase::Terminating(_)) {
            self.phase = RoundPhase::GameOver(cause);
        }
    }

    fn new_session_id(&mut self) -> String {
        let suffix: String = (&mut self.rng)
            .sample_iter(&Alphanumeric)
            .take(9)
            .map(|b| (b as char).to_ascii_lowercase())
            .collect();
        format!("game_{}_{suffix}", Utc::now().timestamp_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::achievements::Catalog;
    use crate::session::clock::ManualClock;

    struct FixedText(String);

    impl TextSource for FixedText {
        fn is_ready(&mut self) -> bool {
            true
        }

        fn random_text(&mut self, _tier: Tier) -> String {
            self.0.clone()
        }
    }

    struct NeverReady;

    impl TextSource for NeverReady {
        fn is_ready(&mut self) -> bool {
            false
        }

        fn random_text(&mut self, _tier: Tier) -> String {
            String::new()
        }
    }

    fn engine_with(text: &str, config: RoundConfig) -> GameEngine {
        let catalog = Catalog::load_embedded().unwrap();
        GameEngine::new(
            config,
            Box::new(FixedText(text.to_string())),
            Box::new(ManualClock::new()),
            ProgressionStore::in_memory(&catalog),
        )
    }

    fn engine(text: &str) -> GameEngine {
        engine_with(text, RoundConfig::default())
    }

    /// Engine plus a handle on its clock.
    fn clocked_engine(text: &str, config: RoundConfig) -> (GameEngine, ManualClock) {
        let catalog = Catalog::load_embedded().unwrap();
        let clock = ManualClock::new();
        let engine = GameEngine::new(
            config,
            Box::new(FixedText(text.to_string())),
            Box::new(clock.clone()),
            ProgressionStore::in_memory(&catalog),
        );
        (engine, clock)
    }

    fn type_str(engine: &mut GameEngine, s: &str) {
        for ch in s.chars() {
            engine.key_press(ch);
        }
    }

    fn finish(engine: &mut GameEngine) {
        engine.advance(Instant::now() + Duration::from_secs(10));
    }

    #[test]
    fn test_medal_thresholds() {
        assert_eq!(Medal::from_lives(5), Some(Medal::Gold));
        assert_eq!(Medal::from_lives(3), Some(Medal::Gold));
        assert_eq!(Medal::from_lives(2), Some(Medal::Silver));
        assert_eq!(Medal::from_lives(1), Some(Medal::Bronze));
        assert_eq!(Medal::from_lives(0), None);
    }

    #[test]
    fn test_start_round_is_noop_while_texts_load() {
        let catalog = Catalog::load_embedded().unwrap();
        let mut engine = GameEngine::new(
            RoundConfig::default(),
            Box::new(NeverReady),
            Box::new(ManualClock::new()),
            ProgressionStore::in_memory(&catalog),
        );
        assert!(!engine.start_round(Tier::Avanzado));
        assert_eq!(engine.phase(), RoundPhase::Idle);
        assert_eq!(engine.round_id(), 0);
    }

    #[test]
    fn test_clock_stops_on_every_ending() {
        let timed = RoundConfig {
            time_limit: Some(1),
            ..RoundConfig::default()
        };
        let (mut engine, clock) = clocked_engine("ab", timed);

        engine.start_round(Tier::Principiante);
        assert_eq!(clock.running_round(), Some(engine.round_id()));
        assert_eq!(clock.starts(), 1);
        type_str(&mut engine, "ab");
        assert_eq!(engine.phase(), RoundPhase::Terminating(EndCause::Completed));
        assert!(!clock.is_running());

        engine.start_round(Tier::Principiante);
        assert_eq!(clock.starts(), 2);
        type_str(&mut engine, "xxx");
        assert_eq!(engine.phase(), RoundPhase::Terminating(EndCause::Lives));
        assert!(!clock.is_running());

        engine.start_round(Tier::Principiante);
        assert_eq!(clock.starts(), 3);
        engine.clock_tick(engine.round_id());
        assert_eq!(engine.phase(), RoundPhase::Terminating(EndCause::Time));
        assert!(!clock.is_running());

        engine.start_round(Tier::Principiante);
        assert_eq!(clock.starts(), 4);
        assert!(clock.is_running());
        engine.reset();
        assert!(!clock.is_running());
        assert_eq!(clock.starts(), 4);
    }

    #[test]
    fn test_keys_ignored_when_idle() {
        let mut engine = engine("abc");
        engine.key_press('a');
        assert!(engine.drain_events().is_empty());
        assert_eq!(engine.stats().current_position, 0);
    }

    #[test]
    fn test_control_chars_are_not_judged() {
        let mut engine = engine("abc");
        engine.start_round(Tier::Principiante);
        engine.key_press('\u{8}');
        engine.key_press('\n');
        assert_eq!(engine.stats().errors, 0);
        assert_eq!(engine.stats().lives, 3);
    }

    #[test]
    fn test_case_and_accents_are_significant() {
        let mut engine = engine("\u{e9}A");
        engine.start_round(Tier::Principiante);
        engine.key_press('e');
        assert_eq!(engine.stats().errors, 1);
        engine.key_press('\u{e9}');
        engine.key_press('a');
        assert_eq!(engine.stats().errors, 2);
        assert_eq!(engine.stats().current_position, 1);
    }

    #[test]
    fn test_completion_goes_through_terminating() {
        let mut engine = engine("ab");
        engine.start_round(Tier::Principiante);
        type_str(&mut engine, "ab");
        assert_eq!(engine.phase(), RoundPhase::Terminating(EndCause::Completed));
        assert_eq!(engine.stats().medal, Some(Medal::Gold));
        assert!(engine.progression().stats().total_games_played == 0);

        engine.advance(Instant::now());
        finish(&mut engine);
        assert_eq!(engine.phase(), RoundPhase::GameOver(EndCause::Completed));
        assert_eq!(engine.progression().stats().total_games_played, 1);

        let events = engine.drain_events();
        assert!(events.iter().any(|e| matches!(e, GameEvent::RoundCompleted(s) if s.completed)));
    }

    #[test]
    fn test_keys_ignored_after_termination() {
        let mut engine = engine("a");
        engine.start_round(Tier::Principiante);
        engine.key_press('a');
        engine.key_press('x');
        assert_eq!(engine.stats().errors, 0);
        assert_eq!(engine.stats().lives, 3);
    }

    #[test]
    fn test_clock_tick_counts_down_and_ends_round() {
        let config = RoundConfig {
            time_limit: Some(2),
            ..RoundConfig::default()
        };
        let mut engine = engine_with("abcdef", config);
        engine.start_round(Tier::Intermedio);
        let id = engine.round_id();
        engine.clock_tick(id);
        assert_eq!(engine.stats().time_remaining, Some(1));
        engine.clock_tick(id);
        assert_eq!(engine.stats().time_remaining, Some(0));
        assert_eq!(engine.phase(), RoundPhase::Terminating(EndCause::Time));
        engine.clock_tick(id);
        assert_eq!(engine.stats().time_remaining, Some(0));
    }

    #[test]
    fn test_stale_tick_is_dropped() {
        let mut engine = engine("abcdef");
        engine.start_round(Tier::Principiante);
        let old = engine.round_id();
        engine.reset();
        engine.start_round(Tier::Principiante);
        engine.clock_tick(old);
        assert_eq!(engine.stats().time_remaining, Some(60));
    }

    #[test]
    fn test_untimed_round_never_times_out() {
        let config = RoundConfig {
            time_limit: None,
            ..RoundConfig::default()
        };
        let mut engine = engine_with("abc", config);
        engine.start_round(Tier::Principiante);
        let id = engine.round_id();
        for _ in 0..1000 {
            engine.clock_tick(id);
        }
        assert_eq!(engine.phase(), RoundPhase::Playing);
        assert_eq!(engine.stats().time_remaining, None);
    }

    #[test]
    fn test_time_of_day_cycles_under_auto() {
        let config = RoundConfig {
            time_of_day_cycle: 2,
            ..RoundConfig::default()
        };
        let mut engine = engine_with("abc", config);
        engine.start_round(Tier::Principiante);
        assert_eq!(engine.time_of_day(), TimeOfDay::Morning);
        let id = engine.round_id();
        engine.clock_tick(id);
        assert_eq!(engine.time_of_day(), TimeOfDay::Morning);
        engine.clock_tick(id);
        assert_eq!(engine.time_of_day(), TimeOfDay::Afternoon);
    }

    #[test]
    fn test_reset_persists_pending_summary_once() {
        let mut engine = engine("a");
        engine.start_round(Tier::Principiante);
        engine.key_press('a');
        engine.reset();
        engine.reset();
        finish(&mut engine);
        assert_eq!(engine.phase(), RoundPhase::Idle);
        assert_eq!(engine.progression().stats().total_games_played, 1);
        assert!(engine.cells().is_empty());
        assert_eq!(*engine.stats(), RoundStats::fresh(&RoundConfig::default()));
    }

    #[test]
    fn test_aborted_round_records_nothing() {
        let mut engine = engine("abc");
        engine.start_round(Tier::Principiante);
        engine.key_press('a');
        engine.reset();
        assert_eq!(engine.progression().stats().total_games_played, 0);
    }

    #[test]
    fn test_start_round_flushes_previous_summary() {
        let mut engine = engine("a");
        engine.start_round(Tier::Principiante);
        engine.key_press('a');
        assert!(engine.start_round(Tier::Principiante));
        assert_eq!(engine.progression().stats().total_games_played, 1);
        assert_eq!(engine.phase(), RoundPhase::Playing);
    }

    #[test]
    fn test_session_ids_are_unique_and_shaped() {
        let mut engine = engine("a");
        engine.start_round(Tier::Principiante);
        engine.key_press('a');
        finish(&mut engine);
        let first = engine.last_session().unwrap().id.clone();
        engine.start_round(Tier::Principiante);
        engine.key_press('a');
        finish(&mut engine);
        let second = engine.last_session().unwrap().id.clone();
        assert_ne!(first, second);
        assert!(first.starts_with("game_"));
        assert_eq!(first.rsplit('_').next().unwrap().len(), 9);
    }
}
