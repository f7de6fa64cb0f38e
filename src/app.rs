use std::collections::VecDeque;
use std::time::Instant;

use crate::config::Config;
use crate::engine::achievements::Achievement;
use crate::engine::scoring;
use crate::session::round::{EndCause, GameEngine, GameEvent, RoundPhase};
use crate::session::tier::Tier;
use crate::ui::components::menu::{Menu, MenuAction};
use crate::ui::components::notification::Notification;
use crate::ui::theme::Theme;

const MAX_VISIBLE_NOTIFICATIONS: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Start,
    Playing,
    GameOver,
    Achievements,
}

pub struct App {
    pub screen: AppScreen,
    pub engine: GameEngine,
    pub menu: Menu<'static>,
    pub theme: &'static Theme,
    pub config: Config,
    pub notifications: VecDeque<Notification>,
    pub achievements_scroll: u16,
    pub should_quit: bool,
    achievements_return: AppScreen,
}

impl App {
    pub fn new(config: Config, theme: &'static Theme, engine: GameEngine) -> Self {
        let mut menu = Menu::new(theme);
        menu.select_tier(config.default_tier);
        Self {
            screen: AppScreen::Start,
            engine,
            menu,
            theme,
            config,
            notifications: VecDeque::new(),
            achievements_scroll: 0,
            should_quit: false,
            achievements_return: AppScreen::Start,
        }
    }

    /// Starts a round, or leaves the menu showing the loading hint if texts
    /// are not in yet.
    pub fn start_round(&mut self, tier: Tier) {
        if self.engine.start_round(tier) {
            self.menu.loading = false;
            self.menu.select_tier(tier);
            self.screen = AppScreen::Playing;
        } else {
            self.menu.loading = true;
        }
    }

    pub fn retry(&mut self) {
        let tier = self.engine.tier();
        self.start_round(tier);
    }

    pub fn type_char(&mut self, ch: char) {
        self.engine.key_press(ch);
    }

    pub fn on_clock_tick(&mut self, round_id: u64) {
        self.engine.clock_tick(round_id);
    }

    /// Per-iteration housekeeping: finish deferred transitions and turn engine
    /// events into notifications.
    pub fn on_frame(&mut self, now: Instant) {
        self.engine.advance(now);
        if self.menu.loading {
            self.menu.loading = !self.engine.texts_ready();
        }

        for event in self.engine.drain_events() {
            match event {
                GameEvent::AchievementUnlocked(achievement) => {
                    self.push_notification(achievement_notification(&achievement, now));
                }
                GameEvent::LevelUp(level) => {
                    self.push_notification(Notification::new(
                        format!("\u{2b50} \u{a1}Nivel {level}!"),
                        "Has subido de nivel",
                        now,
                    ));
                }
                GameEvent::RoundCompleted(_)
                | GameEvent::CharJudged { .. }
                | GameEvent::LifeLost { .. } => {}
            }
        }

        if self.screen == AppScreen::Playing && self.game_over_cause().is_some() {
            self.screen = AppScreen::GameOver;
        }
        self.notifications.retain(|n| !n.is_expired(now));
    }

    pub fn game_over_cause(&self) -> Option<EndCause> {
        match self.engine.phase() {
            RoundPhase::GameOver(cause) => Some(cause),
            _ => None,
        }
    }

    pub fn go_to_menu(&mut self) {
        self.engine.reset();
        self.screen = AppScreen::Start;
    }

    pub fn go_to_achievements(&mut self) {
        self.achievements_return = if self.screen == AppScreen::GameOver {
            AppScreen::GameOver
        } else {
            AppScreen::Start
        };
        self.achievements_scroll = 0;
        self.screen = AppScreen::Achievements;
    }

    pub fn leave_achievements(&mut self) {
        self.screen = self.achievements_return;
    }

    pub fn scroll_achievements(&mut self, delta: i32) {
        self.achievements_scroll = self.achievements_scroll.saturating_add_signed(delta as i16);
    }

    pub fn activate_menu(&mut self, action: MenuAction) {
        match action {
            MenuAction::Play(tier) => self.start_round(tier),
            MenuAction::Achievements => self.go_to_achievements(),
            MenuAction::Quit => self.should_quit = true,
        }
    }

    /// Experience gained inside the current level and the size of that level.
    pub fn level_progress(&self) -> (u32, u64, u64) {
        let stats = self.engine.progression().stats();
        let floor = scoring::xp_threshold(stats.level);
        let span = scoring::xp_for_level(stats.level);
        (stats.level, stats.experience.saturating_sub(floor), span)
    }

    /// Flush anything pending before the process exits.
    pub fn shutdown(&mut self) {
        self.engine.reset();
    }

    fn push_notification(&mut self, notification: Notification) {
        self.notifications.push_back(notification);
        while self.notifications.len() > MAX_VISIBLE_NOTIFICATIONS {
            self.notifications.pop_front();
        }
    }
}

fn achievement_notification(achievement: &Achievement, now: Instant) -> Notification {
    let xp = scoring::achievement_xp(achievement.def.category);
    Notification::new(
        format!("\u{1f3c6} {}", achievement.def.name),
        format!("{} (+{xp} XP)", achievement.def.description),
        now,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::engine::achievements::Catalog;
    use crate::generator::TextSource;
    use crate::session::clock::ManualClock;
    use crate::session::round::RoundConfig;
    use crate::store::progression::ProgressionStore;

    struct Fixed;

    impl TextSource for Fixed {
        fn is_ready(&mut self) -> bool {
            true
        }

        fn random_text(&mut self, _tier: Tier) -> String {
            "rana".to_string()
        }
    }

    fn test_app() -> App {
        let theme: &'static Theme = Box::leak(Box::new(Theme::default()));
        let catalog = Catalog::load_embedded().unwrap();
        let engine = GameEngine::new(
            RoundConfig::default(),
            Box::new(Fixed),
            Box::new(ManualClock::new()),
            ProgressionStore::in_memory(&catalog),
        );
        App::new(Config::default(), theme, engine)
    }

    #[test]
    fn test_completed_round_reaches_game_over_with_toasts() {
        let mut app = test_app();
        app.start_round(Tier::Principiante);
        assert_eq!(app.screen, AppScreen::Playing);
        for ch in "rana".chars() {
            app.type_char(ch);
        }
        let later = Instant::now() + Duration::from_secs(1);
        app.on_frame(later);
        assert_eq!(app.screen, AppScreen::GameOver);
        assert_eq!(app.game_over_cause(), Some(EndCause::Completed));
        assert!(!app.notifications.is_empty());
        assert!(app.notifications.len() <= MAX_VISIBLE_NOTIFICATIONS);
    }

    #[test]
    fn test_escape_to_menu_resets_round() {
        let mut app = test_app();
        app.start_round(Tier::Avanzado);
        app.type_char('r');
        app.go_to_menu();
        assert_eq!(app.screen, AppScreen::Start);
        assert_eq!(app.engine.phase(), RoundPhase::Idle);
    }

    #[test]
    fn test_achievements_returns_to_origin() {
        let mut app = test_app();
        app.go_to_achievements();
        app.scroll_achievements(-5);
        assert_eq!(app.achievements_scroll, 0);
        app.scroll_achievements(2);
        assert_eq!(app.achievements_scroll, 2);
        app.leave_achievements();
        assert_eq!(app.screen, AppScreen::Start);
    }

    #[test]
    fn test_level_progress_starts_empty() {
        let app = test_app();
        assert_eq!(app.level_progress(), (1, 0, 1000));
    }
}
