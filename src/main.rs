mod app;
mod config;
mod engine;
mod event;
mod generator;
mod session;
mod store;
mod ui;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::{Block, Paragraph};

use app::{App, AppScreen};
use config::Config;
use engine::achievements::Catalog;
use event::{AppEvent, EventHandler};
use generator::corpus::TextProvider;
use session::clock::ThreadClock;
use session::round::{GameEngine, RoundConfig};
use session::tier::Tier;
use store::json_store::JsonStore;
use store::progression::ProgressionStore;
use ui::components::achievements_panel::AchievementsPanel;
use ui::components::dashboard::Dashboard;
use ui::components::hud::Hud;
use ui::components::notification::NotificationToast;
use ui::components::progress_bar::ProgressBar;
use ui::components::typing_area::TypingArea;
use ui::layout::{AppLayout, centered_rect, corner_rect, pack_hint_lines};
use ui::theme::Theme;

#[derive(Parser)]
#[command(name = "typefrog", version, about = "Typing arcade: keep the frog hopping by typing the text")]
struct Cli {
    #[arg(long, help = "Start on this tier (principiante, intermedio, avanzado)")]
    tier: Option<Tier>,

    #[arg(long, help = "Lives per round")]
    lives: Option<u32>,

    #[arg(long, help = "Seconds per round, 0 for no time limit")]
    time: Option<u32>,

    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(long, help = "Directory for player data and the log file")]
    data_dir: Option<PathBuf>,

    #[arg(long, help = "Log level (error, warn, info, debug, trace)")]
    log_level: Option<log::LevelFilter>,

    #[arg(long, value_name = "FILE", help = "Write player data to FILE and exit")]
    export: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "Replace player data with FILE and exit")]
    import: Option<PathBuf>,

    #[arg(long, help = "Erase all player progress and exit")]
    reset_progress: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, config_warning) = Config::load();
    if let Some(tier) = cli.tier {
        config.default_tier = tier;
    }
    if let Some(lives) = cli.lives {
        config.max_lives = lives;
    }
    if let Some(time) = cli.time {
        config.time_limit_secs = time;
    }
    if let Some(theme) = cli.theme {
        config.theme = theme;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }
    config.validate();

    let data_dir = config.data_dir();
    if let Err(e) = init_logging(&data_dir, cli.log_level) {
        eprintln!("Logging disabled: {e:#}");
    }
    log::info!("typefrog {} starting", env!("CARGO_PKG_VERSION"));
    if let Some(warning) = config_warning {
        log::warn!("[CONFIG] {warning}");
    }

    let catalog = Catalog::load_embedded().context("bundled achievement catalog is invalid")?;
    let store = JsonStore::with_base_dir(data_dir.clone())
        .with_context(|| format!("cannot use data directory {}", data_dir.display()))?;

    if cli.reset_progress || cli.export.is_some() || cli.import.is_some() {
        let mut progression = ProgressionStore::open(store, &catalog);
        return manage_data(&mut progression, &cli.export, &cli.import, cli.reset_progress);
    }
    let progression = ProgressionStore::open(store, &catalog);

    let theme: &'static Theme = Box::leak(Box::new(Theme::load(&config.theme).unwrap_or_default()));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(50));
    let texts = TextProvider::spawn_load(
        config.corpus_path.clone(),
        config.corpus_url.clone(),
        data_dir.clone(),
    );
    let engine = GameEngine::new(
        RoundConfig::from(&config),
        Box::new(texts),
        Box::new(ThreadClock::new(events.sender())),
        progression,
    );
    let mut app = App::new(config, theme, engine);

    let result = run_app(&mut terminal, &mut app, &events);
    app.shutdown();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        log::error!("fatal: {err:?}");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

/// Log to a file in the data directory; the terminal belongs to the UI.
fn init_logging(data_dir: &Path, level: Option<log::LevelFilter>) -> Result<()> {
    fs::create_dir_all(data_dir)?;
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join("typefrog.log"))?;

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format_timestamp_secs()
        .try_init()?;
    Ok(())
}

fn manage_data(
    progression: &mut ProgressionStore,
    export: &Option<PathBuf>,
    import: &Option<PathBuf>,
    reset: bool,
) -> Result<()> {
    if reset {
        progression.reset_player_data();
        println!("Player progress erased.");
    }
    if let Some(path) = import {
        let content = fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        progression
            .import_player_data(&content)
            .with_context(|| format!("cannot import {}", path.display()))?;
        println!("Imported player data from {}.", path.display());
    }
    if let Some(path) = export {
        let json = progression.export_player_data()?;
        fs::write(path, json).with_context(|| format!("cannot write {}", path.display()))?;
        println!("Exported player data to {}.", path.display());
    }
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::ClockTick(round_id) => app.on_clock_tick(round_id),
            AppEvent::Tick | AppEvent::Resize(_, _) => {}
        }
        app.on_frame(Instant::now());

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.screen {
        AppScreen::Start => handle_menu_key(app, key),
        AppScreen::Playing => handle_playing_key(app, key),
        AppScreen::GameOver => handle_game_over_key(app, key),
        AppScreen::Achievements => handle_achievements_key(app, key),
    }
}

fn handle_menu_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('1') => app.start_round(Tier::Principiante),
        KeyCode::Char('2') => app.start_round(Tier::Intermedio),
        KeyCode::Char('3') => app.start_round(Tier::Avanzado),
        KeyCode::Char('a') => app.go_to_achievements(),
        KeyCode::Up | KeyCode::Char('k') => app.menu.prev(),
        KeyCode::Down | KeyCode::Char('j') => app.menu.next(),
        KeyCode::Enter => {
            let action = app.menu.selected_action();
            app.activate_menu(action);
        }
        _ => {}
    }
}

fn handle_playing_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.go_to_menu(),
        // Only plain characters reach the judge; shortcuts and navigation never do.
        KeyCode::Char(ch)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            app.type_char(ch)
        }
        _ => {}
    }
}

fn handle_game_over_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Char('r') => app.retry(),
        KeyCode::Char('a') => app.go_to_achievements(),
        KeyCode::Char('m') | KeyCode::Char('q') | KeyCode::Esc => app.go_to_menu(),
        _ => {}
    }
}

fn handle_achievements_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.leave_achievements(),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_achievements(1),
        KeyCode::Up | KeyCode::Char('k') => app.scroll_achievements(-1),
        KeyCode::PageDown => app.scroll_achievements(10),
        KeyCode::PageUp => app.scroll_achievements(-10),
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    frame.render_widget(Block::default().style(Style::default().bg(colors.bg())), area);

    match app.screen {
        AppScreen::Start => render_menu(frame, app),
        AppScreen::Playing => render_playing(frame, app),
        AppScreen::GameOver => render_game_over(frame, app),
        AppScreen::Achievements => {
            let panel_area = centered_rect(80, 90, area);
            frame.render_widget(
                AchievementsPanel::new(app.engine.progression(), app.achievements_scroll, app.theme),
                panel_area,
            );
        }
    }

    render_notifications(frame, app);
}

fn render_menu(frame: &mut ratatui::Frame, app: &App) {
    let area = centered_rect(60, 80, frame.area());
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(3)])
        .split(area);

    frame.render_widget(&app.menu, layout[0]);

    let (level, into_level, span) = app.level_progress();
    frame.render_widget(
        ProgressBar::experience(level, into_level, span, app.theme),
        layout[1],
    );
}

fn render_playing(frame: &mut ratatui::Frame, app: &App) {
    let layout = AppLayout::new(frame.area());
    let snapshot = app.engine.snapshot();

    frame.render_widget(
        Hud::new(&snapshot, app.config.max_lives, app.engine.live_wpm(), app.theme),
        layout.header,
    );
    frame.render_widget(
        TypingArea::new(snapshot.cells, snapshot.stats.current_position, app.theme)
            .title(format!("{} {}", snapshot.tier.icon(), snapshot.tier.label())),
        layout.main,
    );
    render_hints(frame, &["[Esc] Men\u{fa}", "[Ctrl-C] Salir"], layout.footer, app);
}

fn render_game_over(frame: &mut ratatui::Frame, app: &App) {
    let area = centered_rect(60, 70, frame.area());
    let (Some(session), Some(cause)) = (app.engine.last_session(), app.game_over_cause()) else {
        return;
    };
    let progression = app.engine.progression();
    let unlocked: Vec<&str> = session
        .achievements_unlocked
        .iter()
        .filter_map(|id| progression.achievements().iter().find(|a| a.id() == id))
        .map(|a| a.def.name.as_str())
        .collect();
    frame.render_widget(Dashboard::new(session, cause, unlocked, app.theme), area);
}

fn render_hints(frame: &mut ratatui::Frame, hints: &[&str], area: ratatui::layout::Rect, app: &App) {
    let lines: Vec<Line> = pack_hint_lines(hints, area.width as usize)
        .into_iter()
        .map(Line::from)
        .collect();
    frame.render_widget(
        Paragraph::new(lines).style(Style::default().fg(app.theme.colors.text_pending())),
        area,
    );
}

fn render_notifications(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let mut y = area.y;
    for notification in &app.notifications {
        let mut rect = corner_rect(40, 4, area);
        rect.y = y;
        if rect.y + rect.height > area.y + area.height {
            break;
        }
        frame.render_widget(NotificationToast::new(notification, app.theme), rect);
        y += rect.height;
    }
}
