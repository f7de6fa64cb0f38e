use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};

/// Everything the game loop reacts to, serialized through one channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppEvent {
    Key(KeyEvent),
    /// Frame tick: drives deferred transitions and redraws.
    Tick,
    /// One wall-clock second of the round identified by the payload.
    ClockTick(u64),
    Resize(u16, u16),
}

impl AppEvent {
    /// Terminal events the game cares about. Key releases and repeats from
    /// enhanced keyboards are dropped here so one press judges one character.
    fn from_terminal(event: Event) -> Option<Self> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
            Event::Resize(w, h) => Some(AppEvent::Resize(w, h)),
            _ => None,
        }
    }
}

/// Single consumer end of the game loop's queue. The terminal reader thread
/// and any clock obtained through `sender` both feed it.
pub struct EventHandler {
    rx: mpsc::Receiver<AppEvent>,
    tx: mpsc::Sender<AppEvent>,
}

impl EventHandler {
    pub fn new(frame_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let terminal_tx = tx.clone();
        thread::spawn(move || read_terminal(terminal_tx, frame_rate));
        Self { rx, tx }
    }

    pub fn sender(&self) -> mpsc::Sender<AppEvent> {
        self.tx.clone()
    }

    pub fn next(&self) -> anyhow::Result<AppEvent> {
        Ok(self.rx.recv()?)
    }
}

/// Forward terminal input, with a `Tick` whenever a frame passes quietly.
/// Returns once the receiving side is gone.
fn read_terminal(tx: mpsc::Sender<AppEvent>, frame_rate: Duration) {
    loop {
        let next = if event::poll(frame_rate).unwrap_or(false) {
            match event::read() {
                Ok(raw) => AppEvent::from_terminal(raw),
                Err(e) => {
                    log::warn!("terminal read failed: {e}");
                    None
                }
            }
        } else {
            Some(AppEvent::Tick)
        };
        if let Some(ev) = next
            && tx.send(ev).is_err()
        {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEventState, KeyModifiers};

    fn key(kind: KeyEventKind) -> Event {
        Event::Key(KeyEvent {
            code: KeyCode::Char('a'),
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn test_only_presses_become_keys() {
        assert!(matches!(
            AppEvent::from_terminal(key(KeyEventKind::Press)),
            Some(AppEvent::Key(_))
        ));
        assert_eq!(AppEvent::from_terminal(key(KeyEventKind::Release)), None);
        assert_eq!(AppEvent::from_terminal(key(KeyEventKind::Repeat)), None);
        assert_eq!(AppEvent::from_terminal(Event::FocusLost), None);
        assert_eq!(
            AppEvent::from_terminal(Event::Resize(80, 24)),
            Some(AppEvent::Resize(80, 24))
        );
    }

    #[test]
    fn test_clock_ticks_share_the_queue() {
        let (tx, rx) = mpsc::channel();
        let handler = EventHandler { rx, tx };
        handler.sender().send(AppEvent::ClockTick(4)).unwrap();
        assert_eq!(handler.next().unwrap(), AppEvent::ClockTick(4));
    }
}
