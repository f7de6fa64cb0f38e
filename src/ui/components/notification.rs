use std::time::{Duration, Instant};

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Widget, Wrap};

use crate::ui::theme::Theme;

const TOAST_LIFETIME: Duration = Duration::from_secs(4);

#[derive(Clone, Debug)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub expires_at: Instant,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>, now: Instant) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            expires_at: now + TOAST_LIFETIME,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Transient toast drawn over whatever screen is active.
pub struct NotificationToast<'a> {
    notification: &'a Notification,
    theme: &'a Theme,
}

impl<'a> NotificationToast<'a> {
    pub fn new(notification: &'a Notification, theme: &'a Theme) -> Self {
        Self {
            notification,
            theme,
        }
    }
}

impl Widget for NotificationToast<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        Clear.render(area, buf);

        let block = Block::bordered()
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let lines = vec![
            Line::from(Span::styled(
                self.notification.title.as_str(),
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                self.notification.body.as_str(),
                Style::default().fg(colors.fg()),
            )),
        ];
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: true })
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry() {
        let now = Instant::now();
        let n = Notification::new("t", "b", now);
        assert!(!n.is_expired(now));
        assert!(n.is_expired(now + TOAST_LIFETIME));
    }
}
