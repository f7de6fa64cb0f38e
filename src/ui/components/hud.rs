use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::session::round::Snapshot;
use crate::ui::theme::Theme;

/// One-line status strip shown above the typing area.
pub struct Hud<'a> {
    snapshot: &'a Snapshot<'a>,
    max_lives: u32,
    wpm: u32,
    theme: &'a Theme,
}

impl<'a> Hud<'a> {
    pub fn new(snapshot: &'a Snapshot<'a>, max_lives: u32, wpm: u32, theme: &'a Theme) -> Self {
        Self {
            snapshot,
            max_lives,
            wpm,
            theme,
        }
    }
}

fn hearts(lives: u32, max_lives: u32) -> String {
    let max = max_lives.max(lives);
    let mut out = "\u{2665}".repeat(lives as usize);
    out.push_str(&"\u{2661}".repeat((max - lives) as usize));
    out
}

impl Widget for Hud<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let stats = self.snapshot.stats;
        let label = Style::default().fg(colors.text_pending());
        let value = Style::default().fg(colors.fg()).add_modifier(Modifier::BOLD);

        let time = match stats.time_remaining {
            Some(secs) => format!("{secs}s"),
            None => "\u{221e}".to_string(),
        };
        let time_style = match stats.time_remaining {
            Some(secs) if secs <= 10 => Style::default()
                .fg(colors.warning())
                .add_modifier(Modifier::BOLD),
            _ => value,
        };

        let line = Line::from(vec![
            Span::styled(
                hearts(stats.lives, self.max_lives),
                Style::default().fg(colors.lives()),
            ),
            Span::styled("   Tiempo ", label),
            Span::styled(time, time_style),
            Span::styled("   WPM ", label),
            Span::styled(self.wpm.to_string(), value),
            Span::styled("   ", label),
            Span::styled(
                format!("{} {}", self.snapshot.tier.icon(), self.snapshot.tier.label()),
                Style::default().fg(colors.accent()),
            ),
            Span::styled(format!("   {}", self.snapshot.time_of_day.label()), label),
            Span::styled(
                format!(
                    "   {}/{}",
                    stats.current_position,
                    self.snapshot.cells.len()
                ),
                label,
            ),
            Span::styled(format!("   Nv. {}", self.snapshot.player_level), label),
        ]);

        let block = Block::bordered()
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        Paragraph::new(line)
            .block(block)
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hearts_fill_then_outline() {
        assert_eq!(hearts(2, 3), "\u{2665}\u{2665}\u{2661}");
        assert_eq!(hearts(0, 3), "\u{2661}\u{2661}\u{2661}");
        assert_eq!(hearts(4, 3), "\u{2665}\u{2665}\u{2665}\u{2665}");
    }
}
