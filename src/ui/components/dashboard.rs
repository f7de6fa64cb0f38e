use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::session::result::RoundSession;
use crate::session::round::{EndCause, Medal};
use crate::ui::theme::Theme;

/// Game-over summary of one round.
pub struct Dashboard<'a> {
    pub session: &'a RoundSession,
    pub cause: EndCause,
    pub unlocked: Vec<&'a str>,
    pub theme: &'a Theme,
}

impl<'a> Dashboard<'a> {
    pub fn new(
        session: &'a RoundSession,
        cause: EndCause,
        unlocked: Vec<&'a str>,
        theme: &'a Theme,
    ) -> Self {
        Self {
            session,
            cause,
            unlocked,
            theme,
        }
    }
}

impl Widget for Dashboard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let border = if self.cause == EndCause::Completed {
            colors.success()
        } else {
            colors.error()
        };
        let block = Block::bordered()
            .title(format!(" {} ", self.cause.title()))
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(6),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(inner);

        let medal_line = match self.session.medal_earned {
            Some(medal) => Line::from(Span::styled(
                format!("{} Medalla de {}", medal.icon(), medal.label()),
                Style::default()
                    .fg(colors.medal(medal))
                    .add_modifier(Modifier::BOLD),
            )),
            None => Line::from(Span::styled(
                "Sin medalla",
                Style::default().fg(colors.text_pending()),
            )),
        };
        Paragraph::new(medal_line)
            .alignment(Alignment::Center)
            .render(layout[0], buf);

        let acc_color = if self.session.accuracy >= 95 {
            colors.success()
        } else if self.session.accuracy >= 85 {
            colors.warning()
        } else {
            colors.error()
        };
        let label = Style::default().fg(colors.fg());
        let stat_lines = vec![
            Line::from(vec![
                Span::styled("  Velocidad:  ", label),
                Span::styled(
                    format!("{} WPM", self.session.wpm),
                    Style::default()
                        .fg(colors.accent())
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(vec![
                Span::styled("  Precisi\u{f3}n:  ", label),
                Span::styled(
                    format!("{}%", self.session.accuracy),
                    Style::default().fg(acc_color).add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(vec![
                Span::styled("  Caracteres: ", label),
                Span::styled(self.session.characters_typed.to_string(), label),
            ]),
            Line::from(vec![
                Span::styled("  Errores:    ", label),
                Span::styled(
                    self.session.errors.to_string(),
                    Style::default().fg(if self.session.errors == 0 {
                        colors.success()
                    } else {
                        colors.error()
                    }),
                ),
            ]),
            Line::from(vec![
                Span::styled("  Tiempo:     ", label),
                Span::styled(format!("{}s", self.session.duration_secs), label),
            ]),
        ];
        Paragraph::new(stat_lines).render(layout[1], buf);

        if !self.unlocked.is_empty() {
            let mut lines = vec![Line::from(Span::styled(
                "  \u{1f3c6} Logros desbloqueados",
                Style::default()
                    .fg(colors.medal(Medal::Gold))
                    .add_modifier(Modifier::BOLD),
            ))];
            lines.extend(self.unlocked.iter().map(|name| {
                Line::from(Span::styled(
                    format!("    \u{2022} {name}"),
                    Style::default().fg(colors.fg()),
                ))
            }));
            Paragraph::new(lines).render(layout[2], buf);
        }

        Paragraph::new(Line::from(Span::styled(
            "  [Enter/r] Jugar otra vez  [a] Logros  [m/Esc] Men\u{fa}",
            Style::default().fg(colors.accent()),
        )))
        .render(layout[3], buf);
    }
}
