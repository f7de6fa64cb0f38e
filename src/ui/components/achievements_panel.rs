use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::engine::achievements::{Achievement, AchievementCategory};
use crate::store::progression::ProgressionStore;
use crate::ui::theme::Theme;

/// Catalog grouped by category, with lock state and counter progress.
pub struct AchievementsPanel<'a> {
    progression: &'a ProgressionStore,
    scroll: u16,
    theme: &'a Theme,
}

impl<'a> AchievementsPanel<'a> {
    pub fn new(progression: &'a ProgressionStore, scroll: u16, theme: &'a Theme) -> Self {
        Self {
            progression,
            scroll,
            theme,
        }
    }
}

fn progress_text(achievement: &Achievement) -> Option<String> {
    if achievement.is_unlocked() || achievement.is_hidden() {
        return None;
    }
    let current = achievement.state.progress?;
    let target = achievement.state.max_progress?;
    Some(format!(" ({current}/{target})"))
}

impl Widget for AchievementsPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let unlocked = self.progression.unlocked().count();
        let total = self.progression.achievements().len();

        let mut lines: Vec<Line> = Vec::new();
        for &category in AchievementCategory::all() {
            let entries = self.progression.by_category(category);
            if entries.is_empty() {
                continue;
            }
            lines.push(Line::from(Span::styled(
                category.label(),
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )));
            for achievement in entries {
                let (mark, name_style) = if achievement.is_unlocked() {
                    (
                        achievement.def.icon.as_str(),
                        Style::default().fg(colors.success()).add_modifier(Modifier::BOLD),
                    )
                } else {
                    ("\u{1f512}", Style::default().fg(colors.text_pending()))
                };
                let mut spans = vec![
                    Span::raw("  "),
                    Span::raw(format!("{mark} ")),
                    Span::styled(achievement.display_name().to_string(), name_style),
                    Span::styled(
                        format!("  {}", achievement.display_description()),
                        Style::default().fg(colors.fg()),
                    ),
                ];
                if let Some(progress) = progress_text(achievement) {
                    spans.push(Span::styled(progress, Style::default().fg(colors.warning())));
                }
                lines.push(Line::from(spans));
            }
            lines.push(Line::from(""));
        }

        let block = Block::bordered()
            .title(format!(" Logros {unlocked}/{total} "))
            .title_bottom(" [j/k] Desplazar  [Esc] Volver ")
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));

        Paragraph::new(lines)
            .block(block)
            .scroll((self.scroll, 0))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::achievements::Catalog;

    #[test]
    fn test_hidden_entries_show_no_progress() {
        let store = ProgressionStore::in_memory(&Catalog::load_embedded().unwrap());
        for achievement in store.achievements() {
            if achievement.is_hidden() {
                assert!(progress_text(achievement).is_none());
            }
        }
        let counted = store
            .achievements()
            .iter()
            .find(|a| !a.def.secret && a.state.max_progress.is_some())
            .unwrap();
        assert!(progress_text(counted).unwrap().starts_with(" (0/"));
    }

    #[test]
    fn test_render_fits_small_area() {
        let store = ProgressionStore::in_memory(&Catalog::load_embedded().unwrap());
        let theme = Theme::default();
        let area = Rect::new(0, 0, 20, 5);
        let mut buf = Buffer::empty(area);
        AchievementsPanel::new(&store, 3, &theme).render(area, &mut buf);
    }
}
