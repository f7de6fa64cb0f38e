use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::session::tier::Tier;
use crate::ui::theme::Theme;

pub struct MenuItem {
    pub key: String,
    pub label: String,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    Play(Tier),
    Achievements,
    Quit,
}

/// Start screen: pick a tier, open the achievements panel or quit.
pub struct Menu<'a> {
    pub items: Vec<MenuItem>,
    pub actions: Vec<MenuAction>,
    pub selected: usize,
    pub loading: bool,
    pub theme: &'a Theme,
}

impl<'a> Menu<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        let mut items = Vec::new();
        let mut actions = Vec::new();
        for (i, &tier) in Tier::all().iter().enumerate() {
            items.push(MenuItem {
                key: (i + 1).to_string(),
                label: format!("{} {}", tier.icon(), tier.label()),
                description: tier_description(tier).to_string(),
            });
            actions.push(MenuAction::Play(tier));
        }
        items.push(MenuItem {
            key: "a".to_string(),
            label: "Logros".to_string(),
            description: "Tu colecci\u{f3}n de logros y progreso".to_string(),
        });
        actions.push(MenuAction::Achievements);
        items.push(MenuItem {
            key: "q".to_string(),
            label: "Salir".to_string(),
            description: String::new(),
        });
        actions.push(MenuAction::Quit);

        Self {
            items,
            actions,
            selected: 0,
            loading: false,
            theme,
        }
    }

    pub fn select_tier(&mut self, tier: Tier) {
        if let Some(i) = self.actions.iter().position(|a| *a == MenuAction::Play(tier)) {
            self.selected = i;
        }
    }

    pub fn selected_action(&self) -> MenuAction {
        self.actions
            .get(self.selected)
            .copied()
            .unwrap_or(MenuAction::Quit)
    }

    pub fn next(&mut self) {
        self.selected = (self.selected + 1) % self.items.len();
    }

    pub fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        } else {
            self.selected = self.items.len() - 1;
        }
    }
}

fn tier_description(tier: Tier) -> &'static str {
    match tier {
        Tier::Principiante => "Frases cortas y sencillas",
        Tier::Intermedio => "Textos con acentos y puntuaci\u{f3}n",
        Tier::Avanzado => "P\u{e1}rrafos largos y vocabulario t\u{e9}cnico",
    }
}

impl Widget for &Menu<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(inner);

        let subtitle = if self.loading {
            Span::styled(
                "Cargando textos\u{2026}",
                Style::default().fg(colors.warning()),
            )
        } else {
            Span::styled(
                "Escribe para que la rana avance",
                Style::default().fg(colors.fg()),
            )
        };
        let title_lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                "\u{1f438} typefrog",
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(subtitle),
            Line::from(""),
        ];
        Paragraph::new(title_lines)
            .alignment(Alignment::Center)
            .render(layout[0], buf);

        let menu_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                self.items
                    .iter()
                    .map(|_| Constraint::Length(3))
                    .collect::<Vec<_>>(),
            )
            .split(layout[2]);

        for (i, item) in self.items.iter().enumerate() {
            let is_selected = i == self.selected;
            let indicator = if is_selected { ">" } else { " " };

            let label_style = if is_selected {
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(colors.fg())
            };
            let lines = vec![
                Line::from(Span::styled(
                    format!(" {indicator} [{}] {}", item.key, item.label),
                    label_style,
                )),
                Line::from(Span::styled(
                    format!("     {}", item.description),
                    Style::default().fg(colors.text_pending()),
                )),
            ];

            if let Some(&rect) = menu_layout.get(i) {
                Paragraph::new(lines).render(rect, buf);
            }
        }
    }
}
