use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::session::input::{CharStatus, CharacterCell};
use crate::ui::theme::Theme;

/// The practice text, colored by judgement, with the cursor on the next cell.
pub struct TypingArea<'a> {
    cells: &'a [CharacterCell],
    cursor: usize,
    title: String,
    theme: &'a Theme,
}

impl<'a> TypingArea<'a> {
    pub fn new(cells: &'a [CharacterCell], cursor: usize, theme: &'a Theme) -> Self {
        Self {
            cells,
            cursor,
            title: String::new(),
            theme,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Display form of one cell; newline and tab get visible markers.
struct RenderToken {
    index: usize,
    display: String,
    is_line_break: bool,
}

fn build_render_tokens(cells: &[CharacterCell]) -> Vec<RenderToken> {
    let mut tokens = Vec::with_capacity(cells.len());
    let mut col = 0usize;

    for cell in cells {
        let (display, is_line_break) = match cell.ch {
            '\n' => {
                col = 0;
                ("\u{21b5}".to_string(), true)
            }
            '\t' => {
                let tab_width = 4 - (col % 4);
                col += tab_width;
                let mut display = String::from("\u{2192}");
                display.extend(std::iter::repeat_n('\u{00b7}', tab_width - 1));
                (display, false)
            }
            ch => {
                col += 1;
                (ch.to_string(), false)
            }
        };
        tokens.push(RenderToken {
            index: cell.index,
            display,
            is_line_break,
        });
    }

    tokens
}

impl Widget for TypingArea<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let tokens = build_render_tokens(self.cells);

        let mut lines: Vec<Vec<Span>> = vec![Vec::new()];
        for token in tokens {
            let status = self.cells[token.index].status;
            let style = if token.index == self.cursor {
                let base = Style::default()
                    .fg(colors.text_cursor_fg())
                    .bg(colors.text_cursor_bg());
                if status == CharStatus::Error {
                    base.bg(colors.text_incorrect())
                        .add_modifier(Modifier::UNDERLINED)
                } else {
                    base
                }
            } else {
                match status {
                    CharStatus::Correct => Style::default().fg(colors.text_correct()),
                    CharStatus::Corrected => Style::default()
                        .fg(colors.text_corrected())
                        .add_modifier(Modifier::ITALIC),
                    CharStatus::Error => Style::default()
                        .fg(colors.text_incorrect())
                        .bg(colors.text_incorrect_bg()),
                    CharStatus::Pending => Style::default().fg(colors.text_pending()),
                }
            };

            let line_break = token.is_line_break;
            if let Some(line) = lines.last_mut() {
                line.push(Span::styled(token.display, style));
            }
            if line_break {
                lines.push(Vec::new());
            }
        }

        let mut block = Block::bordered()
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));
        if !self.title.is_empty() {
            block = block.title(format!(" {} ", self.title));
        }

        Paragraph::new(lines.into_iter().map(Line::from).collect::<Vec<_>>())
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
