use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::{Block, Widget};

use crate::ui::theme::Theme;

/// Bordered horizontal bar with a centered caption.
pub struct ProgressBar<'a> {
    pub title: String,
    pub caption: String,
    pub ratio: f64,
    pub theme: &'a Theme,
}

impl<'a> ProgressBar<'a> {
    pub fn new(title: &str, ratio: f64, theme: &'a Theme) -> Self {
        let ratio = if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 0.0 };
        Self {
            title: title.to_string(),
            caption: format!("{:.0}%", ratio * 100.0),
            ratio,
            theme,
        }
    }

    /// Experience toward the next level.
    pub fn experience(level: u32, into_level: u64, level_span: u64, theme: &'a Theme) -> Self {
        let ratio = if level_span == 0 {
            0.0
        } else {
            into_level as f64 / level_span as f64
        };
        let mut bar = Self::new(&format!("Nivel {level}"), ratio, theme);
        bar.caption = format!("{into_level}/{level_span} XP");
        bar
    }
}

impl Widget for ProgressBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(format!(" {} ", self.title))
            .border_style(Style::default().fg(colors.border()));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let filled_width = (self.ratio * inner.width as f64) as u16;
        for x in inner.x..inner.x + inner.width {
            let style = if x < inner.x + filled_width {
                Style::default().fg(colors.bg()).bg(colors.bar_filled())
            } else {
                Style::default().fg(colors.fg()).bg(colors.bar_empty())
            };
            buf[(x, inner.y)].set_style(style);
        }

        let caption_width = self.caption.chars().count() as u16;
        let caption_x = inner.x + inner.width.saturating_sub(caption_width) / 2;
        buf.set_stringn(
            caption_x,
            inner.y,
            &self.caption,
            inner.width as usize,
            Style::default().fg(colors.fg()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_experience_caption() {
        let theme = Theme::default();
        let bar = ProgressBar::experience(2, 500, 1500, &theme);
        assert_eq!(bar.caption, "500/1500 XP");
        assert!((bar.ratio - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_ratio_is_clamped() {
        let theme = Theme::default();
        assert_eq!(ProgressBar::new("x", 3.0, &theme).ratio, 1.0);
        assert_eq!(ProgressBar::new("x", f64::NAN, &theme).ratio, 0.0);
    }
}
