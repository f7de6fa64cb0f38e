use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// HUD on top, playfield in the middle, key hints at the bottom.
pub struct AppLayout {
    pub header: Rect,
    pub main: Rect,
    pub footer: Rect,
}

impl AppLayout {
    pub fn new(area: Rect) -> Self {
        let footer_height = if area.height >= 16 { 2 } else { 1 };
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(footer_height),
            ])
            .split(area);

        Self {
            header: vertical[0],
            main: vertical[1],
            footer: vertical[2],
        }
    }
}

/// Greedily pack key hints into as few lines as fit `width`.
pub fn pack_hint_lines(hints: &[&str], width: usize) -> Vec<String> {
    if width == 0 || hints.is_empty() {
        return Vec::new();
    }

    let prefix = "  ";
    let separator = "  ";
    let mut out: Vec<String> = Vec::new();
    let mut current = prefix.to_string();
    let mut has_hint = false;

    for hint in hints.iter().filter(|h| !h.is_empty()) {
        let candidate = if has_hint {
            format!("{current}{separator}{hint}")
        } else {
            format!("{current}{hint}")
        };
        if candidate.chars().count() <= width {
            current = candidate;
        } else {
            if has_hint {
                out.push(current);
            }
            current = format!("{prefix}{hint}");
        }
        has_hint = true;
    }

    if has_hint {
        out.push(current);
    }
    out
}

/// Rect of `percent_x` by `percent_y` centered in `area`, never smaller than a
/// readable popup unless the terminal itself is smaller.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    const MIN_POPUP_WIDTH: u16 = 56;
    const MIN_POPUP_HEIGHT: u16 = 14;

    let requested_w = area.width.saturating_mul(percent_x.min(100)) / 100;
    let requested_h = area.height.saturating_mul(percent_y.min(100)) / 100;

    let target_w = requested_w.max(MIN_POPUP_WIDTH).min(area.width);
    let target_h = requested_h.max(MIN_POPUP_HEIGHT).min(area.height);

    let left = area.x.saturating_add(area.width.saturating_sub(target_w) / 2);
    let top = area.y.saturating_add(area.height.saturating_sub(target_h) / 2);

    Rect::new(left, top, target_w, target_h)
}

/// A `width` by `height` box in the top-right corner of `area`.
pub fn corner_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect::new(area.x + area.width - w, area.y, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_hint_lines_wraps() {
        let lines = pack_hint_lines(&["[1] uno", "[2] dos", "[3] tres"], 20);
        assert_eq!(lines, vec!["  [1] uno  [2] dos", "  [3] tres"]);
    }

    #[test]
    fn test_centered_rect_fits_small_area() {
        let area = Rect::new(0, 0, 40, 10);
        let rect = centered_rect(50, 50, area);
        assert_eq!(rect, area);
    }

    #[test]
    fn test_corner_rect() {
        let area = Rect::new(0, 0, 100, 30);
        assert_eq!(corner_rect(30, 4, area), Rect::new(70, 0, 30, 4));
    }
}
