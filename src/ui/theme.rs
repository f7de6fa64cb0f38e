use std::fs;

use ratatui::style::Color;
use rust_embed::Embed;
use serde::{Deserialize, Serialize};

use crate::session::round::Medal;

#[derive(Embed)]
#[folder = "assets/themes/"]
struct ThemeAssets;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    #[serde(default)]
    pub colors: ThemeColors,
}

/// Hex colors. Keys missing from a theme file fall back to the pond palette.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeColors {
    pub bg: String,
    pub fg: String,
    pub text_correct: String,
    pub text_corrected: String,
    pub text_incorrect: String,
    pub text_incorrect_bg: String,
    pub text_pending: String,
    pub text_cursor_bg: String,
    pub text_cursor_fg: String,
    pub accent: String,
    pub accent_dim: String,
    pub border: String,
    pub border_focused: String,
    pub bar_filled: String,
    pub bar_empty: String,
    pub lives: String,
    pub medal_gold: String,
    pub medal_silver: String,
    pub medal_bronze: String,
    pub error: String,
    pub warning: String,
    pub success: String,
}

impl Theme {
    /// User themes in `<config_dir>/typefrog/themes/` shadow bundled ones.
    pub fn load(name: &str) -> Option<Self> {
        let filename = format!("{name}.toml");

        if let Some(config_dir) = dirs::config_dir()
            && let Ok(content) = fs::read_to_string(config_dir.join("typefrog").join("themes").join(&filename))
        {
            match toml::from_str::<Theme>(&content) {
                Ok(theme) => return Some(theme),
                Err(e) => log::warn!("[THEME] user theme {name} is invalid: {e}"),
            }
        }

        let file = ThemeAssets::get(&filename)?;
        let content = std::str::from_utf8(file.data.as_ref()).ok()?;
        toml::from_str::<Theme>(content).ok()
    }

    pub fn available_themes() -> Vec<String> {
        let mut names: Vec<String> = ThemeAssets::iter()
            .filter_map(|f| f.strip_suffix(".toml").map(|n| n.to_string()))
            .collect();
        names.sort();
        names
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::load("pond").unwrap_or_else(|| Self {
            name: "pond".to_string(),
            colors: ThemeColors::default(),
        })
    }
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            bg: "#10231a".to_string(),
            fg: "#d8ecd2".to_string(),
            text_correct: "#7bd88f".to_string(),
            text_corrected: "#e5c07b".to_string(),
            text_incorrect: "#ff6b6b".to_string(),
            text_incorrect_bg: "#4a1f24".to_string(),
            text_pending: "#5f7f6a".to_string(),
            text_cursor_bg: "#d8ecd2".to_string(),
            text_cursor_fg: "#10231a".to_string(),
            accent: "#5ccf8a".to_string(),
            accent_dim: "#2c4a38".to_string(),
            border: "#2c4a38".to_string(),
            border_focused: "#5ccf8a".to_string(),
            bar_filled: "#5ccf8a".to_string(),
            bar_empty: "#1c3328".to_string(),
            lives: "#ff6b8b".to_string(),
            medal_gold: "#ffd166".to_string(),
            medal_silver: "#c0c8d0".to_string(),
            medal_bronze: "#cd8b52".to_string(),
            error: "#ff6b6b".to_string(),
            warning: "#e5c07b".to_string(),
            success: "#7bd88f".to_string(),
        }
    }
}

impl ThemeColors {
    pub fn parse_color(hex: &str) -> Color {
        let hex = hex.trim_start_matches('#');
        if hex.len() == 6
            && let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            )
        {
            return Color::Rgb(r, g, b);
        }
        Color::White
    }

    pub fn bg(&self) -> Color { Self::parse_color(&self.bg) }
    pub fn fg(&self) -> Color { Self::parse_color(&self.fg) }
    pub fn text_correct(&self) -> Color { Self::parse_color(&self.text_correct) }
    pub fn text_corrected(&self) -> Color { Self::parse_color(&self.text_corrected) }
    pub fn text_incorrect(&self) -> Color { Self::parse_color(&self.text_incorrect) }
    pub fn text_incorrect_bg(&self) -> Color { Self::parse_color(&self.text_incorrect_bg) }
    pub fn text_pending(&self) -> Color { Self::parse_color(&self.text_pending) }
    pub fn text_cursor_bg(&self) -> Color { Self::parse_color(&self.text_cursor_bg) }
    pub fn text_cursor_fg(&self) -> Color { Self::parse_color(&self.text_cursor_fg) }
    pub fn accent(&self) -> Color { Self::parse_color(&self.accent) }
    pub fn accent_dim(&self) -> Color { Self::parse_color(&self.accent_dim) }
    pub fn border(&self) -> Color { Self::parse_color(&self.border) }
    pub fn border_focused(&self) -> Color { Self::parse_color(&self.border_focused) }
    pub fn bar_filled(&self) -> Color { Self::parse_color(&self.bar_filled) }
    pub fn bar_empty(&self) -> Color { Self::parse_color(&self.bar_empty) }
    pub fn lives(&self) -> Color { Self::parse_color(&self.lives) }
    pub fn error(&self) -> Color { Self::parse_color(&self.error) }
    pub fn warning(&self) -> Color { Self::parse_color(&self.warning) }
    pub fn success(&self) -> Color { Self::parse_color(&self.success) }

    pub fn medal(&self, medal: Medal) -> Color {
        match medal {
            Medal::Gold => Self::parse_color(&self.medal_gold),
            Medal::Silver => Self::parse_color(&self.medal_silver),
            Medal::Bronze => Self::parse_color(&self.medal_bronze),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_themes_parse() {
        let names = Theme::available_themes();
        assert!(names.contains(&"pond".to_string()));
        for name in names {
            assert!(Theme::load(&name).is_some(), "theme {name} failed to parse");
        }
    }

    #[test]
    fn test_partial_theme_inherits_defaults() {
        let theme: Theme = toml::from_str("name = \"x\"\n[colors]\nbg = \"#000000\"\n").unwrap();
        assert_eq!(theme.colors.bg(), Color::Rgb(0, 0, 0));
        assert_eq!(theme.colors.medal_gold, ThemeColors::default().medal_gold);
    }

    #[test]
    fn test_bad_hex_is_white() {
        assert_eq!(ThemeColors::parse_color("#zzz"), Color::White);
    }
}
