//! Colors and styles of the TUI, one palette per theme variant.

use ratatui::style::{Color, Modifier, Style};
use std::sync::RwLock;

use crate::config::ThemeVariant;

static THEME_VARIANT: RwLock<ThemeVariant> = RwLock::new(ThemeVariant::Dark);

/// Initialize the theme variant (call once at startup)
pub fn init_theme(variant: ThemeVariant) {
    if let Ok(mut guard) = THEME_VARIANT.write() {
        *guard = variant;
    }
}

pub fn current_theme() -> ThemeVariant {
    THEME_VARIANT.read().map(|g| *g).unwrap_or_default()
}

/// Colors that vary by theme
pub mod colors {
    use super::*;

    pub fn bg_selection() -> Color {
        match current_theme() {
            ThemeVariant::Dark => Color::Rgb(69, 71, 90),
            ThemeVariant::HighContrast => Color::White,
        }
    }

    pub fn fg_selection() -> Color {
        match current_theme() {
            ThemeVariant::Dark => Color::Rgb(205, 214, 244),
            ThemeVariant::HighContrast => Color::Black,
        }
    }

    pub fn bg_status() -> Color {
        match current_theme() {
            ThemeVariant::Dark => Color::Rgb(24, 24, 37),
            ThemeVariant::HighContrast => Color::Black,
        }
    }

    pub fn bg_error() -> Color {
        Color::Red
    }

    pub fn fg_primary() -> Color {
        match current_theme() {
            ThemeVariant::Dark => Color::Rgb(205, 214, 244),
            ThemeVariant::HighContrast => Color::White,
        }
    }

    pub fn fg_secondary() -> Color {
        match current_theme() {
            ThemeVariant::Dark => Color::Rgb(166, 173, 200),
            ThemeVariant::HighContrast => Color::White,
        }
    }

    pub fn fg_muted() -> Color {
        match current_theme() {
            ThemeVariant::Dark => Color::Rgb(108, 112, 134),
            ThemeVariant::HighContrast => Color::Gray,
        }
    }

    pub fn fg_accent() -> Color {
        match current_theme() {
            ThemeVariant::Dark => Color::Rgb(137, 180, 250),
            ThemeVariant::HighContrast => Color::Cyan,
        }
    }

    pub fn fg_sender() -> Color {
        match current_theme() {
            ThemeVariant::Dark => Color::Rgb(250, 179, 135),
            ThemeVariant::HighContrast => Color::Yellow,
        }
    }

    pub fn border() -> Color {
        match current_theme() {
            ThemeVariant::Dark => Color::Rgb(49, 50, 68),
            ThemeVariant::HighContrast => Color::Gray,
        }
    }

    pub fn border_focused() -> Color {
        match current_theme() {
            ThemeVariant::Dark => Color::Rgb(180, 190, 254),
            ThemeVariant::HighContrast => Color::White,
        }
    }
}

/// Pre-composed styles for common UI elements
pub struct Theme;

impl Theme {
    pub fn selected() -> Style {
        Style::default()
            .bg(colors::bg_selection())
            .fg(colors::fg_selection())
    }

    pub fn text() -> Style {
        Style::default().fg(colors::fg_primary())
    }

    pub fn text_secondary() -> Style {
        Style::default().fg(colors::fg_secondary())
    }

    pub fn text_muted() -> Style {
        Style::default().fg(colors::fg_muted())
    }

    pub fn text_accent() -> Style {
        Style::default().fg(colors::fg_accent())
    }

    pub fn title() -> Style {
        Self::text().add_modifier(Modifier::BOLD)
    }

    /// Sender line above a message group
    pub fn sender() -> Style {
        Style::default()
            .fg(colors::fg_sender())
            .add_modifier(Modifier::BOLD)
    }

    /// Body of a media message, shown by its placeholder text
    pub fn media() -> Style {
        Self::text_muted().add_modifier(Modifier::ITALIC)
    }

    pub fn date_separator() -> Style {
        Self::text_accent().add_modifier(Modifier::BOLD)
    }

    /// The "older/newer messages" rows
    pub fn affordance() -> Style {
        Self::text_accent().add_modifier(Modifier::UNDERLINED)
    }

    pub fn status_bar() -> Style {
        Style::default()
            .bg(colors::bg_status())
            .fg(colors::fg_primary())
    }

    pub fn error_bar() -> Style {
        Style::default()
            .bg(colors::bg_error())
            .fg(colors::fg_primary())
    }

    pub fn border(focused: bool) -> Style {
        if focused {
            Style::default().fg(colors::border_focused())
        } else {
            Style::default().fg(colors::border())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_high_contrast_palette() {
        init_theme(ThemeVariant::HighContrast);
        assert_eq!(current_theme(), ThemeVariant::HighContrast);
        assert_eq!(colors::bg_selection(), Color::White);
        assert_eq!(Theme::selected().fg, Some(Color::Black));
        init_theme(ThemeVariant::Dark);
        assert_eq!(current_theme(), ThemeVariant::Dark);
    }
}
