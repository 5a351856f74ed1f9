//! Color theme and styling for the Ruang Hampa TUI

use ratatui::style::{Color, Modifier, Style};

/// Game UI color theme
#[derive(Debug, Clone)]
pub struct GameTheme {
    // Base colors
    pub foreground: Color,
    pub border: Color,
    pub border_focused: Color,
    pub title: Color,

    // Meter colors
    pub meter_high: Color,
    pub meter_mid: Color,
    pub meter_low: Color,

    // Text colors
    pub story_text: Color,
    pub location_text: Color,
    pub keepsake_text: Color,
    pub system_text: Color,

    // Toast colors
    pub toast_info: Color,
    pub toast_error: Color,

    pub selected: Color,
}

impl Default for GameTheme {
    fn default() -> Self {
        Self {
            foreground: Color::White,
            border: Color::DarkGray,
            border_focused: Color::Cyan,
            title: Color::Gray,

            meter_high: Color::LightBlue,
            meter_mid: Color::Yellow,
            meter_low: Color::Red,

            story_text: Color::White,
            location_text: Color::LightCyan,
            keepsake_text: Color::LightYellow,
            system_text: Color::DarkGray,

            toast_info: Color::Green,
            toast_error: Color::LightRed,

            selected: Color::Cyan,
        }
    }
}

impl GameTheme {
    /// Get style for story prose
    pub fn story_style(&self) -> Style {
        Style::default().fg(self.story_text)
    }

    /// Get style for the location header
    pub fn location_style(&self) -> Style {
        Style::default()
            .fg(self.location_text)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for keepsake names
    pub fn keepsake_style(&self) -> Style {
        Style::default()
            .fg(self.keepsake_text)
            .add_modifier(Modifier::ITALIC)
    }

    /// Get style for hints and system messages
    pub fn system_style(&self) -> Style {
        Style::default()
            .fg(self.system_text)
            .add_modifier(Modifier::DIM)
    }

    /// Get meter color for a value in [0, 100]
    pub fn meter_color(&self, value: i32) -> Color {
        if value > 50 {
            self.meter_high
        } else if value > 20 {
            self.meter_mid
        } else {
            self.meter_low
        }
    }

    /// Get style for a toast
    pub fn toast_style(&self, is_error: bool) -> Style {
        Style::default().fg(if is_error {
            self.toast_error
        } else {
            self.toast_info
        })
    }

    /// Get style for a list row
    pub fn item_style(&self, selected: bool) -> Style {
        if selected {
            Style::default()
                .fg(self.selected)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.foreground)
        }
    }

    /// Get border style
    pub fn border_style(&self, focused: bool) -> Style {
        Style::default().fg(if focused {
            self.border_focused
        } else {
            self.border
        })
    }

    /// Get title style
    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.title)
            .add_modifier(Modifier::BOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meter_color_bands() {
        let theme = GameTheme::default();
        assert_eq!(theme.meter_color(100), theme.meter_high);
        assert_eq!(theme.meter_color(50), theme.meter_mid);
        assert_eq!(theme.meter_color(21), theme.meter_mid);
        assert_eq!(theme.meter_color(20), theme.meter_low);
        assert_eq!(theme.meter_color(0), theme.meter_low);
    }
}
