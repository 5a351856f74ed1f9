//! Hotkey bar and toast stack

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

use crate::app::Toast;
use crate::ui::theme::GameTheme;

/// Bottom line with hotkeys and the latest status message
pub struct HotkeyBarWidget<'a> {
    hotkeys: &'a [(&'a str, &'a str)],
    status: Option<&'a str>,
    theme: &'a GameTheme,
}

impl<'a> HotkeyBarWidget<'a> {
    pub fn new(hotkeys: &'a [(&'a str, &'a str)], theme: &'a GameTheme) -> Self {
        Self {
            hotkeys,
            status: None,
            theme,
        }
    }

    pub fn status(mut self, status: Option<&'a str>) -> Self {
        self.status = status;
        self
    }
}

impl Widget for HotkeyBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut spans = Vec::new();
        for (key, label) in self.hotkeys {
            spans.push(Span::styled(format!(" {key} "), self.theme.title_style()));
            spans.push(Span::styled(format!("{label} "), self.theme.system_style()));
        }
        if let Some(status) = self.status {
            spans.push(Span::styled(format!(" | {status}"), self.theme.story_style()));
        }
        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}

/// Stacked transient notifications, newest last
pub struct ToastWidget<'a> {
    toasts: &'a [&'a Toast],
    theme: &'a GameTheme,
}

impl<'a> ToastWidget<'a> {
    pub fn new(toasts: &'a [&'a Toast], theme: &'a GameTheme) -> Self {
        Self { toasts, theme }
    }
}

impl Widget for ToastWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut y = area.y;
        for toast in self.toasts {
            if y + 3 > area.y + area.height {
                break;
            }
            let rect = Rect {
                x: area.x,
                y,
                width: area.width,
                height: 3,
            };
            let style = self.theme.toast_style(toast.is_error);

            Clear.render(rect, buf);
            Paragraph::new(Span::styled(toast.message.as_str(), style))
                .block(Block::default().borders(Borders::ALL).border_style(style))
                .wrap(Wrap { trim: true })
                .render(rect, buf);
            y += 3;
        }
    }
}
