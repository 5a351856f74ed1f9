//! Numbered selection list for choices and scene objects

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::ui::theme::GameTheme;

/// A titled list with one highlighted row
pub struct ChoiceListWidget<'a> {
    title: &'a str,
    items: Vec<&'a str>,
    selected: usize,
    numbered: bool,
    focused: bool,
    theme: &'a GameTheme,
}

impl<'a> ChoiceListWidget<'a> {
    pub fn new(title: &'a str, items: Vec<&'a str>, theme: &'a GameTheme) -> Self {
        Self {
            title,
            items,
            selected: 0,
            numbered: false,
            focused: false,
            theme,
        }
    }

    pub fn selected(mut self, selected: usize) -> Self {
        self.selected = selected;
        self
    }

    /// Prefix rows with their number key
    pub fn numbered(mut self, numbered: bool) -> Self {
        self.numbered = numbered;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

impl Widget for ChoiceListWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(format!(" {} ", self.title))
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.focused));

        let lines: Vec<Line> = self
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let is_selected = self.focused && i == self.selected;
                let marker = if is_selected { "> " } else { "  " };
                let text = if self.numbered {
                    format!("{marker}{}. {item}", i + 1)
                } else {
                    format!("{marker}{item}")
                };
                Line::from(Span::styled(text, self.theme.item_style(is_selected)))
            })
            .collect();

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
