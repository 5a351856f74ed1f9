//! Story prose widget with the typewriter cursor

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use hampa_core::reveal::segments;

use crate::ui::theme::GameTheme;

/// Drop markup tags, keeping their inner text.
pub fn strip_markup(text: &str) -> String {
    segments(text)
        .into_iter()
        .filter(|segment| !(segment.len() > 1 && segment.starts_with('<')))
        .collect()
}

/// Widget for displaying the revealed story text
pub struct NarrativeWidget<'a> {
    text: &'a str,
    title: &'a str,
    theme: &'a GameTheme,
    revealing: bool,
    focused: bool,
}

impl<'a> NarrativeWidget<'a> {
    pub fn new(text: &'a str, title: &'a str, theme: &'a GameTheme) -> Self {
        Self {
            text,
            title,
            theme,
            revealing: false,
            focused: false,
        }
    }

    pub fn revealing(mut self, revealing: bool) -> Self {
        self.revealing = revealing;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

impl Widget for NarrativeWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(Span::styled(
                format!(" {} ", self.title),
                self.theme.location_style(),
            ))
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.focused));

        let inner = block.inner(area);
        block.render(area, buf);

        let style = self.theme.story_style();
        let mut lines: Vec<Line> = strip_markup(self.text)
            .lines()
            .map(|line| Line::from(Span::styled(line.to_string(), style)))
            .collect();

        if self.revealing {
            let cursor = Span::styled("▌", style.add_modifier(Modifier::DIM));
            match lines.last_mut() {
                Some(last) => last.spans.push(cursor),
                None => lines.push(Line::from(cursor)),
            }
        }

        // Keep the newest text in view while it is still growing.
        let visible_height = inner.height as usize;
        let wrapped = wrapped_height(&lines, inner.width as usize);
        let scroll = wrapped.saturating_sub(visible_height);

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((scroll as u16, 0))
            .render(inner, buf);
    }
}

fn wrapped_height(lines: &[Line], width: usize) -> usize {
    if width == 0 {
        return 0;
    }
    lines
        .iter()
        .map(|line| line.width().div_ceil(width).max(1))
        .sum()
}
