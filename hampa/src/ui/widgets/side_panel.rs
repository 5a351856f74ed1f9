//! Side panel with meters, keepsakes and the scene image

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
};

use hampa_core::state::Relationships;
use hampa_core::story::Keepsake;

use crate::app::SceneImage;
use crate::ui::theme::GameTheme;

/// Mental energy, relationships, keepsakes and image status
pub struct SidePanelWidget<'a> {
    energy: i32,
    relationships: Relationships,
    keepsakes: &'a [Keepsake],
    image: &'a SceneImage,
    theme: &'a GameTheme,
}

impl<'a> SidePanelWidget<'a> {
    pub fn new(
        energy: i32,
        relationships: Relationships,
        keepsakes: &'a [Keepsake],
        image: &'a SceneImage,
        theme: &'a GameTheme,
    ) -> Self {
        Self {
            energy,
            relationships,
            keepsakes,
            image,
            theme,
        }
    }

    fn meter(&self, label: String, value: i32) -> Gauge<'static> {
        Gauge::default()
            .gauge_style(Style::default().fg(self.theme.meter_color(value)))
            .label(format!("{label} {value}"))
            .percent(value.clamp(0, 100) as u16)
    }
}

impl Widget for SidePanelWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Banyu ")
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(false));

        let inner = block.inner(area);
        block.render(area, buf);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // Image
                Constraint::Length(2), // Energy
                Constraint::Length(4), // Relationships
                Constraint::Min(0),    // Keepsakes
            ])
            .split(inner);

        let image_line = match self.image {
            SceneImage::None => Line::from(""),
            SceneImage::Loading(key) => Line::from(Span::styled(
                format!("[memuat {key}]"),
                self.theme.system_style(),
            )),
            SceneImage::Ready(path) => Line::from(Span::styled(
                format!(
                    "[{}]",
                    path.file_name()
                        .map(|name| name.to_string_lossy())
                        .unwrap_or_default()
                ),
                self.theme.system_style(),
            )),
            SceneImage::Failed(key) => Line::from(Span::styled(
                format!("[{key} tidak tersedia]"),
                self.theme.toast_style(true),
            )),
        };
        Paragraph::new(image_line).render(chunks[0], buf);

        let energy_row = Rect {
            height: 1,
            ..chunks[1]
        };
        self.meter("Energi mental".to_string(), self.energy)
            .render(energy_row, buf);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1); 3])
            .split(chunks[2]);
        for (row, (character, value)) in rows.iter().zip(self.relationships.iter()) {
            self.meter(character.to_string(), value).render(*row, buf);
        }

        let mut lines = vec![Line::from(Span::styled(
            format!("Kenang-kenangan ({})", self.keepsakes.len()),
            self.theme.title_style(),
        ))];
        if self.keepsakes.is_empty() {
            lines.push(Line::from(Span::styled("-", self.theme.system_style())));
        }
        for keepsake in self.keepsakes {
            lines.push(Line::from(Span::styled(
                format!("* {}", keepsake.name),
                self.theme.keepsake_style(),
            )));
        }
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .render(chunks[3], buf);
    }
}
