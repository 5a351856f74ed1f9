//! Screen layout calculations

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Width of the meters and keepsakes column.
const SIDEBAR_WIDTH: u16 = 30;

/// Areas of the in-game screen
#[derive(Debug, Clone, Copy)]
pub struct AppLayout {
    pub title_area: Rect,
    pub story_area: Rect,
    pub objects_area: Option<Rect>,
    pub choices_area: Rect,
    pub sidebar_area: Rect,
    pub toast_area: Rect,
    pub hotkey_bar: Rect,
}

impl AppLayout {
    /// Split `area` for a scene with the given list sizes.
    pub fn calculate(area: Rect, object_count: usize, choice_count: usize) -> Self {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title
                Constraint::Min(8),    // Body
                Constraint::Length(1), // Hotkeys
            ])
            .split(area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(30), Constraint::Length(SIDEBAR_WIDTH)])
            .split(rows[1]);

        let list_height = |count: usize| (count.max(1) as u16).saturating_add(2);
        let objects_height = if object_count > 0 {
            list_height(object_count)
        } else {
            0
        };

        let story_column = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),
                Constraint::Length(objects_height),
                Constraint::Length(list_height(choice_count)),
            ])
            .split(columns[0]);

        let sidebar_area = columns[1];
        let toast_area = Rect {
            x: sidebar_area.x,
            y: sidebar_area.y + sidebar_area.height / 2,
            width: sidebar_area.width,
            height: sidebar_area.height - sidebar_area.height / 2,
        };

        Self {
            title_area: rows[0],
            story_area: story_column[0],
            objects_area: (object_count > 0).then_some(story_column[1]),
            choices_area: story_column[2],
            sidebar_area,
            toast_area,
            hotkey_bar: rows[2],
        }
    }
}

/// A fixed-size rectangle centered in `area`, shrunk to fit.
pub fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_fits_small_area() {
        let area = Rect::new(0, 0, 20, 10);
        let rect = centered_rect_fixed(50, 20, area);
        assert_eq!(rect, area);

        let rect = centered_rect_fixed(10, 4, area);
        assert_eq!(rect, Rect::new(5, 3, 10, 4));
    }

    #[test]
    fn test_objects_area_only_when_present() {
        let area = Rect::new(0, 0, 100, 40);
        assert!(AppLayout::calculate(area, 0, 2).objects_area.is_none());

        let layout = AppLayout::calculate(area, 2, 3);
        let objects = layout.objects_area.expect("Objects area should exist");
        assert_eq!(objects.height, 4);
        assert_eq!(layout.choices_area.height, 5);
        assert_eq!(layout.sidebar_area.width, SIDEBAR_WIDTH);
    }
}
