//! Candidate list overlay for a typeahead field.
//!
//! The list is placed below the field when it fits, otherwise above. When
//! placed above, rows are drawn bottom-up so row 0 stays next to the field.
//! The computed [`DropdownLayout`] is kept by the host for click hit-testing
//! and fed back to the control as its dropdown direction.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::catalog::Record;
use crate::typeahead::DropdownDirection;
use crate::ui::theme::theme;

/// Text shown for one candidate row.
pub trait RowContent {
    /// Left column.
    fn primary(&self) -> &str;

    /// Right column, if any.
    fn secondary(&self) -> Option<&str> {
        None
    }
}

impl RowContent for Record {
    fn primary(&self) -> &str {
        &self.name
    }

    fn secondary(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl RowContent for String {
    fn primary(&self) -> &str {
        self
    }
}

/// Where a dropdown was drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropdownLayout {
    /// Outer area including borders.
    pub area: Rect,
    /// Row area inside the borders.
    pub inner: Rect,
    pub direction: DropdownDirection,
    /// Index of the first candidate shown.
    pub offset: usize,
    /// Number of rows shown.
    pub shown: usize,
}

impl DropdownLayout {
    /// Place a list of `count` candidates next to `field` within `screen`.
    ///
    /// Scrolls so `focused` stays in view. Returns `None` when there is
    /// nothing to show or no room for a single row.
    pub fn place(
        field: Rect,
        screen: Rect,
        count: usize,
        max_visible: usize,
        focused: Option<usize>,
    ) -> Option<Self> {
        if count == 0 || max_visible == 0 {
            return None;
        }

        let wanted = (count.min(max_visible) + 2) as u16;
        let space_below = screen.bottom().saturating_sub(field.bottom());
        let space_above = field.y.saturating_sub(screen.y);

        let (area, direction) = if space_below >= wanted || space_below >= space_above {
            let height = wanted.min(space_below);
            (
                Rect::new(field.x, field.bottom(), field.width, height),
                DropdownDirection::BELOW,
            )
        } else {
            let height = wanted.min(space_above);
            (
                Rect::new(field.x, field.y - height, field.width, height),
                DropdownDirection::ABOVE,
            )
        };
        if area.height < 3 {
            return None;
        }

        let inner = Rect::new(area.x + 1, area.y + 1, area.width.saturating_sub(2), area.height - 2);
        let rows = inner.height as usize;
        let offset = match focused {
            Some(index) if index >= rows => index + 1 - rows,
            _ => 0,
        };

        Some(Self {
            area,
            inner,
            direction,
            offset,
            shown: rows.min(count - offset),
        })
    }

    /// Terminal line of candidate `index`, if shown.
    pub fn line_of(&self, index: usize) -> Option<u16> {
        if index < self.offset || index >= self.offset + self.shown {
            return None;
        }
        let k = (index - self.offset) as u16;
        Some(if self.direction.above {
            self.inner.bottom() - 1 - k
        } else {
            self.inner.y + k
        })
    }

    /// Candidate index drawn at a terminal cell.
    pub fn row_at(&self, column: u16, row: u16) -> Option<usize> {
        let inside_x = column >= self.inner.x && column < self.inner.right();
        let inside_y = row >= self.inner.y && row < self.inner.bottom();
        if !inside_x || !inside_y {
            return None;
        }
        (self.offset..self.offset + self.shown).find(|&index| self.line_of(index) == Some(row))
    }
}

/// Draw the candidate list into `layout`.
pub fn render_dropdown<T: RowContent>(
    frame: &mut Frame,
    layout: &DropdownLayout,
    candidates: &[T],
    focused: Option<usize>,
) {
    let t = theme();
    frame.render_widget(Clear, layout.area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(t.border_focused))
        .style(Style::default().bg(t.bg));
    frame.render_widget(block, layout.area);

    let width = layout.inner.width as usize;
    let primary_width = width * 3 / 5;
    let mut lines = vec![Line::default(); layout.inner.height as usize];

    for (index, item) in candidates
        .iter()
        .enumerate()
        .skip(layout.offset)
        .take(layout.shown)
    {
        let Some(y) = layout.line_of(index) else {
            continue;
        };
        let style = if focused == Some(index) {
            Style::default()
                .fg(t.bg)
                .bg(t.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(t.fg).bg(t.bg)
        };
        let secondary = item.secondary().unwrap_or_default();
        lines[(y - layout.inner.y) as usize] = Line::from(vec![
            Span::styled(pad(item.primary(), primary_width), style),
            Span::styled(
                pad(secondary, width.saturating_sub(primary_width)),
                style.fg(if focused == Some(index) { t.bg } else { t.muted }),
            ),
        ]);
    }

    frame.render_widget(Paragraph::new(lines), layout.inner);
}

/// Truncate or right-pad `text` to exactly `width` chars.
fn pad(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count > width {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        if width > 0 {
            cut.push('…');
        }
        cut
    } else {
        format!("{}{}", text, " ".repeat(width - count))
    }
}

#[cfg(test)]
mod tests {
    use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};

    use super::*;

    const SCREEN: Rect = Rect {
        x: 0,
        y: 0,
        width: 30,
        height: 20,
    };

    fn line_text(buffer: &Buffer, y: u16) -> String {
        (0..buffer.area.width)
            .map(|x| buffer[(x, y)].symbol())
            .collect::<String>()
    }

    #[test]
    fn test_places_below_when_room() {
        let field = Rect::new(0, 2, 30, 3);
        let layout = DropdownLayout::place(field, SCREEN, 3, 8, None).unwrap();
        assert_eq!(layout.direction, DropdownDirection::BELOW);
        assert_eq!(layout.area, Rect::new(0, 5, 30, 5));
        assert_eq!(layout.shown, 3);
    }

    #[test]
    fn test_places_above_near_bottom() {
        let field = Rect::new(0, 16, 30, 3);
        let layout = DropdownLayout::place(field, SCREEN, 5, 8, None).unwrap();
        assert_eq!(layout.direction, DropdownDirection::ABOVE);
        assert_eq!(layout.area.bottom(), 16);
        assert_eq!(layout.shown, 5);
    }

    #[test]
    fn test_above_puts_first_row_next_to_field() {
        let field = Rect::new(0, 16, 30, 3);
        let layout = DropdownLayout::place(field, SCREEN, 3, 8, None).unwrap();
        assert_eq!(layout.line_of(0), Some(14));
        assert_eq!(layout.line_of(2), Some(12));
        assert_eq!(layout.row_at(5, 14), Some(0));
    }

    #[test]
    fn test_nothing_to_place() {
        let field = Rect::new(0, 2, 30, 3);
        assert!(DropdownLayout::place(field, SCREEN, 0, 8, None).is_none());
        let full = Rect::new(0, 0, 30, 20);
        assert!(DropdownLayout::place(full, SCREEN, 4, 8, None).is_none());
    }

    #[test]
    fn test_scrolls_to_keep_focus_visible() {
        let field = Rect::new(0, 0, 30, 3);
        let layout = DropdownLayout::place(field, SCREEN, 12, 4, Some(6)).unwrap();
        assert_eq!(layout.offset, 3);
        assert_eq!(layout.shown, 4);
        assert_eq!(layout.line_of(2), None);
        assert_eq!(layout.line_of(6), Some(layout.inner.y + 3));
    }

    #[test]
    fn test_row_at_ignores_borders_and_blank_space() {
        let field = Rect::new(0, 0, 30, 3);
        let layout = DropdownLayout::place(field, SCREEN, 2, 8, None).unwrap();
        assert_eq!(layout.row_at(3, layout.inner.y), Some(0));
        assert_eq!(layout.row_at(3, layout.inner.y + 1), Some(1));
        assert_eq!(layout.row_at(0, layout.inner.y), None);
        assert_eq!(layout.row_at(3, layout.area.y), None);
    }

    #[test]
    fn test_pad() {
        assert_eq!(pad("Oslo", 6), "Oslo  ");
        assert_eq!(pad("Copenhagen", 5), "Cope…");
        assert_eq!(pad("abc", 0), "");
    }

    #[test]
    fn test_render_draws_two_columns() {
        let backend = TestBackend::new(30, 10);
        let mut terminal = Terminal::new(backend).unwrap();
        let field = Rect::new(0, 0, 30, 3);
        let screen = Rect::new(0, 0, 30, 10);
        let rows = vec![
            Record::new("Oslo", Some("Norway")),
            Record::new("Osaka", Some("Japan")),
        ];
        let layout = DropdownLayout::place(field, screen, rows.len(), 8, Some(1)).unwrap();

        terminal
            .draw(|frame| render_dropdown(frame, &layout, &rows, Some(1)))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let first = line_text(buffer, layout.inner.y);
        assert!(first.contains("Oslo"));
        assert!(first.contains("Norway"));
        let second = line_text(buffer, layout.inner.y + 1);
        assert!(second.contains("Osaka"));
        let x = layout.inner.x;
        assert_eq!(buffer[(x, layout.inner.y + 1)].bg, theme().accent);
    }
}
