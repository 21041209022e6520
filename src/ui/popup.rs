//! Column selection popup.

use crate::app::ColumnPicker;
use crate::ui::ThemeColors;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, List, ListItem},
    Frame,
};

/// Draw the column picker over the grid.
pub(super) fn draw_column_picker(f: &mut Frame<'_>, picker: &mut ColumnPicker, colors: &ThemeColors) {
    let area = centered_rect(50, 70, f.area());
    let viewport_height = area.height.saturating_sub(2) as usize;
    picker.adjust_scroll(viewport_height);

    let items: Vec<ListItem<'_>> = picker
        .names
        .iter()
        .zip(&picker.selected)
        .enumerate()
        .skip(picker.scroll)
        .take(viewport_height)
        .map(|(idx, (name, selected))| {
            let mark = if *selected { "[x]" } else { "[ ]" };
            let style = if idx == picker.cursor {
                Style::default()
                    .fg(colors.bg0)
                    .bg(colors.yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(colors.fg0)
            };
            ListItem::new(Line::from(format!("{} {}", mark, name))).style(style)
        })
        .collect();

    let selected = picker.selected.iter().filter(|s| **s).count();
    let title = format!(" Columns ({} of {} selected) ", selected, picker.names.len());

    let list = List::new(items).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(colors.yellow))
            .style(Style::default().bg(colors.bg0)),
    );

    f.render_widget(Clear, area);
    f.render_widget(list, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
