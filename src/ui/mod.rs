//! User interface rendering.

pub mod formatters;
mod image_view;
mod keymap_bar;
mod popup;
mod status_bar;
mod table_view;
mod theme;

use crate::app::{App, InputMode};
use crate::file_browser::ui::draw_file_browser;
use crate::navigation::ActiveView;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub use theme::ThemeColors;

/// Draw the UI.
pub fn draw(f: &mut Frame<'_>, app: &mut App) {
    let colors = ThemeColors::from_theme(&app.theme);

    // Content, status bar, key map bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1), Constraint::Length(1)])
        .split(f.area());

    app.image_area = None;
    if app.file_browser_mode {
        draw_file_browser(f, &mut app.file_browser, chunks[0], &colors);
    } else if let Some(error) = app.error_message.clone() {
        draw_message(f, chunks[0], "Error", &error, &colors);
    } else {
        match app.navigator.as_ref().and_then(|n| n.active()) {
            Some(ActiveView::Table) => table_view::draw_table(f, app, chunks[0], &colors),
            Some(ActiveView::Image) => image_view::draw_image(f, app, chunks[0], &colors),
            None if app.session.is_some() => draw_message(
                f,
                chunks[0],
                "Nothing to show",
                "No table or image data found",
                &colors,
            ),
            None => draw_message(
                f,
                chunks[0],
                "fitsview",
                "No file loaded. Restart with a FITS file path.",
                &colors,
            ),
        }
    }

    status_bar::draw_status(f, chunks[1], app, &colors);
    keymap_bar::draw_keymap(f, chunks[2], app, &colors);

    if app.input_mode == InputMode::ColumnPicker {
        popup::draw_column_picker(f, &mut app.column_picker, &colors);
    }
}

fn draw_message(f: &mut Frame<'_>, area: Rect, title: &str, message: &str, colors: &ThemeColors) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            title.to_string(),
            Style::default()
                .fg(colors.yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(message.to_string(), Style::default().fg(colors.fg0))),
    ];

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(colors.bg2))
                .style(Style::default().bg(colors.bg0)),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    f.render_widget(paragraph, area);
}
