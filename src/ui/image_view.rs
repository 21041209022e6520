//! Image canvas and header info panel.

use crate::app::App;
use crate::image::render_window;
use crate::ui::ThemeColors;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Draw the current image with its info panel.
pub(super) fn draw_image(f: &mut Frame<'_>, app: &mut App, area: Rect, colors: &ThemeColors) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(app.config.image.info_width),
        ])
        .split(area);

    draw_canvas(f, app, chunks[0], colors);
    draw_info(f, app, chunks[1], colors);
}

fn draw_canvas(f: &mut Frame<'_>, app: &mut App, area: Rect, colors: &ThemeColors) {
    let pixel_width = app.config.image.pixel_width.max(1);
    let title = format!(" {} ", app.image_status());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.bg2))
        .title(title)
        .title_style(Style::default().fg(colors.yellow))
        .style(Style::default().bg(colors.bg0));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let viewport = (
        usize::from(inner.width / pixel_width),
        usize::from(inner.height),
    );
    if viewport.0 == 0 || viewport.1 == 0 {
        return;
    }

    let Some(state) = app.navigator.as_mut().and_then(|n| n.image_view_mut()) else {
        return;
    };
    if state.viewport() == (0, 0) {
        state.fit_to(viewport.0, viewport.1);
    } else if state.viewport() != viewport {
        state.set_viewport(viewport.0, viewport.1);
    }
    let state = state.clone();

    let Some(image) = app.image.as_ref().filter(|i| i.plane.hdu == state.hdu) else {
        return;
    };

    let mapper = state.mapper();
    let (pan_x, pan_y) = state.pan_offset();
    let raster = render_window(&image.plane, &mapper, pan_x, pan_y, viewport.0, viewport.1);
    let (cursor_x, cursor_y) = state.cursor();

    for y in 0..raster.height() {
        for x in 0..raster.width() {
            let value = raster.get(x, y).unwrap_or(f64::NAN);
            let is_cursor = pan_x + x == cursor_x && pan_y + y == cursor_y;
            for i in 0..pixel_width {
                let screen_x = inner.x + x as u16 * pixel_width + i;
                let screen_y = inner.y + y as u16;
                if let Some(cell) = f.buffer_mut().cell_mut((screen_x, screen_y)) {
                    if is_cursor {
                        cell.set_char('+').set_fg(colors.orange).set_bg(colors.bg0);
                    } else if value.is_finite() {
                        cell.set_char('█').set_fg(app.palette.color(value));
                    } else {
                        cell.set_char('·').set_fg(colors.gray);
                    }
                }
            }
        }
    }

    app.image_area = Some(Rect {
        x: inner.x,
        y: inner.y,
        width: raster.width() as u16 * pixel_width,
        height: raster.height() as u16,
    });
}

fn draw_info(f: &mut Frame<'_>, app: &App, area: Rect, colors: &ThemeColors) {
    let mut lines = vec![Line::from(Span::styled(
        "Cursor",
        Style::default()
            .fg(colors.yellow)
            .add_modifier(Modifier::BOLD),
    ))];
    match app.cursor_readout() {
        Some(readout) => lines.extend(
            readout
                .split(" | ")
                .map(|part| Line::from(Span::styled(part.to_string(), Style::default().fg(colors.aqua)))),
        ),
        None => lines.push(Line::from(Span::styled("-", Style::default().fg(colors.gray)))),
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Header",
        Style::default()
            .fg(colors.yellow)
            .add_modifier(Modifier::BOLD),
    )));
    if let Some(image) = app.image.as_ref() {
        lines.extend(
            image
                .header_lines
                .iter()
                .map(|l| Line::from(Span::styled(l.clone(), Style::default().fg(colors.fg1)))),
        );
    }

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(colors.bg2))
                .title(format!(" Palette: {} ", app.palette.name()))
                .style(Style::default().bg(colors.bg0)),
        )
        .wrap(Wrap { trim: true });

    f.render_widget(paragraph, area);
}
