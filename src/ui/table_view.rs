//! Paginated table grid.

use crate::app::App;
use crate::ui::formatters::{format_cell, format_number, truncate_to_width};
use crate::ui::ThemeColors;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table},
    Frame,
};

/// Draw the current page.
pub(super) fn draw_table(f: &mut Frame<'_>, app: &App, area: Rect, colors: &ThemeColors) {
    let Some(page) = app.page.as_ref() else {
        return;
    };
    let Some(nav) = app.navigator.as_ref() else {
        return;
    };
    let Some(view) = nav.table_view() else {
        return;
    };

    let col_width = app.column_width.max(1);
    let row_header_width = app.config.table.row_header_width;
    let visible_cols = (area
        .width
        .saturating_sub(row_header_width + 2)
        / (col_width + 1))
        .max(1) as usize;

    let first = app.column_offset.min(page.columns.len().saturating_sub(1));
    let shown: Vec<usize> = (first..page.columns.len()).take(visible_cols).collect();
    let width = col_width as usize;

    let descriptor = app
        .session
        .as_ref()
        .and_then(|s| s.catalog().describe(view.hdu).ok());

    let mut header_cells = vec![Cell::from("row").style(Style::default().fg(colors.green))];
    for &i in &shown {
        let name = &page.columns[i];
        let unit = descriptor
            .and_then(|d| d.column(name))
            .and_then(|c| c.unit.as_deref());
        let label = match unit {
            Some(unit) => format!("{} [{}]", name, unit),
            None => name.clone(),
        };
        header_cells.push(
            Cell::from(truncate_to_width(&label, width)).style(
                Style::default()
                    .fg(colors.yellow)
                    .add_modifier(Modifier::BOLD),
            ),
        );
    }

    let rows: Vec<Row<'_>> = page
        .rows
        .iter()
        .enumerate()
        .map(|(r, values)| {
            let mut cells = vec![Cell::from(format!(
                "{:>w$}",
                page.start_row + r,
                w = row_header_width.saturating_sub(1) as usize
            ))
            .style(Style::default().fg(colors.green))];
            for &i in &shown {
                let text = values.get(i).map(|v| format_cell(v, width)).unwrap_or_default();
                cells.push(Cell::from(text).style(Style::default().fg(colors.aqua)));
            }
            Row::new(cells)
        })
        .collect();

    let mut widths = vec![Constraint::Length(row_header_width)];
    widths.extend(shown.iter().map(|_| Constraint::Length(col_width)));

    let name = descriptor
        .and_then(|d| d.name.as_deref())
        .map(|n| format!(" {}", n))
        .unwrap_or_default();
    let title = format!(
        " HDU #{}{} | Page {} of {} | Rows {} | Columns {}-{} of {} ",
        view.hdu,
        name,
        view.page + 1,
        nav.page_count().max(1),
        format_number(page.total_rows),
        first + 1,
        first + shown.len(),
        page.columns.len()
    );

    let body = if page.is_empty() {
        vec![Row::new(vec![
            Cell::from(""),
            Cell::from("(empty page)").style(Style::default().fg(colors.gray)),
        ])]
    } else {
        rows
    };

    let table = Table::new(body, widths)
        .header(Row::new(header_cells).style(Style::default().add_modifier(Modifier::BOLD)))
        .column_spacing(1)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(colors.bg2))
                .title(title)
                .title_style(Style::default().fg(colors.yellow)),
        )
        .style(Style::default().fg(colors.fg0).bg(colors.bg0));

    f.render_widget(table, area);
}
