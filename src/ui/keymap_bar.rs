//! Keymap help bar UI component.

use crate::app::{App, InputMode};
use crate::navigation::ActiveView;
use crate::ui::ThemeColors;
use ratatui::{layout::Rect, style::Style, widgets::Paragraph, Frame};

/// Draw the keymap help bar.
pub(super) fn draw_keymap(f: &mut Frame<'_>, area: Rect, app: &App, colors: &ThemeColors) {
    let keymap_text = match app.input_mode {
        InputMode::ColumnPicker => "jk:nav | Space:toggle | a:all | Enter:apply | Esc:cancel",
        InputMode::JumpToPage | InputMode::PageSize | InputMode::ColumnWidth => {
            "Enter:apply | Esc:cancel"
        },
        InputMode::Normal if app.file_browser_mode => {
            "jk/↑↓:nav | Enter/l:select | h:parent | .:hidden | q:quit"
        },
        InputMode::Normal => match app.navigator.as_ref().and_then(|n| n.active()) {
            Some(ActiveView::Table) => {
                "n/p:page | g:jump | r:rows | c:columns | +-:width | Tab/[]:HDU | i:image | T:theme | q:quit"
            },
            Some(ActiveView::Image) => {
                "+-:zoom | </>:rotate | n/p:image | hjkl:cursor | HJKL:pan | C:palette | i:table | q:quit"
            },
            None => "T:theme | q:quit",
        },
    };

    let paragraph =
        Paragraph::new(keymap_text).style(Style::default().fg(colors.gray).bg(colors.bg0));

    f.render_widget(paragraph, area);
}
