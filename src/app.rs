//! Application state and logic.
//!
//! Every navigation action runs against a copy of the [`Navigator`]; the
//! data for the new state is read first and the copy is committed only if
//! that read succeeds. A failed read leaves the visible state untouched
//! and reports the error on the status line.

use std::path::PathBuf;

use ratatui::layout::Rect;

use crate::config::ViewerConfig;
use crate::error::{FitsViewError, Result};
use crate::file_browser::FileBrowserState;
use crate::image::{ImagePlane, MappedPixel};
use crate::navigation::{ActiveView, Navigator};
use crate::session::Session;
use crate::table::{PageRequest, PageResult};
use crate::ui::formatters::{format_number, format_pixel_value};
use crate::util::ColorPalette;
use crate::wcs::Resolver;

/// Application theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    /// Gruvbox dark theme.
    GruvboxDark,
    /// Gruvbox light theme.
    GruvboxLight,
}

impl Theme {
    /// Get the next theme in the cycle.
    pub fn next(self) -> Self {
        match self {
            Theme::GruvboxDark => Theme::GruvboxLight,
            Theme::GruvboxLight => Theme::GruvboxDark,
        }
    }

    /// Get the theme name.
    pub fn name(self) -> &'static str {
        match self {
            Theme::GruvboxDark => "Gruvbox Dark",
            Theme::GruvboxLight => "Gruvbox Light",
        }
    }
}

/// What keyboard input is currently feeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Normal key bindings.
    Normal,
    /// Typing a 1-based page number.
    JumpToPage,
    /// Typing a rows-per-page value.
    PageSize,
    /// Typing a column width.
    ColumnWidth,
    /// Column selection popup.
    ColumnPicker,
}

impl InputMode {
    /// Prompt label for text input modes.
    pub fn prompt(self) -> Option<&'static str> {
        match self {
            InputMode::JumpToPage => Some("Jump to page: "),
            InputMode::PageSize => Some("Rows per page: "),
            InputMode::ColumnWidth => Some("Column width: "),
            InputMode::Normal | InputMode::ColumnPicker => None,
        }
    }
}

/// Column selection popup state.
#[derive(Debug, Clone, Default)]
pub struct ColumnPicker {
    /// Every column of the table, in file order.
    pub names: Vec<String>,
    /// Selection flag per column.
    pub selected: Vec<bool>,
    /// Cursor position.
    pub cursor: usize,
    /// Scroll offset.
    pub scroll: usize,
}

impl ColumnPicker {
    /// Picker over `names` with `current` pre-selected.
    pub fn new(names: Vec<String>, current: &[String]) -> Self {
        let selected = names.iter().map(|n| current.contains(n)).collect();
        Self {
            names,
            selected,
            cursor: 0,
            scroll: 0,
        }
    }

    /// Move cursor up.
    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Move cursor down.
    pub fn cursor_down(&mut self) {
        if self.cursor + 1 < self.names.len() {
            self.cursor += 1;
        }
    }

    /// Toggle the column under the cursor.
    pub fn toggle(&mut self) {
        if let Some(flag) = self.selected.get_mut(self.cursor) {
            *flag = !*flag;
        }
    }

    /// Select all columns, or none if all are selected.
    pub fn toggle_all(&mut self) {
        let all = self.selected.iter().all(|&s| s);
        self.selected.iter_mut().for_each(|s| *s = !all);
    }

    /// Selected names in file order.
    pub fn selection(&self) -> Vec<String> {
        self.names
            .iter()
            .zip(&self.selected)
            .filter(|(_, s)| **s)
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// Keep the cursor inside a viewport of `viewport_height` rows.
    pub fn adjust_scroll(&mut self, viewport_height: usize) {
        if viewport_height == 0 {
            return;
        }
        if self.cursor < self.scroll {
            self.scroll = self.cursor;
        }
        if self.cursor >= self.scroll + viewport_height {
            self.scroll = self.cursor + 1 - viewport_height;
        }
    }
}

/// The image currently shown, with its resolver and header summary.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    /// Decoded plane.
    pub plane: ImagePlane,
    /// Astrometric resolver for the HDU.
    pub resolver: Resolver,
    /// Filtered header lines for the info panel.
    pub header_lines: Vec<String>,
}

impl LoadedImage {
    fn load(session: &Session, hdu: usize, commentary_limit: usize) -> Result<Self> {
        Ok(Self {
            plane: session.load_image(hdu)?,
            resolver: session.resolver(hdu)?,
            header_lines: session.header(hdu)?.summary_lines(commentary_limit),
        })
    }
}

/// Application state.
#[derive(Debug)]
pub struct App {
    /// Current file path.
    pub file_path: Option<PathBuf>,
    /// Open file.
    pub session: Option<Session>,
    /// Navigation state for the open file.
    pub navigator: Option<Navigator>,
    /// Page currently shown.
    pub page: Option<PageResult>,
    page_request: Option<PageRequest>,
    /// Image currently shown.
    pub image: Option<LoadedImage>,
    /// File picker state.
    pub file_browser: FileBrowserState,
    /// File picker is shown.
    pub file_browser_mode: bool,
    /// Where keyboard input goes.
    pub input_mode: InputMode,
    /// Text typed at a prompt.
    pub input: String,
    /// Column selection popup.
    pub column_picker: ColumnPicker,
    /// Status message.
    pub status: String,
    /// Error message shown instead of content.
    pub error_message: Option<String>,
    /// Current theme.
    pub theme: Theme,
    /// Image palette.
    pub palette: ColorPalette,
    /// Width of table columns in characters.
    pub column_width: u16,
    /// First selected column shown in the grid.
    pub column_offset: usize,
    /// Viewer configuration.
    pub config: ViewerConfig,
    /// Screen area of the drawn raster (for mouse mapping).
    pub image_area: Option<Rect>,
}

impl App {
    /// Create an application with nothing open.
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            file_path: None,
            session: None,
            navigator: None,
            page: None,
            page_request: None,
            image: None,
            file_browser: FileBrowserState::new(),
            file_browser_mode: false,
            input_mode: InputMode::Normal,
            input: String::new(),
            column_picker: ColumnPicker::default(),
            status: "Ready".to_string(),
            error_message: None,
            theme: Theme::GruvboxDark,
            palette: ColorPalette::default(),
            column_width: config.table.column_width,
            column_offset: 0,
            config,
            image_area: None,
        }
    }

    /// Show the file picker at `dir`, or the working directory.
    pub fn open_file_browser(&mut self, dir: Option<PathBuf>) {
        if let Some(dir) = dir {
            self.file_browser.current_dir = dir;
        }
        self.file_browser.load_directory();
        self.file_browser_mode = true;
        self.status = format!("Browsing: {}", self.file_browser.current_dir.display());
    }

    /// Open `path` as the current file.
    pub fn load_file(&mut self, path: PathBuf) {
        self.status = format!("Loading {}...", display_name(&path));
        match Session::open(&path) {
            Ok(session) => self.attach(session),
            Err(e) => {
                tracing::error!("Error loading file: {}", e);
                self.error_message = Some(format!("Error loading file: {}", e));
                self.status = "Error loading file".to_string();
            },
        }
    }

    /// Show an already opened session.
    pub fn attach(&mut self, session: Session) {
        let navigator = Navigator::new(session.catalog(), &self.config);
        let path = session.path().to_path_buf();
        let hdu_count = session.catalog().len();

        if let Some(mut previous) = self.session.replace(session) {
            previous.close();
        }
        self.navigator = None;
        self.page = None;
        self.page_request = None;
        self.image = None;
        self.error_message = None;
        self.file_path = Some(path.clone());
        if let Some(parent) = path.parent() {
            self.file_browser.current_dir = parent.to_path_buf();
        }

        match self.commit(navigator) {
            Ok(()) => {
                self.status = match self.navigator.as_ref().and_then(Navigator::active) {
                    Some(_) => format!("{} loaded ({} HDUs)", display_name(&path), hdu_count),
                    None => "No table or image data found".to_string(),
                };
                tracing::info!("File loaded successfully");
            },
            Err(e) => {
                tracing::error!("Error reading {}: {}", path.display(), e);
                self.error_message = Some(format!("Error reading file: {}", e));
                self.status = "Error reading file".to_string();
            },
        }
    }

    /// Read the data `candidate` needs and make it current.
    fn commit(&mut self, mut candidate: Navigator) -> Result<()> {
        let session = self.session.as_ref().ok_or(FitsViewError::FileClosed)?;

        let mut page = None;
        if candidate.active() == Some(ActiveView::Table) {
            if let Some(view) = candidate.table_view() {
                let request = view.request();
                if self.page_request.as_ref() != Some(&request) {
                    page = Some((session.get_page(&request)?, request));
                }
            }
        }

        let mut image = None;
        if candidate.active() == Some(ActiveView::Image) {
            if let Some(hdu) = candidate.image_view().map(|s| s.hdu) {
                if self.image.as_ref().map(|i| i.plane.hdu) != Some(hdu) {
                    image = Some(LoadedImage::load(
                        session,
                        hdu,
                        self.config.image.commentary_limit,
                    )?);
                }
            }
        }

        // Keep the viewport so a new image is fitted to the same area
        if let (Some(current), Some(state)) = (
            self.navigator.as_ref().and_then(Navigator::image_view),
            candidate.image_view_mut(),
        ) {
            let (w, h) = current.viewport();
            if state.viewport() == (0, 0) && w > 0 && h > 0 {
                state.fit_to(w, h);
            }
        }

        if let Some((result, request)) = page {
            self.page = Some(result);
            self.page_request = Some(request);
        }
        if let Some(image) = image {
            self.image = Some(image);
        }
        self.navigator = Some(candidate);
        Ok(())
    }

    /// Apply a navigation change atomically.
    ///
    /// `change` returns `Ok(false)` for a no-op, which is reported with
    /// `unchanged`.
    fn apply<F>(&mut self, unchanged: &str, change: F) -> bool
    where
        F: FnOnce(&mut Navigator) -> Result<bool>,
    {
        let Some(mut candidate) = self.navigator.clone() else {
            self.status = "No file loaded".to_string();
            return false;
        };

        match change(&mut candidate) {
            Ok(true) => match self.commit(candidate) {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!("Navigation rejected: {}", e);
                    self.status = format!("Error: {}", e);
                    false
                },
            },
            Ok(false) => {
                self.status = unchanged.to_string();
                false
            },
            Err(e) => {
                tracing::debug!("Navigation rejected: {}", e);
                self.status = e.to_string();
                false
            },
        }
    }

    /// Next table page.
    pub fn next_page(&mut self) {
        if self.apply("Last page reached", |n| Ok(n.next_page())) {
            self.status = self.page_status();
        }
    }

    /// Previous table page.
    pub fn prev_page(&mut self) {
        if self.apply("Already at the first page", |n| Ok(n.prev_page())) {
            self.status = self.page_status();
        }
    }

    /// Next table HDU.
    pub fn next_table(&mut self) {
        if self.apply("No further table HDU", |n| Ok(n.next_table())) {
            self.column_offset = 0;
            self.status = self.page_status();
        }
    }

    /// Previous table HDU.
    pub fn prev_table(&mut self) {
        if self.apply("No previous table HDU", |n| Ok(n.prev_table())) {
            self.column_offset = 0;
            self.status = self.page_status();
        }
    }

    /// Scroll the grid horizontally by `delta` columns.
    pub fn scroll_columns(&mut self, delta: i64) {
        let count = self.page.as_ref().map(|p| p.columns.len()).unwrap_or(0);
        let moved = self.column_offset as i64 + delta;
        self.column_offset = moved.clamp(0, count.saturating_sub(1) as i64) as usize;
    }

    /// Next image HDU.
    pub fn next_image(&mut self) {
        if self.apply("Last image reached", |n| Ok(n.next_image())) {
            self.status = self.image_status();
        }
    }

    /// Previous image HDU.
    pub fn prev_image(&mut self) {
        if self.apply("First image reached", |n| Ok(n.prev_image())) {
            self.status = self.image_status();
        }
    }

    /// Switch between the table and image views.
    pub fn toggle_view(&mut self) {
        let unchanged = match self.navigator.as_ref().and_then(Navigator::active) {
            Some(ActiveView::Table) => "This file has no image HDU",
            Some(ActiveView::Image) => "This file has no table HDU",
            None => "No table or image data found",
        };
        if self.apply(unchanged, |n| Ok(n.toggle_view())) {
            self.status = match self.navigator.as_ref().and_then(Navigator::active) {
                Some(ActiveView::Image) => self.image_status(),
                _ => self.page_status(),
            };
        }
    }

    /// Zoom in one step.
    pub fn zoom_in(&mut self) {
        if self.apply("Maximum zoom reached", |n| Ok(n.zoom_in())) {
            self.status = self.image_status();
        }
    }

    /// Zoom out one step.
    pub fn zoom_out(&mut self) {
        if self.apply("Minimum zoom reached", |n| Ok(n.zoom_out())) {
            self.status = self.image_status();
        }
    }

    /// Rotate counter-clockwise.
    pub fn rotate_left(&mut self) {
        if self.apply("No image", |n| Ok(n.rotate_left())) {
            self.status = self.image_status();
        }
    }

    /// Rotate clockwise.
    pub fn rotate_right(&mut self) {
        if self.apply("No image", |n| Ok(n.rotate_right())) {
            self.status = self.image_status();
        }
    }

    /// Move the image cursor.
    pub fn move_cursor(&mut self, dx: i64, dy: i64) {
        if let Some(nav) = self.navigator.as_mut() {
            nav.move_cursor(dx, dy);
        }
    }

    /// Pan the image by display pixels.
    pub fn pan(&mut self, dx: i64, dy: i64) {
        if let Some(nav) = self.navigator.as_mut() {
            nav.pan(dx, dy);
        }
    }

    /// Start a text prompt.
    pub fn start_prompt(&mut self, mode: InputMode) {
        if self.navigator.as_ref().and_then(Navigator::table_view).is_none() {
            self.status = "No table HDU".to_string();
            return;
        }
        self.input_mode = mode;
        self.input.clear();
    }

    /// Leave any prompt or popup.
    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input.clear();
    }

    /// Apply the typed prompt value.
    pub fn submit_input(&mut self) {
        let mode = self.input_mode;
        let text = self.input.trim().to_string();
        self.cancel_input();

        let Ok(value) = text.parse::<i64>() else {
            self.status = format!("Not a number: '{}'", text);
            return;
        };

        match mode {
            InputMode::JumpToPage => {
                // Pages are typed 1-based
                let page = value.checked_sub(1);
                let jump = |n: &mut Navigator| match page {
                    Some(page) => n.jump_to_page(page).map(|_| true),
                    None => Err(FitsViewError::InvalidPage { page: value }),
                };
                if self.apply("", jump) {
                    self.status = self.page_status();
                }
            },
            InputMode::PageSize => {
                if self.apply("", |n| n.set_page_size(value).map(|_| true)) {
                    self.status = self.page_status();
                }
            },
            InputMode::ColumnWidth => self.set_column_width(value),
            InputMode::Normal | InputMode::ColumnPicker => {},
        }
    }

    /// Set the table column width.
    pub fn set_column_width(&mut self, width: i64) {
        match u16::try_from(width) {
            Ok(w) if (1..=200).contains(&w) => {
                self.column_width = w;
                self.status = format!("Column width: {}", w);
            },
            _ => self.status = format!("Invalid column width: {} (must be between 1 and 200)", width),
        }
    }

    /// Widen or narrow table columns by `delta`.
    pub fn adjust_column_width(&mut self, delta: i64) {
        self.set_column_width(i64::from(self.column_width) + delta);
    }

    /// Open the column selection popup.
    pub fn open_column_picker(&mut self) {
        let Some(nav) = self.navigator.as_ref() else {
            return;
        };
        let (Some(meta), Some(view)) = (nav.table_meta(), nav.table_view()) else {
            self.status = "No table HDU".to_string();
            return;
        };
        self.column_picker = ColumnPicker::new(meta.columns.clone(), &view.columns);
        self.input_mode = InputMode::ColumnPicker;
    }

    /// Apply the column popup selection.
    pub fn apply_column_picker(&mut self) {
        let selection = self.column_picker.selection();
        self.input_mode = InputMode::Normal;
        let count = selection.len();
        if self.apply("", move |n| n.set_columns(selection).map(|_| true)) {
            self.column_offset = 0;
            self.status = if count == 0 {
                "Showing all columns".to_string()
            } else {
                format!("Showing {} columns", count)
            };
        }
    }

    /// Cycle to the next theme.
    pub fn cycle_theme(&mut self) {
        self.theme = self.theme.next();
        self.status = format!("Theme: {}", self.theme.name());
    }

    /// Cycle the image palette.
    pub fn cycle_palette(&mut self) {
        self.palette = self.palette.next();
        self.status = format!("Palette: {}", self.palette.name());
    }

    /// Mouse moved to terminal cell `(column, row)`.
    pub fn mouse_moved(&mut self, column: u16, row: u16) {
        let Some(area) = self.image_area else {
            return;
        };
        if column < area.x || row < area.y || column >= area.right() || row >= area.bottom() {
            return;
        }
        let pixel_width = self.config.image.pixel_width.max(1);
        let Some(nav) = self.navigator.as_mut() else {
            return;
        };
        if nav.active() != Some(ActiveView::Image) {
            return;
        }
        let Some(state) = nav.image_view() else {
            return;
        };
        let (px, py) = state.pan_offset();
        let x = px + usize::from((column - area.x) / pixel_width);
        let y = py + usize::from(row - area.y);
        nav.set_cursor(x, y);
    }

    /// Mouse wheel: pages in the table view, images in the image view.
    pub fn scroll(&mut self, down: bool) {
        match (self.navigator.as_ref().and_then(Navigator::active), down) {
            (Some(ActiveView::Table), true) => self.next_page(),
            (Some(ActiveView::Table), false) => self.prev_page(),
            (Some(ActiveView::Image), true) => self.next_image(),
            (Some(ActiveView::Image), false) => self.prev_image(),
            (None, _) => {},
        }
    }

    /// Status text for the table view.
    pub fn page_status(&self) -> String {
        let (Some(nav), Some(page)) = (self.navigator.as_ref(), self.page.as_ref()) else {
            return "No table data".to_string();
        };
        let Some(view) = nav.table_view() else {
            return "No table data".to_string();
        };
        format!(
            "HDU #{} | Page {} of {} | Total Rows: {} | Displayed: {}",
            view.hdu,
            view.page + 1,
            nav.page_count().max(1),
            format_number(page.total_rows),
            page.len()
        )
    }

    /// Status text for the image view.
    pub fn image_status(&self) -> String {
        let Some(state) = self.navigator.as_ref().and_then(Navigator::image_view) else {
            return "No image data".to_string();
        };
        let (w, h) = state.source_size();
        format!(
            "Image HDU #{} | {}x{} | Zoom {:.0}% | Rotation {}°",
            state.hdu,
            w,
            h,
            state.zoom() * 100.0,
            state.rotation_degrees()
        )
    }

    /// Cursor readout: sky or pixel position and the pixel value.
    pub fn cursor_readout(&self) -> Option<String> {
        let state = self.navigator.as_ref()?.image_view()?;
        let image = self.image.as_ref().filter(|i| i.plane.hdu == state.hdu)?;
        match state.cursor_source() {
            MappedPixel::Inside { x, y } => {
                let value = image
                    .plane
                    .value(x, y)
                    .map(format_pixel_value)
                    .unwrap_or_default();
                Some(format!(
                    "{} | Value: {}",
                    image.resolver.readout(x as f64, y as f64),
                    value
                ))
            },
            MappedPixel::Outside => None,
        }
    }

    /// Toggle show hidden files.
    pub fn toggle_hidden(&mut self) {
        self.file_browser.toggle_hidden();
        self.status = format!(
            "Show hidden: {}",
            if self.file_browser.show_hidden {
                "ON"
            } else {
                "OFF"
            }
        );
    }

    /// Open the selected file or directory in the picker.
    pub fn browser_select(&mut self) {
        if let Some(path) = self.file_browser.select_current() {
            self.file_browser_mode = false;
            self.load_file(path);

            if self.error_message.is_some() {
                self.file_browser_mode = true;
                self.status =
                    "Error loading file (press q to quit, navigate to try another)".to_string();
            }
        }
    }

    /// Picker: parent directory.
    pub fn browser_parent(&mut self) {
        self.file_browser.go_to_parent();
        self.status = format!("Browsing: {}", self.file_browser.current_dir.display());
    }

    /// Close the open file.
    pub fn close(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.close();
        }
    }
}

fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picker_selection_in_file_order() {
        let mut picker = ColumnPicker::new(
            vec!["A".into(), "B".into(), "C".into()],
            &["C".to_string(), "A".to_string()],
        );
        assert_eq!(picker.selection(), vec!["A", "C"]);
        picker.cursor_down();
        picker.toggle();
        assert_eq!(picker.selection(), vec!["A", "B", "C"]);
        picker.toggle_all();
        assert!(picker.selection().is_empty());
    }

    #[test]
    fn column_width_bounds() {
        let mut app = App::new(ViewerConfig::default());
        assert_eq!(app.column_width, 15);
        app.adjust_column_width(-20);
        assert_eq!(app.column_width, 15);
        app.adjust_column_width(3);
        assert_eq!(app.column_width, 18);
    }

    /// Session over a file holding one 80-row binary table.
    fn table_session(dir: &tempfile::TempDir) -> Session {
        let mut bytes = Vec::new();
        let mut push_header = |cards: &[&str]| {
            let start = bytes.len();
            for card in cards.iter().chain(&["END"]) {
                bytes.extend(format!("{:<80}", card).into_bytes());
            }
            bytes.resize(start + (bytes.len() - start).div_ceil(2880) * 2880, b' ');
        };
        push_header(&["SIMPLE  = T", "BITPIX  = 8", "NAXIS   = 0", "EXTEND  = T"]);
        push_header(&[
            "XTENSION= 'BINTABLE'",
            "BITPIX  = 8",
            "NAXIS   = 2",
            "NAXIS1  = 4",
            "NAXIS2  = 80",
            "PCOUNT  = 0",
            "GCOUNT  = 1",
            "TFIELDS = 1",
            "TTYPE1  = 'ID'",
            "TFORM1  = 'J'",
        ]);
        bytes.extend([0u8; 2880]);

        let path = dir.path().join("table.fits");
        std::fs::write(&path, bytes).unwrap();
        Session::open(&path).unwrap()
    }

    #[test]
    fn most_negative_page_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(ViewerConfig::default());
        app.attach(table_session(&dir));
        let before = app.navigator.as_ref().and_then(|n| n.table_view().cloned());
        assert!(before.is_some());

        app.input_mode = InputMode::JumpToPage;
        app.input = i64::MIN.to_string();
        app.submit_input();

        assert!(app.status.starts_with("Invalid page"), "{}", app.status);
        let after = app.navigator.as_ref().and_then(|n| n.table_view().cloned());
        assert_eq!(after, before);
    }

    #[test]
    fn typed_pages_are_one_based() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(ViewerConfig::default());
        app.attach(table_session(&dir));

        app.input_mode = InputMode::JumpToPage;
        app.input = "2".to_string();
        app.submit_input();

        let view = app.navigator.as_ref().and_then(|n| n.table_view().cloned());
        assert_eq!(view.map(|v| v.page), Some(1));
    }

    #[test]
    fn navigation_without_file_is_reported() {
        let mut app = App::new(ViewerConfig::default());
        app.next_page();
        assert_eq!(app.status, "No file loaded");
    }
}
