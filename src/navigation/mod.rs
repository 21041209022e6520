//! Navigation state machine.
//!
//! Holds the table view (HDU, page, page size, column selection) and the
//! image view (HDU plus [`ImageViewState`]). Every transition is validated
//! first; a rejected transition leaves the state untouched.

use crate::catalog::{HduCatalog, HduKind};
use crate::config::{ViewerConfig, ZoomLimits};
use crate::error::{FitsViewError, Result};
use crate::image::ImageViewState;
use crate::table::{page_bounds, PageRequest};

/// Navigation metadata of one table HDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMeta {
    /// HDU index.
    pub hdu: usize,
    /// Column names in file order.
    pub columns: Vec<String>,
    /// Number of rows.
    pub rows: usize,
}

/// Navigation metadata of one image HDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageMeta {
    /// HDU index.
    pub hdu: usize,
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
}

/// Position within a table HDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    /// HDU index.
    pub hdu: usize,
    /// Zero-based page index.
    pub page: usize,
    /// Rows per page.
    pub page_size: usize,
    /// Selected columns, in display order.
    pub columns: Vec<String>,
}

impl TableView {
    /// The page request for this position.
    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.hdu, self.page, self.page_size, self.columns.clone())
    }
}

/// Which view is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveView {
    /// Paginated table grid.
    Table,
    /// Image viewer.
    Image,
}

/// Borrowed view of the active state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewState<'a> {
    /// Table position.
    TableView(&'a TableView),
    /// Image HDU and its view state.
    ImageView(&'a ImageViewState),
}

/// The viewer's navigation state.
#[derive(Debug, Clone, PartialEq)]
pub struct Navigator {
    tables: Vec<TableMeta>,
    images: Vec<ImageMeta>,
    table_pos: usize,
    image_pos: usize,
    table: Option<TableView>,
    image: Option<ImageViewState>,
    active: Option<ActiveView>,
    max_page_size: usize,
    zoom: ZoomLimits,
}

impl Navigator {
    /// Initial state for a catalog: the first table HDU, page 0, all
    /// columns; or the first image when the file has no table.
    pub fn new(catalog: &HduCatalog, config: &ViewerConfig) -> Self {
        let tables = catalog
            .list_hdus()
            .iter()
            .filter(|h| h.kind == HduKind::Table)
            .map(|h| TableMeta {
                hdu: h.index,
                columns: h.column_names(),
                rows: h.total_rows(),
            })
            .collect();
        let images = catalog
            .list_hdus()
            .iter()
            .filter_map(|h| {
                h.image_size().map(|(width, height)| ImageMeta {
                    hdu: h.index,
                    width,
                    height,
                })
            })
            .collect();
        Self::from_parts(tables, images, config)
    }

    /// Initial state from prepared metadata.
    pub fn from_parts(tables: Vec<TableMeta>, images: Vec<ImageMeta>, config: &ViewerConfig) -> Self {
        let table = tables.first().map(|t| TableView {
            hdu: t.hdu,
            page: 0,
            page_size: config.table.page_size.clamp(1, config.table.max_page_size.max(1)),
            columns: t.columns.clone(),
        });
        let image = images
            .first()
            .map(|i| ImageViewState::new(i.hdu, i.width, i.height, config.image.zoom));

        let active = match (&table, &image) {
            (_, Some(_)) if config.start_with_image => Some(ActiveView::Image),
            (Some(_), _) => Some(ActiveView::Table),
            (None, Some(_)) => Some(ActiveView::Image),
            (None, None) => None,
        };

        Self {
            tables,
            images,
            table_pos: 0,
            image_pos: 0,
            table,
            image,
            active,
            max_page_size: config.table.max_page_size.max(1),
            zoom: config.image.zoom,
        }
    }

    /// The active view, if the file has anything to show.
    pub fn view(&self) -> Option<ViewState<'_>> {
        match self.active? {
            ActiveView::Table => self.table.as_ref().map(ViewState::TableView),
            ActiveView::Image => self.image.as_ref().map(ViewState::ImageView),
        }
    }

    /// Which view is active.
    pub fn active(&self) -> Option<ActiveView> {
        self.active
    }

    /// Table position, whether or not the table view is active.
    pub fn table_view(&self) -> Option<&TableView> {
        self.table.as_ref()
    }

    /// Image view state, whether or not the image view is active.
    pub fn image_view(&self) -> Option<&ImageViewState> {
        self.image.as_ref()
    }

    /// Mutable image view state.
    pub fn image_view_mut(&mut self) -> Option<&mut ImageViewState> {
        self.image.as_mut()
    }

    /// Metadata of the current table.
    pub fn table_meta(&self) -> Option<&TableMeta> {
        self.tables.get(self.table_pos)
    }

    /// Metadata of the current image.
    pub fn image_meta(&self) -> Option<&ImageMeta> {
        self.images.get(self.image_pos)
    }

    /// Number of table HDUs.
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Number of image HDUs.
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Position of the current table among the table HDUs.
    pub fn table_position(&self) -> usize {
        self.table_pos
    }

    /// Position of the current image among the image HDUs.
    pub fn image_position(&self) -> usize {
        self.image_pos
    }

    /// Number of non-empty pages of the current table.
    pub fn page_count(&self) -> usize {
        match (&self.table, self.table_meta()) {
            (Some(view), Some(meta)) => meta.rows.div_ceil(view.page_size),
            _ => 0,
        }
    }

    fn current_page_len(&self) -> usize {
        match (&self.table, self.table_meta()) {
            (Some(view), Some(meta)) => page_bounds(view.page, view.page_size, meta.rows).1,
            _ => 0,
        }
    }

    /// Advance one page while the current page still has rows.
    pub fn next_page(&mut self) -> bool {
        if self.current_page_len() == 0 {
            return false;
        }
        match self.table.as_mut() {
            Some(view) => {
                view.page += 1;
                true
            },
            None => false,
        }
    }

    /// Go back one page; no-op on the first page.
    pub fn prev_page(&mut self) -> bool {
        match self.table.as_mut() {
            Some(view) if view.page > 0 => {
                view.page -= 1;
                true
            },
            _ => false,
        }
    }

    /// Jump to page `page`, even past the end of the table.
    pub fn jump_to_page(&mut self, page: i64) -> Result<()> {
        let index = usize::try_from(page).map_err(|_| FitsViewError::InvalidPage { page })?;
        let view = self.table.as_mut().ok_or(FitsViewError::InvalidPage { page })?;
        view.page = index;
        Ok(())
    }

    /// Change the rows per page. The page index is kept and reinterpreted
    /// against the new size.
    pub fn set_page_size(&mut self, size: i64) -> Result<()> {
        let max = self.max_page_size;
        let invalid = FitsViewError::InvalidPageSize { size, max };
        let size = usize::try_from(size).map_err(|_| FitsViewError::InvalidPageSize { size, max })?;
        if size == 0 || size > max {
            return Err(invalid);
        }
        let view = self.table.as_mut().ok_or(invalid)?;
        view.page_size = size;
        Ok(())
    }

    /// Replace the column selection. An empty selection selects every
    /// column; an unknown name rejects the whole change.
    pub fn set_columns(&mut self, names: Vec<String>) -> Result<()> {
        let meta = self
            .tables
            .get(self.table_pos)
            .ok_or_else(|| FitsViewError::unknown_column(names.first().cloned().unwrap_or_default()))?;

        if let Some(unknown) = names.iter().find(|n| !meta.columns.contains(n)) {
            return Err(FitsViewError::unknown_column(unknown.as_str()));
        }
        let columns = if names.is_empty() {
            meta.columns.clone()
        } else {
            PageRequest::new(meta.hdu, 0, 1, names).columns
        };

        if let Some(view) = self.table.as_mut() {
            view.columns = columns;
        }
        Ok(())
    }

    /// Switch to the next table HDU at page 0 with all columns.
    pub fn next_table(&mut self) -> bool {
        self.select_table(self.table_pos + 1)
    }

    /// Switch to the previous table HDU at page 0 with all columns.
    pub fn prev_table(&mut self) -> bool {
        match self.table_pos.checked_sub(1) {
            Some(pos) => self.select_table(pos),
            None => false,
        }
    }

    fn select_table(&mut self, pos: usize) -> bool {
        let Some(meta) = self.tables.get(pos) else {
            return false;
        };
        let page_size = self.table.as_ref().map(|v| v.page_size).unwrap_or(1);
        self.table = Some(TableView {
            hdu: meta.hdu,
            page: 0,
            page_size,
            columns: meta.columns.clone(),
        });
        self.table_pos = pos;
        true
    }

    /// Move to the next image HDU with a fresh view state.
    pub fn next_image(&mut self) -> bool {
        self.select_image(self.image_pos + 1)
    }

    /// Move to the previous image HDU with a fresh view state.
    pub fn prev_image(&mut self) -> bool {
        match self.image_pos.checked_sub(1) {
            Some(pos) => self.select_image(pos),
            None => false,
        }
    }

    fn select_image(&mut self, pos: usize) -> bool {
        let Some(meta) = self.images.get(pos) else {
            return false;
        };
        let mut state = ImageViewState::new(meta.hdu, meta.width, meta.height, self.zoom);
        if let Some((w, h)) = self.image.as_ref().map(|s| s.viewport()) {
            if w > 0 && h > 0 {
                state.fit_to(w, h);
            }
        }
        self.image = Some(state);
        self.image_pos = pos;
        true
    }

    /// Switch between the table and image views.
    pub fn toggle_view(&mut self) -> bool {
        let next = match self.active {
            Some(ActiveView::Table) if self.image.is_some() => ActiveView::Image,
            Some(ActiveView::Image) if self.table.is_some() => ActiveView::Table,
            _ => return false,
        };
        self.active = Some(next);
        true
    }

    /// Zoom the image in one step.
    pub fn zoom_in(&mut self) -> bool {
        self.image.as_mut().is_some_and(ImageViewState::zoom_in)
    }

    /// Zoom the image out one step.
    pub fn zoom_out(&mut self) -> bool {
        self.image.as_mut().is_some_and(ImageViewState::zoom_out)
    }

    /// Rotate the image 90° counter-clockwise.
    pub fn rotate_left(&mut self) -> bool {
        self.image.as_mut().map(ImageViewState::rotate_left).is_some()
    }

    /// Rotate the image 90° clockwise.
    pub fn rotate_right(&mut self) -> bool {
        self.image.as_mut().map(ImageViewState::rotate_right).is_some()
    }

    /// Move the image cursor by display pixels.
    pub fn move_cursor(&mut self, dx: i64, dy: i64) {
        if let Some(state) = self.image.as_mut() {
            state.move_cursor(dx, dy);
        }
    }

    /// Place the image cursor at a display pixel.
    pub fn set_cursor(&mut self, x: usize, y: usize) -> bool {
        self.image.as_mut().is_some_and(|s| s.set_cursor(x, y))
    }

    /// Pan the visible image window.
    pub fn pan(&mut self, dx: i64, dy: i64) {
        if let Some(state) = self.image.as_mut() {
            state.pan(dx, dy);
        }
    }
}
