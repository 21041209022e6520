//! Viewer configuration.
//!
//! Defaults match the classic viewer: 50 rows per page, 15-character
//! columns, 20% zoom steps.

/// Zoom factor limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLimits {
    /// Factor applied per zoom step.
    pub step: f64,
    /// Smallest zoom factor.
    pub min: f64,
    /// Largest zoom factor.
    pub max: f64,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            step: 1.2,
            min: 0.1,
            max: 100.0,
        }
    }
}

/// Configuration for the table view.
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Rows per page.
    pub page_size: usize,
    /// Largest accepted page size.
    pub max_page_size: usize,
    /// Width of each column in characters.
    pub column_width: u16,
    /// Width of the row number column.
    pub row_header_width: u16,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            page_size: 50,
            max_page_size: 1000,
            column_width: 15,
            row_header_width: 8,
        }
    }
}

/// Configuration for the image view.
#[derive(Debug, Clone)]
pub struct ImageConfig {
    /// Zoom limits.
    pub zoom: ZoomLimits,
    /// Terminal characters per display pixel horizontally (aspect correction).
    pub pixel_width: u16,
    /// COMMENT and HISTORY entries shown in the header panel.
    pub commentary_limit: usize,
    /// Width of the header info panel.
    pub info_width: u16,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            zoom: ZoomLimits::default(),
            pixel_width: 2,
            commentary_limit: 5,
            info_width: 36,
        }
    }
}

/// Combined viewer configuration.
#[derive(Debug, Clone, Default)]
pub struct ViewerConfig {
    /// Table view settings.
    pub table: TableConfig,
    /// Image view settings.
    pub image: ImageConfig,
    /// Open the image view first when the file has images.
    pub start_with_image: bool,
}
