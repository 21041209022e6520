//! fitsview - A fast, terminal-based FITS table and image viewer.
//!
//! fitsview maps a FITS file into memory, catalogs its HDUs from the
//! headers alone, and reads table rows and image pixels on demand.
//!
//! # Features
//!
//! - Paginated table grid with column selection over arbitrarily large tables
//! - Image view with zoom, quarter-turn rotation and pan
//! - Live RA/Dec readout through the image's WCS (TAN, SIN, CAR)
//! - Vim-style keyboard shortcuts and mouse support
//! - Gruvbox color themes
//!
//! # Example
//!
//! ```no_run
//! use fitsview::session::Session;
//! use fitsview::table::PageRequest;
//!
//! let session = Session::open("specObj-dr17.fits")?;
//! let table = session.catalog().first_table().expect("no table HDU");
//!
//! let request = PageRequest::new(table.index, 0, 50, table.column_names());
//! let page = session.get_page(&request)?;
//! println!("{} of {} rows", page.len(), page.total_rows);
//! # Ok::<(), fitsview::FitsViewError>(())
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]
#![deny(unsafe_code)]

pub mod app;
pub mod catalog;
pub mod config;
pub mod error;
pub mod file_browser;
pub mod fits;
pub mod image;
pub mod navigation;
pub mod session;
pub mod table;
pub mod ui;
pub mod util;
pub mod wcs;

pub use error::{FitsViewError, Result};
