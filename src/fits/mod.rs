//! Read-only FITS access.
//!
//! The file is mapped once and handed to `fitsio-pure` as a byte slice:
//! its HDU scan supplies the headers and data offsets, and cell or pixel
//! bytes are decoded on demand from short-lived slices of the mapping.

pub mod column;
pub mod file;
pub mod header;

pub use column::{CellValue, ColumnFormat, ColumnScaling, Encoding, NullValue};
pub use file::FitsFile;
pub use fitsio_pure::header::Card;
pub use fitsio_pure::value::Value;
pub use header::Header;
