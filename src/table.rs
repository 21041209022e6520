//! Table window provider.
//!
//! Serves one page of rows for a subset of columns, decoding only the
//! bytes of the requested rows and columns from the mapped file.

use crate::catalog::{ColumnInfo, HduCatalog, HduKind};
use crate::error::{FitsViewError, Result};
use crate::fits::column::{decode_ascii_cell, decode_binary_cell, CellValue, Encoding};
use crate::fits::FitsFile;

/// A request for one page of a table HDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Table HDU index.
    pub hdu: usize,
    /// Zero-based page index.
    pub page: usize,
    /// Rows per page.
    pub page_size: usize,
    /// Selected column names, in display order.
    pub columns: Vec<String>,
}

impl PageRequest {
    /// Build a request; duplicate column names are collapsed, first wins.
    pub fn new(hdu: usize, page: usize, page_size: usize, columns: Vec<String>) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(columns.len());
        for name in columns {
            if !unique.contains(&name) {
                unique.push(name);
            }
        }
        Self {
            hdu,
            page,
            page_size,
            columns: unique,
        }
    }
}

/// One page of table rows.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    /// Column names, matching the order of values in each row.
    pub columns: Vec<String>,
    /// Row values.
    pub rows: Vec<Vec<CellValue>>,
    /// Rows in the whole table.
    pub total_rows: usize,
    /// Absolute index of the first returned row.
    pub start_row: usize,
}

impl PageResult {
    /// Number of rows returned.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` for a page past the end of the table.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in the `row`-th returned row.
    pub fn get(&self, row: usize, column: &str) -> Option<&CellValue> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(col)
    }

    /// The `row`-th returned row as (column, value) pairs.
    pub fn row_map(&self, row: usize) -> Option<Vec<(&str, &CellValue)>> {
        let values = self.rows.get(row)?;
        Some(
            self.columns
                .iter()
                .map(String::as_str)
                .zip(values.iter())
                .collect(),
        )
    }
}

/// Absolute start row and row count of a page.
///
/// A start at or beyond `total_rows` yields an empty page.
pub fn page_bounds(page: usize, page_size: usize, total_rows: usize) -> (usize, usize) {
    let start = page.saturating_mul(page_size);
    let count = page_size.min(total_rows.saturating_sub(start));
    (start, count)
}

/// Page reader over an opened file and its catalog.
#[derive(Debug, Clone, Copy)]
pub struct TableWindow<'a> {
    file: &'a FitsFile,
    catalog: &'a HduCatalog,
}

impl<'a> TableWindow<'a> {
    /// Create a window provider.
    pub fn new(file: &'a FitsFile, catalog: &'a HduCatalog) -> Self {
        Self { file, catalog }
    }

    /// Read exactly one page.
    pub fn get_page(&self, request: &PageRequest) -> Result<PageResult> {
        let descriptor = self.catalog.describe(request.hdu)?;
        let geometry = match (descriptor.kind, descriptor.table) {
            (HduKind::Table, Some(geometry)) => geometry,
            _ => {
                return Err(FitsViewError::UnsupportedHdu {
                    index: request.hdu,
                    expected: "table",
                })
            },
        };
        if request.page_size == 0 {
            return Err(FitsViewError::InvalidPageSize { size: 0, max: usize::MAX });
        }

        let columns: Vec<&ColumnInfo> = request
            .columns
            .iter()
            .map(|name| {
                descriptor
                    .column(name)
                    .ok_or_else(|| FitsViewError::unknown_column(name.as_str()))
            })
            .collect::<Result<_>>()?;

        let (start, count) = page_bounds(request.page, request.page_size, geometry.rows);
        tracing::debug!(
            "Reading HDU #{} rows {}..{} ({} columns)",
            request.hdu,
            start,
            start + count,
            columns.len()
        );

        let unit = self.catalog.data_unit(request.hdu)?;
        let data_end = unit
            .data_start
            .checked_add(unit.data_len)
            .ok_or_else(|| FitsViewError::invalid("data segment overflows"))?;
        let data = self.file.slice(unit.data_start..data_end)?;
        let heap = data.get(geometry.heap_offset..).unwrap_or(&[]);

        let rows = (start..start + count)
            .map(|row| {
                let row_bytes = row
                    .checked_mul(geometry.row_bytes)
                    .and_then(|row_start| Some(row_start..row_start.checked_add(geometry.row_bytes)?))
                    .and_then(|range| data.get(range))
                    .ok_or_else(|| FitsViewError::invalid("row extends past the data segment"))?;
                columns
                    .iter()
                    .map(|column| {
                        let cell = row_bytes
                            .get(column.offset..column.offset + column.width)
                            .ok_or_else(|| FitsViewError::invalid("cell extends past the row"))?;
                        match geometry.encoding {
                            Encoding::Binary => decode_binary_cell(cell, &column.format, heap, &column.scaling),
                            Encoding::Ascii => Ok(decode_ascii_cell(cell, &column.format, &column.scaling)),
                        }
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(PageResult {
            columns: request.columns.clone(),
            rows,
            total_rows: geometry.rows,
            start_row: start,
        })
    }
}
