//! HDU catalog: enumeration and classification of the HDUs in a file.
//!
//! The catalog is built once per session from headers only. Descriptors
//! never change after the scan; the table and image providers borrow them.

use crate::error::{FitsViewError, Result};
use crate::fits::{ColumnFormat, ColumnScaling, Encoding, FitsFile, Header};
use fitsio_pure::hdu::{parse_fits, Hdu, HduInfo};
use fitsio_pure::image::bytes_per_pixel;

/// What an HDU can be viewed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HduKind {
    /// Rows and named columns.
    Table,
    /// Rectangular pixel array.
    Image,
    /// Anything else (empty primary, random groups, compressed images...).
    Other,
}

impl HduKind {
    /// Lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            HduKind::Table => "table",
            HduKind::Image => "image",
            HduKind::Other => "other",
        }
    }
}

/// Shape of an HDU's data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HduShape {
    /// Table dimensions.
    Table {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        columns: usize,
    },
    /// Axis lengths NAXIS1..NAXISn (possibly empty).
    Array(Vec<usize>),
}

impl std::fmt::Display for HduShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HduShape::Table { rows, columns } => write!(f, "{} rows × {} cols", rows, columns),
            HduShape::Array(axes) if axes.is_empty() => write!(f, "no data"),
            HduShape::Array(axes) => {
                let dims: Vec<String> = axes.iter().map(|n| n.to_string()).collect();
                write!(f, "{}", dims.join(" × "))
            },
        }
    }
}

/// One column of a table HDU.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    /// TTYPEn, or `COLn` when absent.
    pub name: String,
    /// TUNITn.
    pub unit: Option<String>,
    /// Raw TFORMn.
    pub tform: String,
    /// Parsed format.
    pub format: ColumnFormat,
    /// Byte offset of the column within a row.
    pub offset: usize,
    /// Bytes the column occupies in a row.
    pub width: usize,
    /// TSCALn, TZEROn and TNULLn.
    pub scaling: ColumnScaling,
}

/// Row geometry of a table HDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableGeometry {
    /// Bytes per row (NAXIS1).
    pub row_bytes: usize,
    /// Number of rows (NAXIS2).
    pub rows: usize,
    /// Heap offset from the start of the data segment (THEAP).
    pub heap_offset: usize,
    /// Cell encoding of every column.
    pub encoding: Encoding,
}

/// Metadata of one HDU.
#[derive(Debug, Clone, PartialEq)]
pub struct HduDescriptor {
    /// Zero-based index in the file.
    pub index: usize,
    /// Classification.
    pub kind: HduKind,
    /// Data shape.
    pub shape: HduShape,
    /// Columns, in file order (tables only).
    pub columns: Vec<ColumnInfo>,
    /// Row geometry (tables only).
    pub table: Option<TableGeometry>,
    /// BITPIX (primary and IMAGE HDUs).
    pub bitpix: Option<i64>,
    /// EXTNAME.
    pub name: Option<String>,
    /// XTENSION value, or `PRIMARY`.
    pub extension: String,
}

impl HduDescriptor {
    /// Number of table rows, 0 for non-tables.
    pub fn total_rows(&self) -> usize {
        self.table.map(|t| t.rows).unwrap_or(0)
    }

    /// Column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// All column names in file order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Width and height of the first image plane.
    pub fn image_size(&self) -> Option<(usize, usize)> {
        match (&self.kind, &self.shape) {
            (HduKind::Image, HduShape::Array(axes)) => {
                Some((*axes.first()?, axes.get(1).copied().unwrap_or(1)))
            },
            _ => None,
        }
    }

    /// Short name of the stored pixel type.
    pub fn pixel_type_name(&self) -> &'static str {
        match self.bitpix {
            Some(8) => "uint8",
            Some(16) => "int16",
            Some(32) => "int32",
            Some(64) => "int64",
            Some(-32) => "float32",
            Some(-64) => "float64",
            _ => "-",
        }
    }

    /// One-line summary for listings.
    pub fn summary(&self) -> String {
        format!(
            "{:>3}  {:<8} {:<6} {:<20} {}",
            self.index,
            self.extension,
            self.kind.name(),
            self.name.as_deref().unwrap_or("-"),
            self.shape
        )
    }
}

/// All HDUs of an opened file.
#[derive(Debug, Clone, Default)]
pub struct HduCatalog {
    hdus: Vec<HduDescriptor>,
    units: Vec<Hdu>,
    headers: Vec<Header>,
}

impl HduCatalog {
    /// Scan the headers of `file`.
    ///
    /// A damaged extension header ends the scan and the HDUs before it are
    /// kept; a broken primary header or a data segment shorter than its
    /// header declares is an [`FitsViewError::InvalidFits`] error.
    pub fn scan(file: &FitsFile) -> Result<Self> {
        let units = parse_fits(file.bytes()?)?.hdus;
        let headers: Vec<Header> = units
            .iter()
            .map(|unit| Header::from_cards(unit.cards.clone()))
            .collect();
        let hdus: Vec<HduDescriptor> = units
            .iter()
            .zip(&headers)
            .enumerate()
            .map(|(index, (unit, header))| describe_unit(index, unit, header))
            .collect();

        tracing::info!(
            "Catalogued {} HDUs ({} tables, {} images)",
            hdus.len(),
            hdus.iter().filter(|h| h.kind == HduKind::Table).count(),
            hdus.iter().filter(|h| h.kind == HduKind::Image).count()
        );

        Ok(Self { hdus, units, headers })
    }

    /// Every HDU in file order.
    pub fn list_hdus(&self) -> &[HduDescriptor] {
        &self.hdus
    }

    /// Descriptor of HDU `index`.
    pub fn describe(&self, index: usize) -> Result<&HduDescriptor> {
        self.hdus.get(index).ok_or(FitsViewError::NotFound {
            index,
            count: self.hdus.len(),
        })
    }

    /// Parsed HDU `index` with its data offsets.
    pub fn data_unit(&self, index: usize) -> Result<&Hdu> {
        self.units.get(index).ok_or(FitsViewError::NotFound {
            index,
            count: self.units.len(),
        })
    }

    /// Parsed header of HDU `index`.
    pub fn header(&self, index: usize) -> Result<&Header> {
        self.headers.get(index).ok_or(FitsViewError::NotFound {
            index,
            count: self.headers.len(),
        })
    }

    /// Number of HDUs.
    pub fn len(&self) -> usize {
        self.hdus.len()
    }

    /// Returns `true` when the file holds no HDU.
    pub fn is_empty(&self) -> bool {
        self.hdus.is_empty()
    }

    /// Indices of the table HDUs.
    pub fn table_indices(&self) -> Vec<usize> {
        self.indices_of(HduKind::Table)
    }

    /// Indices of the image HDUs.
    pub fn image_indices(&self) -> Vec<usize> {
        self.indices_of(HduKind::Image)
    }

    /// First table HDU in index order.
    pub fn first_table(&self) -> Option<&HduDescriptor> {
        self.hdus.iter().find(|h| h.kind == HduKind::Table)
    }

    /// First image HDU in index order.
    pub fn first_image(&self) -> Option<&HduDescriptor> {
        self.hdus.iter().find(|h| h.kind == HduKind::Image)
    }

    fn indices_of(&self, kind: HduKind) -> Vec<usize> {
        self.hdus
            .iter()
            .filter(|h| h.kind == kind)
            .map(|h| h.index)
            .collect()
    }
}

/// Axis lengths NAXIS1..NAXISn; missing axes count as 0.
fn axes(header: &Header) -> Vec<usize> {
    let naxis = header.get_usize("NAXIS").unwrap_or(0).min(999);
    (1..=naxis)
        .map(|i| header.get_usize(&format!("NAXIS{}", i)).unwrap_or(0))
        .collect()
}

fn describe_unit(index: usize, unit: &Hdu, header: &Header) -> HduDescriptor {
    let extension = header
        .get_str("XTENSION")
        .map(|s| s.trim().to_uppercase())
        .unwrap_or_else(|| "PRIMARY".to_string());

    let mut descriptor = HduDescriptor {
        index,
        kind: HduKind::Other,
        shape: HduShape::Array(axes(header)),
        columns: Vec::new(),
        table: None,
        bitpix: None,
        name: header.get_str("EXTNAME").map(|s| s.to_string()),
        extension,
    };

    let table = match &unit.info {
        HduInfo::Primary { bitpix, naxes } | HduInfo::Image { bitpix, naxes } => {
            let rectangular = !naxes.is_empty()
                && naxes.iter().all(|&n| n >= 1)
                && naxes.iter().any(|&n| n > 1);
            descriptor.bitpix = Some(*bitpix);
            if rectangular && bytes_per_pixel(*bitpix).is_ok() {
                descriptor.kind = HduKind::Image;
            }
            None
        },
        HduInfo::BinaryTable {
            naxis1,
            naxis2,
            tfields,
            ..
        } => Some((Encoding::Binary, *naxis1, *naxis2, *tfields)),
        HduInfo::AsciiTable {
            naxis1,
            naxis2,
            tfields,
        } => Some((Encoding::Ascii, *naxis1, *naxis2, *tfields)),
        // Random groups and tile-compressed images
        _ => None,
    };

    if let Some((encoding, row_bytes, rows, fields)) = table {
        match read_columns(header, encoding, row_bytes, fields) {
            Ok(columns) if !columns.is_empty() => {
                let heap_offset = header
                    .get_usize("THEAP")
                    .unwrap_or_else(|| row_bytes.saturating_mul(rows));
                descriptor.kind = HduKind::Table;
                descriptor.shape = HduShape::Table {
                    rows,
                    columns: columns.len(),
                };
                descriptor.columns = columns;
                descriptor.table = Some(TableGeometry {
                    row_bytes,
                    rows,
                    heap_offset,
                    encoding,
                });
            },
            Ok(_) => {},
            Err(e) => tracing::warn!("HDU #{} table schema is unusable: {}", index, e),
        }
    }

    descriptor
}

fn read_columns(header: &Header, encoding: Encoding, row_bytes: usize, fields: usize) -> Result<Vec<ColumnInfo>> {
    let mut columns = Vec::with_capacity(fields.min(999));
    let mut offset = 0usize;

    for i in 1..=fields {
        let tform = header
            .get_str(&format!("TFORM{}", i))
            .ok_or_else(|| FitsViewError::invalid(format!("missing TFORM{}", i)))?
            .to_string();
        let format = match encoding {
            Encoding::Binary => ColumnFormat::parse_binary(&tform)?,
            Encoding::Ascii => ColumnFormat::parse_ascii(&tform)?,
        };
        let width = format.width()?;

        let column_offset = match encoding {
            Encoding::Binary => offset,
            Encoding::Ascii => header
                .get_usize(&format!("TBCOL{}", i))
                .and_then(|c| c.checked_sub(1))
                .ok_or_else(|| FitsViewError::invalid(format!("missing TBCOL{}", i)))?,
        };
        offset = column_offset
            .checked_add(width)
            .filter(|&end| end <= row_bytes)
            .ok_or_else(|| {
                FitsViewError::invalid(format!("column {} extends past the row ({} bytes)", i, row_bytes))
            })?;

        let name = header
            .get_str(&format!("TTYPE{}", i))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("COL{}", i));

        columns.push(ColumnInfo {
            name,
            unit: header
                .get_str(&format!("TUNIT{}", i))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            tform,
            format,
            offset: column_offset,
            width,
            scaling: ColumnScaling::from_header(header, i, encoding),
        });
    }

    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fits::NullValue;

    fn blocks(cards: &[&str]) -> Vec<u8> {
        let mut bytes: Vec<u8> = cards
            .iter()
            .chain(&["END"])
            .flat_map(|c| format!("{:<80}", c).into_bytes())
            .collect();
        bytes.resize(bytes.len().div_ceil(2880) * 2880, b' ');
        bytes
    }

    /// Describe HDU `index` of a file made of the given headers, each
    /// followed by one block of zeroed data.
    fn describe(headers: &[&[&str]], index: usize) -> HduDescriptor {
        let mut bytes = Vec::new();
        for cards in headers {
            bytes.extend(blocks(cards));
            bytes.extend([0u8; 2880]);
        }
        let fits = parse_fits(&bytes).unwrap();
        let unit = &fits.hdus[index];
        describe_unit(index, unit, &Header::from_cards(unit.cards.clone()))
    }

    const EMPTY_PRIMARY: &[&str] = &["SIMPLE  = T", "BITPIX  = 8", "NAXIS   = 0"];

    fn extension(cards: &[&str]) -> HduDescriptor {
        describe(&[EMPTY_PRIMARY, cards], 1)
    }

    #[test]
    fn empty_primary_is_other() {
        let d = describe(&[EMPTY_PRIMARY], 0);
        assert_eq!(d.kind, HduKind::Other);
        assert_eq!(d.extension, "PRIMARY");
        assert_eq!(d.shape.to_string(), "no data");
    }

    #[test]
    fn degenerate_image_is_other() {
        let d = describe(
            &[&["SIMPLE  = T", "BITPIX  = 16", "NAXIS   = 2", "NAXIS1  = 1", "NAXIS2  = 1"]],
            0,
        );
        assert_eq!(d.kind, HduKind::Other);
        assert_eq!(d.bitpix, Some(16));
    }

    #[test]
    fn image_extension() {
        let d = extension(&[
            "XTENSION= 'IMAGE   '",
            "BITPIX  = -32",
            "NAXIS   = 2",
            "NAXIS1  = 8",
            "NAXIS2  = 4",
            "PCOUNT  = 0",
            "GCOUNT  = 1",
        ]);
        assert_eq!(d.kind, HduKind::Image);
        assert_eq!(d.image_size(), Some((8, 4)));
        assert_eq!(d.pixel_type_name(), "float32");
    }

    #[test]
    fn binary_table_columns() {
        let d = extension(&[
            "XTENSION= 'BINTABLE'",
            "BITPIX  = 8",
            "NAXIS   = 2",
            "NAXIS1  = 12",
            "NAXIS2  = 3",
            "PCOUNT  = 0",
            "GCOUNT  = 1",
            "TFIELDS = 2",
            "TTYPE1  = 'ID'",
            "TFORM1  = 'J'",
            "TZERO1  = 2147483648",
            "TFORM2  = 'D'",
            "TUNIT2  = 'deg'",
            "EXTNAME = 'CATALOG'",
        ]);
        assert_eq!(d.kind, HduKind::Table);
        assert_eq!(d.shape, HduShape::Table { rows: 3, columns: 2 });
        assert_eq!(d.column_names(), vec!["ID", "COL2"]);
        assert_eq!((d.columns[1].offset, d.columns[1].width), (4, 8));
        assert_eq!(d.columns[1].unit.as_deref(), Some("deg"));
        assert_eq!(d.columns[0].scaling.zero, 2147483648.0);
        assert!(d.columns[1].scaling.is_identity());
        assert_eq!(d.name.as_deref(), Some("CATALOG"));
        assert_eq!(d.table.map(|t| t.heap_offset), Some(36));
    }

    #[test]
    fn ascii_table_columns() {
        let d = extension(&[
            "XTENSION= 'TABLE   '",
            "BITPIX  = 8",
            "NAXIS   = 2",
            "NAXIS1  = 13",
            "NAXIS2  = 2",
            "PCOUNT  = 0",
            "GCOUNT  = 1",
            "TFIELDS = 2",
            "TTYPE1  = 'STAR'",
            "TBCOL1  = 1",
            "TFORM1  = 'A6'",
            "TTYPE2  = 'MAG'",
            "TBCOL2  = 8",
            "TFORM2  = 'F6.2'",
            "TNULL2  = '******'",
        ]);
        assert_eq!(d.kind, HduKind::Table);
        assert_eq!(d.table.map(|t| t.encoding), Some(Encoding::Ascii));
        assert_eq!((d.columns[1].offset, d.columns[1].width), (7, 6));
        assert_eq!(d.columns[1].scaling.null, Some(NullValue::Text("******".into())));
    }

    #[test]
    fn compressed_image_is_not_a_table() {
        let d = extension(&[
            "XTENSION= 'BINTABLE'",
            "BITPIX  = 8",
            "NAXIS   = 2",
            "NAXIS1  = 8",
            "NAXIS2  = 1",
            "PCOUNT  = 0",
            "GCOUNT  = 1",
            "TFIELDS = 1",
            "TFORM1  = '1PB'",
            "ZIMAGE  = T",
            "ZBITPIX = 16",
            "ZNAXIS  = 2",
            "ZNAXIS1 = 4",
            "ZNAXIS2 = 4",
            "ZCMPTYPE= 'RICE_1'",
        ]);
        assert_eq!(d.kind, HduKind::Other);
    }

    #[test]
    fn oversized_columns_are_rejected() {
        let d = extension(&[
            "XTENSION= 'BINTABLE'",
            "BITPIX  = 8",
            "NAXIS   = 2",
            "NAXIS1  = 4",
            "NAXIS2  = 1",
            "PCOUNT  = 0",
            "GCOUNT  = 1",
            "TFIELDS = 1",
            "TFORM1  = 'D'",
        ]);
        assert_eq!(d.kind, HduKind::Other);
    }

    #[test]
    fn overflowing_repeat_count_makes_the_table_unusable() {
        let d = extension(&[
            "XTENSION= 'BINTABLE'",
            "BITPIX  = 8",
            "NAXIS   = 2",
            "NAXIS1  = 16",
            "NAXIS2  = 1",
            "PCOUNT  = 0",
            "GCOUNT  = 1",
            "TFIELDS = 2",
            "TFORM1  = 'J'",
            "TFORM2  = '2305843009213693952D'",
        ]);
        assert_eq!(d.kind, HduKind::Other);
        assert!(d.columns.is_empty());
    }

    #[test]
    fn overflowing_ascii_offset_makes_the_table_unusable() {
        let d = extension(&[
            "XTENSION= 'TABLE   '",
            "BITPIX  = 8",
            "NAXIS   = 2",
            "NAXIS1  = 8",
            "NAXIS2  = 1",
            "PCOUNT  = 0",
            "GCOUNT  = 1",
            "TFIELDS = 1",
            "TBCOL1  = 9223372036854775807",
            "TFORM1  = 'A8'",
        ]);
        assert_eq!(d.kind, HduKind::Other);
    }
}
