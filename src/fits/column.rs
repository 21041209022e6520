//! Table column formats and cell decoding.
//!
//! TFORM parsing and the big-endian element readers come from
//! `fitsio-pure`; this module adds the per-cell access the table window
//! needs (one row, a subset of columns, heap arrays) and the TSCALn,
//! TZEROn and TNULLn conventions.

use crate::error::{FitsViewError, Result};
use crate::fits::Header;
use fitsio_pure::bintable::{binary_type_byte_size, parse_tform_binary, BinaryColumnType};
use fitsio_pure::endian::{read_f32_be, read_f64_be, read_i16_be, read_i32_be, read_i64_be};
use fitsio_pure::table::{parse_tform_ascii, AsciiColumnFormat};
use std::fmt;

/// Largest magnitude an `f64` holds without losing integer precision.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// How cells of a table are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Big-endian binary (BINTABLE).
    Binary,
    /// Fixed-width text (TABLE).
    Ascii,
}

/// Parsed TFORM of one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnFormat {
    /// `repeat` elements stored inline in the row.
    Binary {
        /// Element type.
        dtype: BinaryColumnType,
        /// Repeat count (characters for `A`, bits for `X`).
        repeat: usize,
    },
    /// `P`/`Q` descriptor into the heap.
    VarArray {
        /// Element type stored in the heap.
        element: BinaryColumnType,
        /// `true` for 64-bit `Q` descriptors.
        wide: bool,
    },
    /// Text field of an ASCII table.
    Ascii(AsciiColumnFormat),
}

fn invalid_tform(tform: &str, e: impl fmt::Display) -> FitsViewError {
    FitsViewError::invalid(format!("invalid TFORM '{}': {}", tform.trim(), e))
}

impl ColumnFormat {
    /// Parse a binary-table TFORM such as `1J`, `20A`, `16X` or `1PE(120)`.
    pub fn parse_binary(tform: &str) -> Result<Self> {
        let (repeat, dtype) = parse_tform_binary(tform).map_err(|e| invalid_tform(tform, e))?;
        match dtype {
            BinaryColumnType::VarArrayP(_) | BinaryColumnType::VarArrayQ(_) => {
                let code = tform.trim().split('(').next().unwrap_or_default();
                let element = code
                    .get(code.len().saturating_sub(1)..)
                    .ok_or_else(|| invalid_tform(tform, "missing element type"))?;
                let (_, element) = parse_tform_binary(element).map_err(|e| invalid_tform(tform, e))?;
                Ok(ColumnFormat::VarArray {
                    element,
                    wide: matches!(dtype, BinaryColumnType::VarArrayQ(_)),
                })
            },
            dtype => Ok(ColumnFormat::Binary { dtype, repeat }),
        }
    }

    /// Parse an ASCII-table TFORM such as `A12`, `I8`, `F10.4` or `E15.7`.
    pub fn parse_ascii(tform: &str) -> Result<Self> {
        parse_tform_ascii(tform)
            .map(ColumnFormat::Ascii)
            .map_err(|e| invalid_tform(tform, e))
    }

    /// Cell encoding.
    pub fn encoding(&self) -> Encoding {
        match self {
            ColumnFormat::Ascii(_) => Encoding::Ascii,
            _ => Encoding::Binary,
        }
    }

    /// Bytes the column occupies in each row.
    ///
    /// Fails when the repeat count overflows the address space.
    pub fn width(&self) -> Result<usize> {
        match self {
            ColumnFormat::Binary {
                dtype: BinaryColumnType::Bit,
                repeat,
            } => Ok(repeat.div_ceil(8)),
            ColumnFormat::Binary { dtype, repeat } => repeat
                .checked_mul(binary_type_byte_size(dtype))
                .ok_or_else(|| FitsViewError::invalid(format!("column of {} elements overflows", repeat))),
            ColumnFormat::VarArray { wide: false, .. } => Ok(8),
            ColumnFormat::VarArray { wide: true, .. } => Ok(16),
            ColumnFormat::Ascii(format) => Ok(format.width()),
        }
    }
}

/// Null marker of a column (TNULLn).
#[derive(Debug, Clone, PartialEq)]
pub enum NullValue {
    /// Stored integer of a binary column.
    Integer(i64),
    /// Field text of an ASCII column.
    Text(String),
}

/// Linear scaling and null marker of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnScaling {
    /// TSCALn, default 1.
    pub scale: f64,
    /// TZEROn, default 0.
    pub zero: f64,
    /// TNULLn.
    pub null: Option<NullValue>,
}

impl Default for ColumnScaling {
    fn default() -> Self {
        Self {
            scale: 1.0,
            zero: 0.0,
            null: None,
        }
    }
}

impl ColumnScaling {
    /// Read TSCALn, TZEROn and TNULLn of the 1-based column `n`.
    pub fn from_header(header: &Header, n: usize, encoding: Encoding) -> Self {
        let null_key = format!("TNULL{}", n);
        let null = match encoding {
            Encoding::Binary => header.get_i64(&null_key).map(NullValue::Integer),
            Encoding::Ascii => header
                .get_str(&null_key)
                .map(|s| NullValue::Text(s.trim().to_string())),
        };
        Self {
            scale: header.get_f64(&format!("TSCAL{}", n)).unwrap_or(1.0),
            zero: header.get_f64(&format!("TZERO{}", n)).unwrap_or(0.0),
            null,
        }
    }

    /// Returns `true` when stored values are the physical values.
    pub fn is_identity(&self) -> bool {
        self.scale == 1.0 && self.zero == 0.0
    }

    /// Physical value of a stored integer; `native` is returned unscaled.
    fn integer(&self, raw: i64, native: CellValue) -> CellValue {
        if self.null == Some(NullValue::Integer(raw)) {
            return CellValue::Null;
        }
        if self.is_identity() {
            return native;
        }
        let physical = self.zero + self.scale * raw as f64;
        // Offset-only integers (the unsigned convention) stay integers
        if self.scale == 1.0 && self.zero.fract() == 0.0 && physical.abs() <= MAX_EXACT_INTEGER {
            CellValue::Long(physical as i64)
        } else {
            CellValue::Double(physical)
        }
    }

    fn real(&self, raw: f64, native: CellValue) -> CellValue {
        if self.is_identity() {
            native
        } else {
            CellValue::Double(self.zero + self.scale * raw)
        }
    }
}

/// A decoded table cell in its stored type.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Undefined value.
    Null,
    /// Logical.
    Logical(bool),
    /// Unsigned byte.
    Byte(u8),
    /// 16-bit integer.
    Short(i16),
    /// 32-bit integer.
    Int(i32),
    /// 64-bit integer.
    Long(i64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
    /// Complex of 32-bit floats.
    ComplexFloat(f32, f32),
    /// Complex of 64-bit floats.
    ComplexDouble(f64, f64),
    /// Characters, trailing blanks removed.
    Text(String),
    /// Bit array.
    Bits(Vec<bool>),
    /// Vector cell (repeat > 1 or variable-length).
    Array(Vec<CellValue>),
}

impl CellValue {
    /// Numeric value, if the cell holds a real scalar.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Byte(v) => Some(f64::from(*v)),
            CellValue::Short(v) => Some(f64::from(*v)),
            CellValue::Int(v) => Some(f64::from(*v)),
            CellValue::Long(v) => Some(*v as f64),
            CellValue::Float(v) => Some(f64::from(*v)),
            CellValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns `true` for a floating point NaN.
    pub fn is_nan(&self) -> bool {
        match self {
            CellValue::Float(v) => v.is_nan(),
            CellValue::Double(v) => v.is_nan(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "--"),
            CellValue::Logical(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            CellValue::Byte(v) => write!(f, "{}", v),
            CellValue::Short(v) => write!(f, "{}", v),
            CellValue::Int(v) => write!(f, "{}", v),
            CellValue::Long(v) => write!(f, "{}", v),
            CellValue::Float(v) if v.is_nan() => write!(f, "NaN"),
            CellValue::Double(v) if v.is_nan() => write!(f, "NaN"),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Double(v) => write!(f, "{}", v),
            CellValue::ComplexFloat(re, im) => write!(f, "({}{:+}j)", re, im),
            CellValue::ComplexDouble(re, im) => write!(f, "({}{:+}j)", re, im),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Bits(bits) => {
                for b in bits {
                    write!(f, "{}", u8::from(*b))?;
                }
                Ok(())
            },
            CellValue::Array(values) => {
                write!(f, "[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            },
        }
    }
}

/// `len` bytes at `at`, failing instead of panicking past the end.
fn field(bytes: &[u8], at: usize, len: usize) -> Result<&[u8]> {
    at.checked_add(len)
        .and_then(|end| bytes.get(at..end))
        .ok_or_else(|| FitsViewError::invalid("cell extends past the end of the data"))
}

fn decode_element(bytes: &[u8], at: usize, dtype: BinaryColumnType, scaling: &ColumnScaling) -> Result<CellValue> {
    let b = field(bytes, at, binary_type_byte_size(&dtype))?;
    Ok(match dtype {
        BinaryColumnType::Logical => match b[0] {
            b'T' => CellValue::Logical(true),
            b'F' => CellValue::Logical(false),
            _ => CellValue::Null,
        },
        BinaryColumnType::Byte => scaling.integer(i64::from(b[0]), CellValue::Byte(b[0])),
        BinaryColumnType::Short => {
            let v = read_i16_be(b);
            scaling.integer(i64::from(v), CellValue::Short(v))
        },
        BinaryColumnType::Int => {
            let v = read_i32_be(b);
            scaling.integer(i64::from(v), CellValue::Int(v))
        },
        BinaryColumnType::Long => {
            let v = read_i64_be(b);
            scaling.integer(v, CellValue::Long(v))
        },
        BinaryColumnType::Float => {
            let v = read_f32_be(b);
            scaling.real(f64::from(v), CellValue::Float(v))
        },
        BinaryColumnType::Double => {
            let v = read_f64_be(b);
            scaling.real(v, CellValue::Double(v))
        },
        BinaryColumnType::ComplexFloat => CellValue::ComplexFloat(read_f32_be(b), read_f32_be(&b[4..])),
        BinaryColumnType::ComplexDouble => CellValue::ComplexDouble(read_f64_be(b), read_f64_be(&b[8..])),
        BinaryColumnType::Ascii => CellValue::Text(char::from(b[0]).to_string()),
        BinaryColumnType::Bit | BinaryColumnType::VarArrayP(_) | BinaryColumnType::VarArrayQ(_) => {
            return Err(FitsViewError::invalid("nested array element"))
        },
    })
}

fn decode_text(bytes: &[u8]) -> CellValue {
    // Strings stop at the first NUL
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    CellValue::Text(String::from_utf8_lossy(&bytes[..end]).trim_end().to_string())
}

fn decode_elements(
    bytes: &[u8],
    start: usize,
    count: usize,
    dtype: BinaryColumnType,
    scaling: &ColumnScaling,
) -> Result<CellValue> {
    match dtype {
        BinaryColumnType::Ascii => Ok(decode_text(field(bytes, start, count)?)),
        BinaryColumnType::Bit => {
            let packed = field(bytes, start, count.div_ceil(8))?;
            let bits = (0..count)
                .map(|i| packed[i / 8] & (0x80 >> (i % 8)) != 0)
                .collect();
            Ok(CellValue::Bits(bits))
        },
        _ if count == 1 => decode_element(bytes, start, dtype, scaling),
        _ => {
            let size = binary_type_byte_size(&dtype);
            let total = count
                .checked_mul(size)
                .ok_or_else(|| FitsViewError::invalid(format!("array of {} elements overflows", count)))?;
            let span = field(bytes, start, total)?;
            let values = (0..count)
                .map(|i| decode_element(span, i * size, dtype, scaling))
                .collect::<Result<Vec<_>>>()?;
            Ok(CellValue::Array(values))
        },
    }
}

/// Decode one binary-table cell.
///
/// `cell` holds exactly the column's bytes for one row; `heap` is the
/// table's heap area, needed only for variable-length columns.
pub fn decode_binary_cell(cell: &[u8], format: &ColumnFormat, heap: &[u8], scaling: &ColumnScaling) -> Result<CellValue> {
    match format {
        ColumnFormat::VarArray { element, wide } => {
            let (count, offset) = if *wide {
                (read_i64_be(field(cell, 0, 8)?), read_i64_be(field(cell, 8, 8)?))
            } else {
                (
                    i64::from(read_i32_be(field(cell, 0, 4)?)),
                    i64::from(read_i32_be(field(cell, 4, 4)?)),
                )
            };
            let count = usize::try_from(count)
                .map_err(|_| FitsViewError::invalid("negative array descriptor"))?;
            let offset = usize::try_from(offset)
                .map_err(|_| FitsViewError::invalid("negative heap offset"))?;
            match decode_elements(heap, offset, count, *element, scaling)? {
                single @ (CellValue::Array(_) | CellValue::Text(_) | CellValue::Bits(_)) => Ok(single),
                single => Ok(CellValue::Array(vec![single])),
            }
        },
        ColumnFormat::Binary {
            dtype: dtype @ (BinaryColumnType::Ascii | BinaryColumnType::Bit),
            repeat,
        } => decode_elements(cell, 0, *repeat, *dtype, scaling),
        ColumnFormat::Binary { repeat: 0, .. } => Ok(CellValue::Array(Vec::new())),
        ColumnFormat::Binary { dtype, repeat } => decode_elements(cell, 0, *repeat, *dtype, scaling),
        ColumnFormat::Ascii(_) => Err(FitsViewError::invalid("ASCII column in a binary table")),
    }
}

/// Decode one ASCII-table cell. Unparsable numbers are kept as text.
pub fn decode_ascii_cell(bytes: &[u8], format: &ColumnFormat, scaling: &ColumnScaling) -> CellValue {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    let is_null = match &scaling.null {
        Some(NullValue::Text(null)) => null == text,
        _ => false,
    };
    if text.is_empty() || is_null {
        return CellValue::Null;
    }

    let as_text = || CellValue::Text(text.to_string());
    match format {
        ColumnFormat::Ascii(AsciiColumnFormat::Integer(_)) => text
            .parse::<i64>()
            .map(|v| scaling.integer(v, CellValue::Long(v)))
            .unwrap_or_else(|_| as_text()),
        ColumnFormat::Ascii(
            AsciiColumnFormat::FloatF(..) | AsciiColumnFormat::FloatE(..) | AsciiColumnFormat::DoubleE(..),
        ) => text
            .replace(['D', 'd'], "E")
            .parse::<f64>()
            .map(|v| scaling.real(v, CellValue::Double(v)))
            .unwrap_or_else(|_| as_text()),
        _ => as_text(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fits::header::tests::header;

    fn binary(tform: &str) -> ColumnFormat {
        ColumnFormat::parse_binary(tform).unwrap()
    }

    #[test]
    fn binary_tform_widths() {
        assert_eq!(binary("20A").width().unwrap(), 20);
        assert_eq!(binary("D").width().unwrap(), 8);
        assert_eq!(binary("13X").width().unwrap(), 2);
        assert_eq!(binary("3I").width().unwrap(), 6);

        let f = binary("1PE(120)");
        assert_eq!(
            f,
            ColumnFormat::VarArray {
                element: BinaryColumnType::Float,
                wide: false
            }
        );
        assert_eq!(f.width().unwrap(), 8);
        assert_eq!(binary("1QJ").width().unwrap(), 16);

        assert!(ColumnFormat::parse_binary("3Z").is_err());
    }

    #[test]
    fn huge_repeat_count_is_an_error() {
        let f = binary("2305843009213693952D");
        assert!(f.width().is_err());
    }

    #[test]
    fn ascii_tform_widths() {
        assert_eq!(ColumnFormat::parse_ascii("F10.4").unwrap().width().unwrap(), 10);
        assert_eq!(ColumnFormat::parse_ascii("I8").unwrap().encoding(), Encoding::Ascii);
        assert!(ColumnFormat::parse_ascii("Q3").is_err());
    }

    #[test]
    fn decodes_vector_cell() {
        let bytes = [0u8, 1, 0xff, 0xff, 0, 3];
        let value = decode_binary_cell(&bytes, &binary("3I"), &[], &ColumnScaling::default()).unwrap();
        assert_eq!(
            value,
            CellValue::Array(vec![CellValue::Short(1), CellValue::Short(-1), CellValue::Short(3)])
        );
        assert_eq!(value.to_string(), "[1 -1 3]");
    }

    #[test]
    fn decodes_heap_array() {
        let descriptor = [0u8, 0, 0, 2, 0, 0, 0, 4];
        let heap = [0u8, 0, 0, 0, 0, 0, 0, 7, 0, 0, 0, 9];
        let value = decode_binary_cell(&descriptor, &binary("1PJ"), &heap, &ColumnScaling::default()).unwrap();
        assert_eq!(value, CellValue::Array(vec![CellValue::Int(7), CellValue::Int(9)]));
    }

    #[test]
    fn oversized_heap_descriptor_is_an_error() {
        // count = i32::MAX at offset 0
        let descriptor = [0x7fu8, 0xff, 0xff, 0xff, 0, 0, 0, 0];
        let result = decode_binary_cell(&descriptor, &binary("1PD"), &[0u8; 16], &ColumnScaling::default());
        assert!(result.is_err());
    }

    #[test]
    fn truncated_cell_is_an_error() {
        assert!(decode_binary_cell(&[0u8; 4], &binary("1D"), &[], &ColumnScaling::default()).is_err());
    }

    #[test]
    fn unsigned_convention_and_null_marker() {
        let h = header(&["TZERO1  =                32768", "TNULL1  =                   -1"]);
        let scaling = ColumnScaling::from_header(&h, 1, Encoding::Binary);
        assert_eq!(scaling.null, Some(NullValue::Integer(-1)));

        let format = binary("I");
        let decode = |raw: i16| decode_binary_cell(&raw.to_be_bytes(), &format, &[], &scaling).unwrap();
        assert_eq!(decode(i16::MIN), CellValue::Long(0));
        assert_eq!(decode(0), CellValue::Long(32768));
        assert_eq!(decode(7232), CellValue::Long(40000));
        assert_eq!(decode(-1), CellValue::Null);
    }

    #[test]
    fn scale_and_zero_give_physical_values() {
        let h = header(&["TSCAL1  =                  0.5", "TZERO1  =                 10.0"]);
        let scaling = ColumnScaling::from_header(&h, 1, Encoding::Binary);
        let value = decode_binary_cell(&4i32.to_be_bytes(), &binary("J"), &[], &scaling).unwrap();
        assert_eq!(value, CellValue::Double(12.0));

        let value = decode_binary_cell(&2.0f32.to_be_bytes(), &binary("E"), &[], &scaling).unwrap();
        assert_eq!(value, CellValue::Double(11.0));
    }

    #[test]
    fn ascii_cells() {
        let format = ColumnFormat::parse_ascii("E12.4").unwrap();
        let plain = ColumnScaling::default();
        assert_eq!(decode_ascii_cell(b"  1.5000D+02", &format, &plain), CellValue::Double(150.0));
        assert_eq!(decode_ascii_cell(b"            ", &format, &plain), CellValue::Null);

        let null = ColumnScaling {
            null: Some(NullValue::Text("***".into())),
            ..ColumnScaling::default()
        };
        assert_eq!(decode_ascii_cell(b"         ***", &format, &null), CellValue::Null);
    }
}
