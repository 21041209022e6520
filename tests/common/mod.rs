//! Small FITS writer for integration tests.

#![allow(dead_code)]

use std::io::Write;
use tempfile::NamedTempFile;

const BLOCK: usize = 2880;

/// Builds a FITS file HDU by HDU.
#[derive(Default)]
pub struct FitsBuilder {
    bytes: Vec<u8>,
}

fn pad(bytes: &mut Vec<u8>, fill: u8) {
    let padded = bytes.len().div_ceil(BLOCK) * BLOCK;
    bytes.resize(padded, fill);
}

fn header_bytes(cards: &[String]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for card in cards.iter().map(String::as_str).chain(["END"]) {
        bytes.extend_from_slice(format!("{:<80}", card).as_bytes());
    }
    pad(&mut bytes, b' ');
    bytes
}

/// `KEYWORD = value` card.
pub fn card(keyword: &str, value: impl std::fmt::Display) -> String {
    format!("{:<8}= {:>20}", keyword, value)
}

/// `KEYWORD = 'text'` card.
pub fn text_card(keyword: &str, value: &str) -> String {
    format!("{:<8}= '{:<8}'", keyword, value)
}

impl FitsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, cards: &[String], data: &[u8]) -> Self {
        self.bytes.extend(header_bytes(cards));
        let mut data = data.to_vec();
        pad(&mut data, 0);
        self.bytes.extend(data);
        self
    }

    /// Primary HDU with no data.
    pub fn empty_primary(self) -> Self {
        self.push(
            &[
                card("SIMPLE", "T"),
                card("BITPIX", 8),
                card("NAXIS", 0),
                card("EXTEND", "T"),
            ],
            &[],
        )
    }

    /// Primary 16-bit image; `extra` cards follow the axis keywords.
    pub fn primary_image_i16(self, width: usize, height: usize, values: &[i16], extra: &[String]) -> Self {
        let mut cards = vec![
            card("SIMPLE", "T"),
            card("BITPIX", 16),
            card("NAXIS", 2),
            card("NAXIS1", width),
            card("NAXIS2", height),
        ];
        cards.extend_from_slice(extra);
        let data: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        self.push(&cards, &data)
    }

    /// IMAGE extension of 32-bit floats.
    pub fn image_f32(self, name: &str, width: usize, height: usize, values: &[f32], extra: &[String]) -> Self {
        let mut cards = vec![
            text_card("XTENSION", "IMAGE"),
            card("BITPIX", -32),
            card("NAXIS", 2),
            card("NAXIS1", width),
            card("NAXIS2", height),
            card("PCOUNT", 0),
            card("GCOUNT", 1),
            text_card("EXTNAME", name),
        ];
        cards.extend_from_slice(extra);
        let data: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        self.push(&cards, &data)
    }

    /// BINTABLE with columns `ID` (J), `FLUX` (D, unit Jy) and `NAME` (8A).
    ///
    /// Row `i` holds `ID = i`, `FLUX = i * 0.5` and `NAME = "obj{i}"`.
    pub fn catalog_table(self, name: &str, rows: usize) -> Self {
        let cards = [
            text_card("XTENSION", "BINTABLE"),
            card("BITPIX", 8),
            card("NAXIS", 2),
            card("NAXIS1", 20),
            card("NAXIS2", rows),
            card("PCOUNT", 0),
            card("GCOUNT", 1),
            card("TFIELDS", 3),
            text_card("TTYPE1", "ID"),
            text_card("TFORM1", "J"),
            text_card("TTYPE2", "FLUX"),
            text_card("TFORM2", "D"),
            text_card("TUNIT2", "Jy"),
            text_card("TTYPE3", "NAME"),
            text_card("TFORM3", "8A"),
            text_card("EXTNAME", name),
        ];
        let mut data = Vec::with_capacity(rows * 20);
        for i in 0..rows {
            data.extend_from_slice(&(i as i32).to_be_bytes());
            data.extend_from_slice(&(i as f64 * 0.5).to_be_bytes());
            data.extend_from_slice(format!("{:<8}", format!("obj{}", i)).as_bytes());
        }
        self.push(&cards, &data)
    }

    /// ASCII TABLE with columns `STAR` (A6) and `MAG` (F6.2).
    pub fn ascii_table(self, rows: &[(&str, f64)]) -> Self {
        let cards = [
            text_card("XTENSION", "TABLE"),
            card("BITPIX", 8),
            card("NAXIS", 2),
            card("NAXIS1", 13),
            card("NAXIS2", rows.len()),
            card("PCOUNT", 0),
            card("GCOUNT", 1),
            card("TFIELDS", 2),
            text_card("TTYPE1", "STAR"),
            card("TBCOL1", 1),
            text_card("TFORM1", "A6"),
            text_card("TTYPE2", "MAG"),
            card("TBCOL2", 8),
            text_card("TFORM2", "F6.2"),
        ];
        let mut data = Vec::new();
        for (star, mag) in rows {
            data.extend_from_slice(format!("{:<6} {:>6.2}", star, mag).as_bytes());
        }
        let mut padded = data;
        let len = padded.len();
        padded.resize(len.div_ceil(BLOCK) * BLOCK, b' ');
        self.push(&cards, &padded)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Write the file to a temporary path.
    pub fn write(self) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".fits")
            .tempfile()
            .expect("create temp file");
        file.write_all(&self.bytes).expect("write FITS bytes");
        file.flush().expect("flush FITS bytes");
        file
    }
}

/// TAN WCS cards centred on `(ra, dec)` at pixel `(crpix1, crpix2)` with
/// a 1 arcsecond scale and RA increasing to the left.
pub fn tan_wcs(ra: f64, dec: f64, crpix1: f64, crpix2: f64) -> Vec<String> {
    vec![
        text_card("CTYPE1", "RA---TAN"),
        text_card("CTYPE2", "DEC--TAN"),
        card("CRPIX1", format!("{:.1}", crpix1)),
        card("CRPIX2", format!("{:.1}", crpix2)),
        card("CRVAL1", format!("{:.6}", ra)),
        card("CRVAL2", format!("{:.6}", dec)),
        card("CDELT1", "-2.777777777778E-04"),
        card("CDELT2", "2.777777777778E-04"),
    ]
}
