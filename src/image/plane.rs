//! Pixel planes loaded from image HDUs.

use crate::catalog::{HduCatalog, HduKind};
use crate::error::{FitsViewError, Result};
use crate::fits::FitsFile;
use fitsio_pure::image::{apply_bscale_bzero, blank_mask, extract_blank, extract_bscale_bzero, read_image_section};
use ndarray::Array2;

/// The first 2D plane of an image HDU, in physical units.
///
/// Row 0 is the first row stored in the file, which is drawn at the
/// bottom of the display.
#[derive(Debug, Clone)]
pub struct ImagePlane {
    /// HDU the plane was read from.
    pub hdu: usize,
    /// Values indexed `[y, x]`; BLANK pixels are NaN.
    pub values: Array2<f64>,
    /// Smallest finite value.
    pub min: f64,
    /// Largest finite value.
    pub max: f64,
}

impl ImagePlane {
    /// Decode the first plane of image HDU `hdu`.
    pub fn load(file: &FitsFile, catalog: &HduCatalog, hdu: usize) -> Result<Self> {
        let descriptor = catalog.describe(hdu)?;
        let unsupported = || FitsViewError::UnsupportedHdu {
            index: hdu,
            expected: "image",
        };
        if descriptor.kind != HduKind::Image {
            return Err(unsupported());
        }
        let (width, height) = descriptor.image_size().ok_or_else(unsupported)?;
        let count = width
            .checked_mul(height)
            .ok_or_else(|| FitsViewError::invalid("image plane size overflows"))?;

        let unit = catalog.data_unit(hdu)?;
        let cards = catalog.header(hdu)?.cards();
        let raw = read_image_section(file.bytes()?, unit, 0, count)?;
        let (bscale, bzero) = extract_bscale_bzero(cards);
        let mut values = apply_bscale_bzero(&raw, bscale, bzero);
        if let Some(mask) = blank_mask(&raw, extract_blank(cards)) {
            for (value, blank) in values.iter_mut().zip(mask) {
                if blank {
                    *value = f64::NAN;
                }
            }
        }

        tracing::info!(
            "Loaded image HDU #{} ({}x{}, {})",
            hdu,
            width,
            height,
            descriptor.pixel_type_name()
        );

        let values = Array2::from_shape_vec((height, width), values)
            .map_err(|e| FitsViewError::invalid(e.to_string()))?;
        Ok(Self::from_array(hdu, values))
    }

    /// Wrap an in-memory array.
    pub fn from_array(hdu: usize, values: Array2<f64>) -> Self {
        let (min, max) = values
            .iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let (min, max) = if min > max { (0.0, 0.0) } else { (min, max) };
        Self {
            hdu,
            values,
            min,
            max,
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.values.ncols()
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.values.nrows()
    }

    /// Physical value at source pixel `(x, y)`.
    pub fn value(&self, x: usize, y: usize) -> Option<f64> {
        self.values.get([y, x]).copied()
    }

    /// Value scaled to `[0, 1]` by the finite range; NaN stays NaN.
    pub fn normalized(&self, x: usize, y: usize) -> Option<f64> {
        let range = self.max - self.min;
        let range = if range.abs() < 1e-12 { 1.0 } else { range };
        self.value(x, y).map(|v| (v - self.min) / range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn range_ignores_nan() {
        let plane = ImagePlane::from_array(0, array![[1.0, f64::NAN], [3.0, 5.0]]);
        assert_eq!((plane.min, plane.max), (1.0, 5.0));
        assert_eq!(plane.normalized(0, 1), Some(0.5));
        assert!(plane.normalized(1, 0).unwrap().is_nan());
        assert_eq!(plane.normalized(2, 0), None);
    }

    #[test]
    fn flat_plane_normalizes_to_zero() {
        let plane = ImagePlane::from_array(0, Array2::from_elem((2, 2), 7.0));
        assert_eq!(plane.normalized(1, 1), Some(0.0));
    }
}
