//! Rotation and zoom of a pixel plane into display space.
//!
//! Display space is the source plane drawn origin-lower, rotated by quarter
//! turns counter-clockwise, then scaled by the zoom factor with
//! nearest-neighbour sampling. The mapper undoes the zoom first and the
//! rotation second.

use super::plane::ImagePlane;
use ndarray::Array2;

/// Result of mapping a display pixel back to the source plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappedPixel {
    /// Source pixel `(x, y)`, y counted from the first stored row.
    Inside {
        /// Source column.
        x: usize,
        /// Source row.
        y: usize,
    },
    /// The display pixel lies outside the raster.
    Outside,
}

/// Mapping between display pixels and source pixels for one view state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelMapper {
    width: usize,
    height: usize,
    rotation: u8,
    scale: f64,
}

impl PixelMapper {
    /// Mapper for a `width` x `height` source, `rotation` CCW quarter turns
    /// and a total `scale`.
    pub fn new(width: usize, height: usize, rotation: u8, scale: f64) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            rotation: rotation % 4,
            scale,
        }
    }

    /// Source dimensions after rotation, before scaling.
    pub fn rotated_size(&self) -> (usize, usize) {
        if self.rotation % 2 == 1 {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }

    /// Raster dimensions in display pixels, at least 1x1.
    pub fn display_size(&self) -> (usize, usize) {
        let (w, h) = self.rotated_size();
        let scaled = |n: usize| ((n as f64 * self.scale).round() as usize).max(1);
        (scaled(w), scaled(h))
    }

    /// Source pixel shown at display pixel `(dx, dy)`.
    pub fn to_source(&self, dx: usize, dy: usize) -> MappedPixel {
        let (dw, dh) = self.display_size();
        if dx >= dw || dy >= dh {
            return MappedPixel::Outside;
        }

        // Undo zoom: sample at the display pixel centre
        let (rw, rh) = self.rotated_size();
        let mut a = (((dx as f64 + 0.5) * rw as f64 / dw as f64) as usize).min(rw - 1);
        let mut b = (((dy as f64 + 0.5) * rh as f64 / dh as f64) as usize).min(rh - 1);

        // Undo rotation one quarter turn at a time
        let (mut fw, mut fh) = (rw, rh);
        for _ in 0..self.rotation {
            let (pw, ph) = (fh, fw);
            let (u, v) = (pw - 1 - b, a);
            a = u;
            b = v;
            fw = pw;
            fh = ph;
        }

        MappedPixel::Inside {
            x: a,
            y: self.height - 1 - b,
        }
    }

    /// Display pixel at the centre of source pixel `(x, y)`.
    pub fn to_display(&self, x: usize, y: usize) -> Option<(usize, usize)> {
        if x >= self.width || y >= self.height {
            return None;
        }

        let (mut u, mut v) = (x, self.height - 1 - y);
        let (mut fw, mut fh) = (self.width, self.height);
        for _ in 0..self.rotation {
            let (nu, nv) = (v, fw - 1 - u);
            u = nu;
            v = nv;
            std::mem::swap(&mut fw, &mut fh);
        }

        let (dw, dh) = self.display_size();
        let dx = (((u as f64 + 0.5) * dw as f64 / fw as f64) as usize).min(dw - 1);
        let dy = (((v as f64 + 0.5) * dh as f64 / fh as f64) as usize).min(dh - 1);
        Some((dx, dy))
    }
}

/// Display-ready values in `[0, 1]`, indexed `[row, column]`; NaN marks
/// blank pixels.
#[derive(Debug, Clone)]
pub struct Raster {
    /// Normalized values.
    pub values: Array2<f64>,
    /// Display x of the first column.
    pub origin_x: usize,
    /// Display y of the first row.
    pub origin_y: usize,
}

impl Raster {
    /// Width in display pixels.
    pub fn width(&self) -> usize {
        self.values.ncols()
    }

    /// Height in display pixels.
    pub fn height(&self) -> usize {
        self.values.nrows()
    }

    /// Value at raster-relative `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        self.values.get([y, x]).copied()
    }
}

/// Render the whole plane for `mapper`.
pub fn render(plane: &ImagePlane, mapper: &PixelMapper) -> Raster {
    let (w, h) = mapper.display_size();
    render_window(plane, mapper, 0, 0, w, h)
}

/// Render the display rectangle starting at `(x0, y0)`.
///
/// The window is clipped to the raster.
pub fn render_window(
    plane: &ImagePlane,
    mapper: &PixelMapper,
    x0: usize,
    y0: usize,
    width: usize,
    height: usize,
) -> Raster {
    let (dw, dh) = mapper.display_size();
    let width = width.min(dw.saturating_sub(x0));
    let height = height.min(dh.saturating_sub(y0));

    let values = Array2::from_shape_fn((height, width), |(row, col)| {
        match mapper.to_source(x0 + col, y0 + row) {
            MappedPixel::Inside { x, y } => plane.normalized(x, y).unwrap_or(f64::NAN),
            MappedPixel::Outside => f64::NAN,
        }
    });

    Raster {
        values,
        origin_x: x0,
        origin_y: y0,
    }
}
