//! Image transform pipeline.
//!
//! [`ImageViewState`] holds zoom, rotation, cursor and pan for one image
//! HDU. [`transform::render`] turns a [`plane::ImagePlane`] and a state into
//! a raster plus the [`transform::PixelMapper`] that maps display pixels
//! back to the source.

pub mod plane;
pub mod transform;

pub use plane::ImagePlane;
pub use transform::{render, render_window, MappedPixel, PixelMapper, Raster};

use crate::config::ZoomLimits;

/// Zoom, rotation, cursor and pan of the image view.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageViewState {
    /// Image HDU index.
    pub hdu: usize,
    source_size: (usize, usize),
    limits: ZoomLimits,
    zoom_steps: i32,
    rotation: u8,
    base_scale: f64,
    cursor: (usize, usize),
    pan: (usize, usize),
    viewport: (usize, usize),
}

impl ImageViewState {
    /// Fresh state at 100% zoom and no rotation for a `width` x `height`
    /// image.
    pub fn new(hdu: usize, width: usize, height: usize, limits: ZoomLimits) -> Self {
        Self {
            hdu,
            source_size: (width.max(1), height.max(1)),
            limits,
            zoom_steps: 0,
            rotation: 0,
            base_scale: 1.0,
            cursor: (0, 0),
            pan: (0, 0),
            viewport: (0, 0),
        }
    }

    /// Source image size.
    pub fn source_size(&self) -> (usize, usize) {
        self.source_size
    }

    /// Zoom factor relative to the fitted size.
    pub fn zoom(&self) -> f64 {
        self.limits.step.powi(self.zoom_steps)
    }

    /// Rotation in counter-clockwise quarter turns, 0..=3.
    pub fn rotation(&self) -> u8 {
        self.rotation
    }

    /// Rotation in degrees counter-clockwise.
    pub fn rotation_degrees(&self) -> u16 {
        u16::from(self.rotation) * 90
    }

    /// Scale applied to the source at 100% zoom.
    pub fn base_scale(&self) -> f64 {
        self.base_scale
    }

    /// Cursor in display pixels.
    pub fn cursor(&self) -> (usize, usize) {
        self.cursor
    }

    /// Top-left display pixel of the visible window.
    pub fn pan_offset(&self) -> (usize, usize) {
        self.pan
    }

    /// Visible window size in display pixels.
    pub fn viewport(&self) -> (usize, usize) {
        self.viewport
    }

    /// Mapper for the current zoom and rotation.
    pub fn mapper(&self) -> PixelMapper {
        let (w, h) = self.source_size;
        PixelMapper::new(w, h, self.rotation, self.base_scale * self.zoom())
    }

    /// Source pixel under the cursor.
    pub fn cursor_source(&self) -> MappedPixel {
        self.mapper().to_source(self.cursor.0, self.cursor.1)
    }

    /// Multiply the zoom by one step. Refused above the zoom cap.
    pub fn zoom_in(&mut self) -> bool {
        if self.limits.step.powi(self.zoom_steps + 1) > self.limits.max {
            return false;
        }
        self.retransform(|s| s.zoom_steps += 1);
        true
    }

    /// Divide the zoom by one step. Refused below the zoom floor.
    pub fn zoom_out(&mut self) -> bool {
        if self.limits.step.powi(self.zoom_steps - 1) < self.limits.min {
            return false;
        }
        self.retransform(|s| s.zoom_steps -= 1);
        true
    }

    /// Rotate 90° counter-clockwise.
    pub fn rotate_left(&mut self) {
        self.retransform(|s| s.rotation = (s.rotation + 1) % 4);
    }

    /// Rotate 90° clockwise.
    pub fn rotate_right(&mut self) {
        self.retransform(|s| s.rotation = (s.rotation + 3) % 4);
    }

    /// Fit the unzoomed image into a `width` x `height` display-pixel
    /// viewport and reset pan and cursor.
    pub fn fit_to(&mut self, width: usize, height: usize) {
        let (rw, rh) = self.mapper().rotated_size();
        let width = width.max(1);
        let height = height.max(1);
        self.viewport = (width, height);
        self.base_scale = (width as f64 / rw as f64).min(height as f64 / rh as f64);
        self.pan = (0, 0);
        let (dw, dh) = self.mapper().display_size();
        self.cursor = (dw / 2, dh / 2);
        self.keep_cursor_visible();
    }

    /// Record a new viewport size without refitting.
    pub fn set_viewport(&mut self, width: usize, height: usize) {
        self.viewport = (width.max(1), height.max(1));
        self.keep_cursor_visible();
    }

    /// Place the cursor. Returns `false` (state unchanged) outside the raster.
    pub fn set_cursor(&mut self, x: usize, y: usize) -> bool {
        let (dw, dh) = self.mapper().display_size();
        if x >= dw || y >= dh {
            return false;
        }
        self.cursor = (x, y);
        self.keep_cursor_visible();
        true
    }

    /// Move the cursor by `(dx, dy)` display pixels, clamped to the raster.
    pub fn move_cursor(&mut self, dx: i64, dy: i64) {
        let (dw, dh) = self.mapper().display_size();
        self.cursor = (
            offset_clamped(self.cursor.0, dx, dw - 1),
            offset_clamped(self.cursor.1, dy, dh - 1),
        );
        self.keep_cursor_visible();
    }

    /// Shift the visible window by `(dx, dy)` display pixels.
    pub fn pan(&mut self, dx: i64, dy: i64) {
        let (max_x, max_y) = self.max_pan();
        self.pan = (
            offset_clamped(self.pan.0, dx, max_x),
            offset_clamped(self.pan.1, dy, max_y),
        );
    }

    fn max_pan(&self) -> (usize, usize) {
        let (dw, dh) = self.mapper().display_size();
        (
            dw.saturating_sub(self.viewport.0),
            dh.saturating_sub(self.viewport.1),
        )
    }

    /// Scroll the window so the cursor stays inside the viewport.
    fn keep_cursor_visible(&mut self) {
        let (vw, vh) = self.viewport;
        if vw == 0 || vh == 0 {
            return;
        }
        let (cx, cy) = self.cursor;
        if cx < self.pan.0 {
            self.pan.0 = cx;
        } else if cx >= self.pan.0 + vw {
            self.pan.0 = cx + 1 - vw;
        }
        if cy < self.pan.1 {
            self.pan.1 = cy;
        } else if cy >= self.pan.1 + vh {
            self.pan.1 = cy + 1 - vh;
        }
        let (max_x, max_y) = self.max_pan();
        self.pan = (self.pan.0.min(max_x), self.pan.1.min(max_y));
    }

    /// Apply a zoom or rotation change, keeping the cursor on the same
    /// source pixel.
    fn retransform(&mut self, change: impl FnOnce(&mut Self)) {
        let source = self.cursor_source();
        change(self);
        let mapper = self.mapper();
        let (dw, dh) = mapper.display_size();
        self.cursor = match source {
            MappedPixel::Inside { x, y } => mapper.to_display(x, y).unwrap_or((0, 0)),
            MappedPixel::Outside => (self.cursor.0.min(dw - 1), self.cursor.1.min(dh - 1)),
        };
        self.keep_cursor_visible();
    }
}

fn offset_clamped(value: usize, delta: i64, max: usize) -> usize {
    let moved = value as i64 + delta;
    moved.clamp(0, max as i64) as usize
}
