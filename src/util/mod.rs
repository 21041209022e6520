//! Utility functions.
//!
//! Color palettes for the image view.

pub mod colormaps;

pub use colormaps::ColorPalette;
