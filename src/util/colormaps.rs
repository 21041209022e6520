//! Color palettes for image rendering.

use ratatui::style::Color;

/// Palette used to draw normalized pixel values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorPalette {
    /// Black to white.
    #[default]
    Gray,
    /// Viridis.
    Viridis,
    /// Plasma.
    Plasma,
    /// Blue to red through the hue circle.
    Rainbow,
    /// Blue-white-red diverging.
    BlueRed,
}

impl ColorPalette {
    /// Next palette in the cycle.
    pub fn next(self) -> Self {
        match self {
            Self::Gray => Self::Viridis,
            Self::Viridis => Self::Plasma,
            Self::Plasma => Self::Rainbow,
            Self::Rainbow => Self::BlueRed,
            Self::BlueRed => Self::Gray,
        }
    }

    /// Palette name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Gray => "gray",
            Self::Viridis => "viridis",
            Self::Plasma => "plasma",
            Self::Rainbow => "rainbow",
            Self::BlueRed => "blue-red",
        }
    }

    /// Map a normalized value (0.0 to 1.0) to an RGB color.
    pub fn color(self, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let stops: &[[u8; 3]] = match self {
            Self::Gray => &GRAY,
            Self::Viridis => &VIRIDIS,
            Self::Plasma => &PLASMA,
            Self::Rainbow => &RAINBOW,
            Self::BlueRed => &BLUE_RED,
        };
        interpolate(stops, t)
    }
}

const GRAY: [[u8; 3]; 2] = [[0, 0, 0], [255, 255, 255]];

const VIRIDIS: [[u8; 3]; 5] = [
    [68, 1, 84],
    [59, 82, 139],
    [33, 145, 140],
    [94, 201, 98],
    [253, 231, 37],
];

const PLASMA: [[u8; 3]; 5] = [
    [13, 8, 135],
    [126, 3, 168],
    [204, 71, 120],
    [248, 149, 64],
    [240, 249, 33],
];

// Hue 240° down to 0° at full saturation
const RAINBOW: [[u8; 3]; 5] = [
    [0, 0, 255],
    [0, 255, 255],
    [0, 255, 0],
    [255, 255, 0],
    [255, 0, 0],
];

const BLUE_RED: [[u8; 3]; 3] = [[0, 0, 255], [255, 255, 255], [255, 0, 0]];

/// Piecewise linear interpolation between evenly spaced color stops.
fn interpolate(stops: &[[u8; 3]], t: f64) -> Color {
    let segments = stops.len().saturating_sub(1);
    if segments == 0 {
        let [r, g, b] = stops.first().copied().unwrap_or([0, 0, 0]);
        return Color::Rgb(r, g, b);
    }

    let pos = t * segments as f64;
    let i = (pos.floor() as usize).min(segments - 1);
    let frac = pos - i as f64;
    let (lo, hi) = (stops[i], stops[i + 1]);
    let channel = |c: usize| {
        (f64::from(lo[c]) + (f64::from(hi[c]) - f64::from(lo[c])) * frac).round() as u8
    };
    Color::Rgb(channel(0), channel(1), channel(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_endpoints() {
        assert_eq!(ColorPalette::Gray.color(0.0), Color::Rgb(0, 0, 0));
        assert_eq!(ColorPalette::Gray.color(1.0), Color::Rgb(255, 255, 255));
        assert_eq!(ColorPalette::Gray.color(7.0), Color::Rgb(255, 255, 255));
        assert_eq!(ColorPalette::Gray.color(0.5), Color::Rgb(128, 128, 128));
    }

    #[test]
    fn diverging_midpoint_is_white() {
        assert_eq!(ColorPalette::BlueRed.color(0.5), Color::Rgb(255, 255, 255));
        assert_eq!(ColorPalette::BlueRed.color(0.0), Color::Rgb(0, 0, 255));
        assert_eq!(ColorPalette::Viridis.color(1.0), Color::Rgb(253, 231, 37));
    }

    #[test]
    fn cycle_returns_to_gray() {
        let mut palette = ColorPalette::default();
        for _ in 0..5 {
            palette = palette.next();
        }
        assert_eq!(palette, ColorPalette::Gray);
    }
}
