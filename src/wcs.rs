//! Astrometric resolver: pixel to sky coordinates.
//!
//! Supports the celestial projections found in survey images: TAN
//! (gnomonic, including TAN-SIP/TPV headers without applying distortion),
//! SIN (orthographic), and CAR or projection-less axes treated as linear.
//! Headers without a usable solution resolve to
//! [`WorldCoordinate::Unavailable`]; nothing here returns an error.

use crate::fits::Header;
use std::f64::consts::PI;
use std::fmt;

const R2D: f64 = 180.0 / PI;

/// Sky position under a pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorldCoordinate {
    /// Right ascension (or longitude) and declination (or latitude), degrees.
    Available {
        /// Longitude in `[0, 360)`.
        ra: f64,
        /// Latitude in `[-90, 90]`.
        dec: f64,
    },
    /// No astrometric solution, or the pixel has no sky position.
    Unavailable,
}

/// Projection of the celestial axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Gnomonic.
    Tan,
    /// Orthographic.
    Sin,
    /// Plate carrée or no projection code.
    Linear,
}

impl Projection {
    fn from_code(code: &str) -> Option<Self> {
        match code {
            "TAN" | "TPV" => Some(Projection::Tan),
            "SIN" => Some(Projection::Sin),
            "" | "CAR" => Some(Projection::Linear),
            _ => None,
        }
    }
}

/// Split a CTYPE such as `RA---TAN-SIP` into axis name and projection code.
fn split_ctype(ctype: &str) -> (&str, &str) {
    let ctype = ctype.trim();
    if ctype.len() <= 4 || !ctype.is_char_boundary(4) {
        return (ctype.trim_end_matches('-'), "");
    }
    let (axis, rest) = ctype.split_at(4);
    let code = rest.trim_start_matches('-');
    let code = code.split('-').next().unwrap_or(code);
    (axis.trim_end_matches('-'), code)
}

fn is_longitude(axis: &str) -> bool {
    axis == "RA" || (axis.len() == 4 && axis.ends_with("LON"))
}

fn is_latitude(axis: &str) -> bool {
    axis == "DEC" || (axis.len() == 4 && axis.ends_with("LAT"))
}

/// A celestial WCS read from an image header.
#[derive(Debug, Clone, PartialEq)]
pub struct WcsSolution {
    crpix: [f64; 2],
    crval: [f64; 2],
    cd: [[f64; 2]; 2],
    projection: Projection,
    labels: [String; 2],
}

impl WcsSolution {
    /// Read the solution from `header`, or `None` when it has no usable one.
    pub fn from_header(header: &Header) -> Option<Self> {
        let ctype1 = header.get_str("CTYPE1")?;
        let ctype2 = header.get_str("CTYPE2")?;
        let (axis1, code1) = split_ctype(ctype1);
        let (axis2, code2) = split_ctype(ctype2);
        if !is_longitude(axis1) || !is_latitude(axis2) || code1 != code2 {
            tracing::debug!("No celestial WCS for CTYPE '{}' / '{}'", ctype1, ctype2);
            return None;
        }
        let projection = Projection::from_code(code1)?;

        let crpix = [header.get_f64("CRPIX1")?, header.get_f64("CRPIX2")?];
        let crval = [header.get_f64("CRVAL1")?, header.get_f64("CRVAL2")?];
        let cd = linear_matrix(header)?;

        let det = cd[0][0] * cd[1][1] - cd[0][1] * cd[1][0];
        if det == 0.0 || !det.is_finite() {
            tracing::debug!("WCS matrix is singular");
            return None;
        }

        Some(Self {
            crpix,
            crval,
            cd,
            projection,
            labels: [ctype1.trim().to_string(), ctype2.trim().to_string()],
        })
    }

    /// Projection in use.
    pub fn projection(&self) -> Projection {
        self.projection
    }

    /// CTYPE1 and CTYPE2, for coordinate readouts.
    pub fn axis_labels(&self) -> (&str, &str) {
        (&self.labels[0], &self.labels[1])
    }

    /// Sky position of 0-based pixel `(x, y)`.
    pub fn pixel_to_world(&self, x: f64, y: f64) -> WorldCoordinate {
        // FITS pixel numbers start at 1
        let u = x + 1.0 - self.crpix[0];
        let v = y + 1.0 - self.crpix[1];
        let ix = self.cd[0][0] * u + self.cd[0][1] * v;
        let iy = self.cd[1][0] * u + self.cd[1][1] * v;

        let (ra, dec) = match self.projection {
            Projection::Linear => (self.crval[0] + ix, self.crval[1] + iy),
            Projection::Tan | Projection::Sin => {
                let r = ix.hypot(iy);
                let theta = match self.projection {
                    Projection::Tan => R2D.atan2(r),
                    _ => {
                        let cos_theta = r / R2D;
                        if cos_theta > 1.0 {
                            return WorldCoordinate::Unavailable;
                        }
                        cos_theta.acos()
                    },
                };
                let phi = if r == 0.0 { 0.0 } else { ix.atan2(-iy) };
                native_to_celestial(phi, theta, self.crval)
            },
        };

        if !ra.is_finite() || !dec.is_finite() {
            return WorldCoordinate::Unavailable;
        }
        WorldCoordinate::Available {
            ra: ra.rem_euclid(360.0),
            dec,
        }
    }
}

/// Rotate native spherical `(phi, theta)` (radians) to celestial degrees,
/// with the reference point at the native pole and LONPOLE = 180°.
fn native_to_celestial(phi: f64, theta: f64, crval: [f64; 2]) -> (f64, f64) {
    let alpha_p = crval[0].to_radians();
    let delta_p = crval[1].to_radians();
    let dphi = phi - PI;

    let (sin_t, cos_t) = theta.sin_cos();
    let (sin_dp, cos_dp) = delta_p.sin_cos();

    let y = -cos_t * dphi.sin();
    let x = sin_t * cos_dp - cos_t * sin_dp * dphi.cos();
    let alpha = alpha_p + y.atan2(x);
    let delta = (sin_t * sin_dp + cos_t * cos_dp * dphi.cos()).clamp(-1.0, 1.0).asin();

    (alpha.to_degrees(), delta.to_degrees())
}

/// Pixel-to-intermediate matrix from CDi_j, PCi_j with CDELTi, or CDELTi
/// with CROTA2.
fn linear_matrix(header: &Header) -> Option<[[f64; 2]; 2]> {
    let key = |prefix: &str, i: usize, j: usize| format!("{}{}_{}", prefix, i, j);
    let has = |prefix: &str| {
        (1..=2).any(|i| (1..=2).any(|j| header.contains(&key(prefix, i, j))))
    };
    let element = |prefix: &str, i: usize, j: usize, default: f64| {
        header.get_f64(&key(prefix, i, j)).unwrap_or(default)
    };

    if has("CD") {
        return Some([
            [element("CD", 1, 1, 0.0), element("CD", 1, 2, 0.0)],
            [element("CD", 2, 1, 0.0), element("CD", 2, 2, 0.0)],
        ]);
    }

    let cdelt = [header.get_f64("CDELT1")?, header.get_f64("CDELT2")?];
    if has("PC") {
        return Some([
            [element("PC", 1, 1, 1.0) * cdelt[0], element("PC", 1, 2, 0.0) * cdelt[0]],
            [element("PC", 2, 1, 0.0) * cdelt[1], element("PC", 2, 2, 1.0) * cdelt[1]],
        ]);
    }

    let (sin_r, cos_r) = header.get_f64("CROTA2").unwrap_or(0.0).to_radians().sin_cos();
    Some([
        [cdelt[0] * cos_r, -cdelt[1] * sin_r],
        [cdelt[0] * sin_r, cdelt[1] * cos_r],
    ])
}

/// Resolver bound to one image HDU.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    solution: Option<WcsSolution>,
}

impl Resolver {
    /// Build the resolver for an HDU header.
    pub fn from_header(header: &Header) -> Self {
        Self {
            solution: WcsSolution::from_header(header),
        }
    }

    /// Returns `true` when the HDU has a usable solution.
    pub fn has_solution(&self) -> bool {
        self.solution.is_some()
    }

    /// Solution, if any.
    pub fn solution(&self) -> Option<&WcsSolution> {
        self.solution.as_ref()
    }

    /// Sky position of 0-based source pixel `(x, y)`. Never fails.
    pub fn resolve(&self, x: f64, y: f64) -> WorldCoordinate {
        match &self.solution {
            Some(solution) => solution.pixel_to_world(x, y),
            None => WorldCoordinate::Unavailable,
        }
    }

    /// Cursor readout: sky position with axis labels, or the pixel position.
    pub fn readout(&self, x: f64, y: f64) -> String {
        match (&self.solution, self.resolve(x, y)) {
            (Some(solution), WorldCoordinate::Available { ra, dec }) => {
                let (lon, lat) = solution.axis_labels();
                format!("{}: {:.6}  {}: {:.6}", lon, ra, lat, dec)
            },
            _ => format!("Pixel X: {:.2}  Pixel Y: {:.2}", x, y),
        }
    }
}

impl fmt::Display for WorldCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldCoordinate::Available { ra, dec } => write!(f, "RA {:.6}  Dec {:.6}", ra, dec),
            WorldCoordinate::Unavailable => write!(f, "unavailable"),
        }
    }
}
