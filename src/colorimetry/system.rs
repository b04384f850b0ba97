use nalgebra::{Matrix3, Vector3};

use super::error::ColorError;

/// CIE 1931 xy chromaticity coordinates.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Chromaticity {
    pub x: f64,
    pub y: f64,
}

impl Chromaticity {
    /// XYZ tristimulus of this chromaticity at unit luminance.
    pub fn to_xyz(self) -> Vector3<f64> {
        Vector3::new(self.x / self.y, 1.0, (1.0 - self.x - self.y) / self.y)
    }
}

/// A device color space: three primaries, a white point and a display gamma.
///
/// Encoding applies c^(1/gamma) to each linear channel, so `gamma == 1.0`
/// leaves the channels linear.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColorSystem {
    pub name: &'static str,
    pub red: Chromaticity,
    pub green: Chromaticity,
    pub blue: Chromaticity,
    pub white: Chromaticity,
    pub gamma: f64,
}

pub const D65_WHITE: Chromaticity = Chromaticity {
    x: 0.3127,
    y: 0.3291,
};

/// HDTV primaries with a D65 white point.
pub const HDTV: ColorSystem = ColorSystem {
    name: "hdtv",
    red: Chromaticity { x: 0.67, y: 0.33 },
    green: Chromaticity { x: 0.21, y: 0.71 },
    blue: Chromaticity { x: 0.15, y: 0.06 },
    white: D65_WHITE,
    gamma: 2.2,
};

/// SMPTE-C broadcast primaries.
pub const SMPTE: ColorSystem = ColorSystem {
    name: "smpte",
    red: Chromaticity { x: 0.63, y: 0.34 },
    green: Chromaticity { x: 0.31, y: 0.595 },
    blue: Chromaticity { x: 0.155, y: 0.07 },
    white: D65_WHITE,
    gamma: 2.2,
};

/// sRGB primaries. Uses a plain 2.2 exponent rather than the piecewise
/// sRGB transfer curve; close enough for fixture output.
pub const SRGB: ColorSystem = ColorSystem {
    name: "srgb",
    red: Chromaticity { x: 0.64, y: 0.33 },
    green: Chromaticity { x: 0.30, y: 0.60 },
    blue: Chromaticity { x: 0.15, y: 0.06 },
    white: D65_WHITE,
    gamma: 2.2,
};

impl ColorSystem {
    /// Same system without gamma encoding.
    pub fn linear(self) -> ColorSystem {
        ColorSystem { gamma: 1.0, ..self }
    }

    /// Matrix taking linear RGB in this system to XYZ, with the primaries
    /// scaled so that RGB (1,1,1) lands exactly on the white point.
    pub fn rgb_to_xyz_matrix(&self) -> Result<Matrix3<f64>, ColorError> {
        let r = self.red.to_xyz();
        let g = self.green.to_xyz();
        let b = self.blue.to_xyz();
        let m = Matrix3::from_columns(&[r, g, b]);
        let inv = m.try_inverse().ok_or_else(|| {
            ColorError::Numerical(format!("degenerate primaries for {}", self.name))
        })?;
        let scale = inv * self.white.to_xyz();
        Ok(Matrix3::from_columns(&[
            r * scale.x,
            g * scale.y,
            b * scale.z,
        ]))
    }

    /// Matrix taking XYZ to linear RGB in this system.
    pub fn xyz_to_rgb_matrix(&self) -> Result<Matrix3<f64>, ColorError> {
        self.rgb_to_xyz_matrix()?.try_inverse().ok_or_else(|| {
            ColorError::Numerical(format!("singular conversion matrix for {}", self.name))
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // The white point must map to RGB (1,1,1) in its own system.
    #[test]
    fn white_point_round_trip() {
        for system in [HDTV, SMPTE, SRGB] {
            let m = system.xyz_to_rgb_matrix().unwrap();
            let rgb = m * system.white.to_xyz();
            for c in [rgb.x, rgb.y, rgb.z] {
                assert!((c - 1.0).abs() < 1e-9, "{}: {:?}", system.name, rgb);
            }
        }
    }

    #[test]
    fn primaries_map_to_single_channels() {
        let m = SRGB.xyz_to_rgb_matrix().unwrap();
        let red = m * SRGB.red.to_xyz();
        // Pure red chromaticity has no green or blue component.
        assert!(red.x > 0.0);
        assert!(red.y.abs() < 1e-9);
        assert!(red.z.abs() < 1e-9);
    }

    #[test]
    fn linear_drops_gamma() {
        assert_eq!(HDTV.linear().gamma, 1.0);
        assert_eq!(HDTV.linear().red, HDTV.red);
    }
}
