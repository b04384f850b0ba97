use nalgebra::Vector3;

use super::error::ColorError;
use super::observer::ObserverTable;
use super::spectrum::Spd;
use super::system::{Chromaticity, ColorSystem};

/// CIE tristimulus values. Y is relative luminance, normalized so that an
/// equal-energy spectrum integrates to Y = 1.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Xyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Xyz {
    /// Chromaticity of these tristimulus values, or `None` at the
    /// degenerate black point X + Y + Z = 0.
    pub fn chromaticity(&self) -> Option<Chromaticity> {
        let sum = self.x + self.y + self.z;
        if sum <= 0.0 {
            return None;
        }
        Some(Chromaticity {
            x: self.x / sum,
            y: self.y / sum,
        })
    }
}

/// Gamma-encoded device color, each channel in [0, 1].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    /// True if the color fell outside the device gamut and was desaturated.
    pub clipped: bool,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        clipped: false,
    };

    /// 8-bit per channel encoding for transports that expect integers.
    pub fn to_bytes(&self) -> [u8; 3] {
        let quant = |c: f64| (c * 255.0).round().clamp(0.0, 255.0) as u8;
        [quant(self.r), quant(self.g), quant(self.b)]
    }
}

/// Integrate an SPD against the observer table with the trapezoidal rule.
///
/// The result is normalized by the integral of ybar alone, so brightness is
/// comparable across color temperatures and a flat spectrum yields Y = 1.
pub fn spd_to_xyz(spd: &Spd, observer: &ObserverTable) -> Result<Xyz, ColorError> {
    let samples = observer.samples();
    let power = spd.power();
    if power.len() != samples.len() {
        return Err(ColorError::InvalidParameter(format!(
            "SPD has {} samples, observer has {}",
            power.len(),
            samples.len()
        )));
    }
    let mut x = 0.0;
    let mut y = 0.0;
    let mut z = 0.0;
    let mut y_norm = 0.0;
    for i in 0..samples.len() - 1 {
        let a = &samples[i];
        let b = &samples[i + 1];
        let dl = b.wavelength - a.wavelength;
        x += 0.5 * (power[i] * a.x_bar + power[i + 1] * b.x_bar) * dl;
        y += 0.5 * (power[i] * a.y_bar + power[i + 1] * b.y_bar) * dl;
        z += 0.5 * (power[i] * a.z_bar + power[i + 1] * b.z_bar) * dl;
        y_norm += 0.5 * (a.y_bar + b.y_bar) * dl;
    }
    if y_norm <= 0.0 || !y_norm.is_finite() {
        return Err(ColorError::Numerical(format!(
            "ybar integral is {}",
            y_norm
        )));
    }
    let xyz = Xyz {
        x: x / y_norm,
        y: y / y_norm,
        z: z / y_norm,
    };
    for c in [xyz.x, xyz.y, xyz.z] {
        if !c.is_finite() || c < 0.0 {
            return Err(ColorError::Numerical(format!(
                "tristimulus out of range: {:?}",
                xyz
            )));
        }
    }
    Ok(xyz)
}

/// Convert an SPD to a displayable color in `system`, dimmed by `brightness`.
///
/// Follows the fixed pipeline: tristimulus integration, XYZ to linear RGB,
/// desaturation toward white for out-of-gamut colors, scaling by the SPD's
/// relative luminance with a hue-preserving rescale when a channel would
/// exceed 1, gamma encoding, and finally the post-gamma brightness factor.
pub fn to_rgb(
    spd: &Spd,
    observer: &ObserverTable,
    system: &ColorSystem,
    brightness: f64,
) -> Result<Rgb, ColorError> {
    if !brightness.is_finite() || !(0.0..=1.0).contains(&brightness) {
        return Err(ColorError::InvalidParameter(format!(
            "brightness must be in [0, 1], got {}",
            brightness
        )));
    }
    let xyz = spd_to_xyz(spd, observer)?;
    if xyz.chromaticity().is_none() {
        return Ok(Rgb::BLACK);
    }

    let m = system.xyz_to_rgb_matrix()?;
    let linear = m * Vector3::new(xyz.x, xyz.y, xyz.z);
    let (mut r, mut g, mut b) = (linear.x, linear.y, linear.z);

    // Out of gamut: mix in just enough of the system's own white, which is
    // (1,1,1) in its RGB space, to lift the most negative channel to zero.
    let mut clipped = false;
    let min = r.min(g).min(b);
    if min < 0.0 {
        r -= min;
        g -= min;
        b -= min;
        clipped = true;
    }

    r *= xyz.y;
    g *= xyz.y;
    b *= xyz.y;
    let max = r.max(g).max(b);
    if max > 1.0 {
        r /= max;
        g /= max;
        b /= max;
    }
    r = r.clamp(0.0, 1.0);
    g = g.clamp(0.0, 1.0);
    b = b.clamp(0.0, 1.0);

    if system.gamma != 1.0 {
        let encode = 1.0 / system.gamma;
        r = r.powf(encode);
        g = g.powf(encode);
        b = b.powf(encode);
    }

    r *= brightness;
    g *= brightness;
    b *= brightness;
    for c in [r, g, b] {
        if !c.is_finite() {
            return Err(ColorError::Numerical(format!(
                "non-finite channel after encoding: {} {} {}",
                r, g, b
            )));
        }
    }
    Ok(Rgb { r, g, b, clipped })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::colorimetry::spectrum::spd_for;
    use crate::colorimetry::system::{HDTV, SRGB};

    fn observer() -> &'static ObserverTable {
        ObserverTable::cie_1931()
    }

    #[test]
    fn equal_energy_spectrum_is_near_the_equal_energy_white() {
        let spd = Spd::flat(observer());
        let xyz = spd_to_xyz(&spd, observer()).unwrap();
        assert!((xyz.y - 1.0).abs() < 1e-12, "Y = {}", xyz.y);
        let xy = xyz.chromaticity().unwrap();
        assert!((xy.x - 0.333).abs() < 0.005, "x = {}", xy.x);
        assert!((xy.y - 0.333).abs() < 0.005, "y = {}", xy.y);
    }

    #[test]
    fn chromaticity_moves_down_the_locus_as_temperature_rises() {
        let mut last_x = f64::MAX;
        for kelvin in [2000.0, 3000.0, 4000.0, 5000.0, 6500.0, 10000.0] {
            let spd = spd_for(kelvin, observer()).unwrap();
            let xy = spd_to_xyz(&spd, observer())
                .unwrap()
                .chromaticity()
                .unwrap();
            assert!(
                xy.x < last_x,
                "x did not decrease at {} K: {} -> {}",
                kelvin,
                last_x,
                xy.x
            );
            last_x = xy.x;
        }
    }

    #[test]
    fn output_always_stays_inside_unit_range() {
        for kelvin in (1..=40).map(|k| k as f64 * 1000.0) {
            let spd = spd_for(kelvin, observer()).unwrap();
            let rgb = to_rgb(&spd, observer(), &SRGB, 1.0).unwrap();
            for c in [rgb.r, rgb.g, rgb.b] {
                assert!((0.0..=1.0).contains(&c), "{} K gave {:?}", kelvin, rgb);
            }
        }
    }

    #[test]
    fn deep_red_falls_outside_the_gamut_and_is_desaturated() {
        let spd = spd_for(1000.0, observer()).unwrap();
        let rgb = to_rgb(&spd, observer(), &SRGB, 1.0).unwrap();
        assert!(rgb.clipped);
        assert!(rgb.g >= 0.0 && rgb.b >= 0.0);
    }

    #[test]
    fn dimming_preserves_channel_ratios() {
        let spd = spd_for(3200.0, observer()).unwrap();
        let full = to_rgb(&spd, observer(), &HDTV, 1.0).unwrap();
        let half = to_rgb(&spd, observer(), &HDTV, 0.5).unwrap();
        assert!((half.r / full.r - 0.5).abs() < 1e-12);
        assert!((half.g / full.g - 0.5).abs() < 1e-12);
        assert!((half.b / full.b - 0.5).abs() < 1e-12);
        assert!((full.r / full.b - half.r / half.b).abs() < 1e-9);
    }

    #[test]
    fn afternoon_daylight_is_near_neutral() {
        let spd = spd_for(5500.0, observer()).unwrap();
        let rgb = to_rgb(&spd, observer(), &HDTV, 1.0).unwrap();
        let max = rgb.r.max(rgb.g).max(rgb.b);
        let min = rgb.r.min(rgb.g).min(rgb.b);
        // A 10% channel spread would be the natural bound for "neutral",
        // but blackbody 5500 K sits ~12% warm of the D65 white these
        // primaries are balanced for, so allow 15% here and check true
        // neutrality at 6500 K (D65's correlated color temperature) below.
        assert!(max / min < 1.15, "not near-neutral: {:?}", rgb);
        let d65ish = spd_for(6500.0, observer()).unwrap();
        let rgb = to_rgb(&d65ish, observer(), &HDTV, 1.0).unwrap();
        let max = rgb.r.max(rgb.g).max(rgb.b);
        let min = rgb.r.min(rgb.g).min(rgb.b);
        assert!(max / min < 1.05, "not neutral at 6500 K: {:?}", rgb);
    }

    #[test]
    fn sunset_temperature_is_red_weighted() {
        let spd = spd_for(2000.0, observer()).unwrap();
        let rgb = to_rgb(&spd, observer(), &HDTV, 1.0).unwrap();
        assert!(rgb.r > rgb.b * 1.5, "{:?}", rgb);
        assert!(rgb.r > rgb.g, "{:?}", rgb);
    }

    #[test]
    fn night_spd_is_black_at_any_brightness() {
        let spd = Spd::off(observer());
        for brightness in [0.0, 0.3, 1.0] {
            let rgb = to_rgb(&spd, observer(), &HDTV, brightness).unwrap();
            assert_eq!(rgb, Rgb::BLACK);
        }
    }

    #[test]
    fn rejects_out_of_range_brightness() {
        let spd = spd_for(5000.0, observer()).unwrap();
        for brightness in [-0.1, 1.1, f64::NAN] {
            assert!(matches!(
                to_rgb(&spd, observer(), &HDTV, brightness),
                Err(ColorError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn rejects_mismatched_spd_length() {
        let small = ObserverTable::parse("380 0.1 0.2 0.3\n390 0.1 0.2 0.3\n").unwrap();
        let spd = Spd::flat(&small);
        assert!(matches!(
            spd_to_xyz(&spd, observer()),
            Err(ColorError::InvalidParameter(_))
        ));
    }

    #[test]
    fn byte_conversion_rounds_and_clamps() {
        let rgb = Rgb {
            r: 1.0,
            g: 0.5,
            b: 0.0,
            clipped: false,
        };
        assert_eq!(rgb.to_bytes(), [255, 128, 0]);
    }
}
