use super::error::ColorError;
use super::observer::ObserverTable;

// Second radiation constant h*c/k, expressed for wavelengths in nm.
const C2_NM_KELVIN: f64 = 1.438_776_877e7;

// exp(x) - 1 overflows f64 well before this; treat the spectral power as zero.
const MAX_EXPONENT: f64 = 700.0;

/// Relative spectral power distribution sampled at an observer table's
/// wavelengths. Values are non-negative and finite, scaled so the largest
/// sample is 1 (or all zero for the off/night distribution).
#[derive(Debug, Clone, PartialEq)]
pub struct Spd {
    power: Vec<f64>,
}

impl Spd {
    /// Planckian (blackbody) distribution for a color temperature in Kelvin,
    /// evaluated at each wavelength of `observer`.
    ///
    /// Power per wavelength is proportional to lambda^-5 / (exp(c2/(lambda*T)) - 1).
    /// The exponent is clamped so extreme lambda*T products underflow to zero
    /// power instead of overflowing the division.
    pub fn planckian(kelvin: f64, observer: &ObserverTable) -> Result<Spd, ColorError> {
        if !kelvin.is_finite() || kelvin <= 0.0 {
            return Err(ColorError::InvalidParameter(format!(
                "color temperature must be > 0 K, got {}",
                kelvin
            )));
        }
        let mut power = Vec::with_capacity(observer.len());
        for sample in observer.samples() {
            let lambda = sample.wavelength;
            let exponent = C2_NM_KELVIN / (lambda * kelvin);
            let p = if exponent > MAX_EXPONENT {
                0.0
            } else {
                lambda.powi(-5) / (exponent.exp() - 1.0)
            };
            if !p.is_finite() || p < 0.0 {
                return Err(ColorError::Numerical(format!(
                    "blackbody power {} at {} nm, {} K",
                    p, lambda, kelvin
                )));
            }
            power.push(p);
        }
        let max = power.iter().cloned().fold(0.0f64, f64::max);
        if max > 0.0 {
            for p in &mut power {
                *p /= max;
            }
        }
        Ok(Spd { power })
    }

    /// Degenerate no-light distribution used for the night phase.
    pub fn off(observer: &ObserverTable) -> Spd {
        Spd {
            power: vec![0.0; observer.len()],
        }
    }

    /// Equal-energy distribution (unit power everywhere).
    pub fn flat(observer: &ObserverTable) -> Spd {
        Spd {
            power: vec![1.0; observer.len()],
        }
    }

    pub fn power(&self) -> &[f64] {
        &self.power
    }

    /// True if no wavelength carries any power.
    pub fn is_dark(&self) -> bool {
        self.power.iter().all(|p| *p == 0.0)
    }
}

/// Distribution for a daylight color temperature. Thin wrapper kept as the
/// main entry point so callers do not choose the model themselves.
pub fn spd_for(kelvin: f64, observer: &ObserverTable) -> Result<Spd, ColorError> {
    Spd::planckian(kelvin, observer)
}
