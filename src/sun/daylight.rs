use chrono::{DateTime, Datelike, Utc};
use solar_positioning::{spa, time::DeltaT, RefractionCorrection};

use crate::error::DynResult;
use crate::light::state::{LightColor, LightValue};

/// Geographic position of the fixture.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters above sea level.
    pub altitude: f64,
}

// Standard atmosphere used for the refraction correction.
const PRESSURE_HPA: f64 = 1013.25;
const TEMPERATURE_C: f64 = 12.0;

/// Apparent solar elevation in degrees at `when`, refraction-corrected.
pub fn solar_elevation(location: &Location, when: DateTime<Utc>) -> DynResult<f64> {
    let delta_t = DeltaT::estimate_from_date(when.year(), when.month())?;
    let refraction = RefractionCorrection::new(PRESSURE_HPA, TEMPERATURE_C)?;
    let position = spa::solar_position(
        when,
        location.latitude,
        location.longitude,
        location.altitude,
        delta_t,
        Some(refraction),
    )?;
    Ok(position.elevation_angle())
}

/// Maps solar elevation to a fixture setting.
///
/// Color temperature follows a Planckian ramp from `horizon_kelvin` at the
/// horizon up to `zenith_kelvin` for high sun; brightness approximates
/// relative irradiance with sin(elevation), with a linear ramp through
/// civil twilight down to `twilight_angle`, below which the light is off.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DaylightModel {
    pub twilight_angle: f64,
    pub horizon_kelvin: f64,
    pub zenith_kelvin: f64,
    pub twilight_brightness: f64,
}

impl Default for DaylightModel {
    fn default() -> DaylightModel {
        DaylightModel {
            twilight_angle: -6.0,
            horizon_kelvin: 2000.0,
            zenith_kelvin: 5800.0,
            twilight_brightness: 0.05,
        }
    }
}

impl DaylightModel {
    pub fn light_value(&self, elevation: f64) -> LightValue {
        if elevation <= self.twilight_angle {
            return LightValue::off();
        }
        let sun_height = elevation.to_radians().sin().clamp(0.0, 1.0);
        let kelvin =
            self.horizon_kelvin + (self.zenith_kelvin - self.horizon_kelvin) * sun_height.sqrt();
        let brightness = if elevation < 0.0 {
            // Twilight: fade from nothing at the cutoff up to the horizon level.
            self.twilight_brightness * (1.0 - elevation / self.twilight_angle)
        } else {
            self.twilight_brightness + (1.0 - self.twilight_brightness) * sun_height
        };
        LightValue {
            brightness: brightness.clamp(0.0, 1.0),
            color: LightColor::Kelvin(kelvin),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    fn model() -> DaylightModel {
        DaylightModel::default()
    }

    #[test]
    fn below_twilight_is_off() {
        for elevation in [-90.0, -20.0, -6.0] {
            assert_eq!(model().light_value(elevation), LightValue::off());
        }
    }

    #[test]
    fn twilight_fades_in() {
        let low = model().light_value(-5.0);
        let high = model().light_value(-1.0);
        assert!(low.brightness > 0.0);
        assert!(high.brightness > low.brightness);
        assert!(high.brightness <= model().twilight_brightness + 1e-9);
        // Twilight stays at the horizon color temperature.
        assert_eq!(low.color, LightColor::Kelvin(2000.0));
    }

    #[test]
    fn brightness_and_temperature_rise_with_the_sun() {
        let m = model();
        let mut last_brightness = 0.0;
        let mut last_kelvin = 0.0;
        for elevation in [-5.0, -1.0, 0.0, 5.0, 15.0, 30.0, 60.0, 90.0] {
            let value = m.light_value(elevation);
            let kelvin = match value.color {
                LightColor::Kelvin(k) => k,
                c => panic!("unexpected color {:?}", c),
            };
            assert!(value.brightness >= last_brightness, "at {}", elevation);
            assert!(kelvin >= last_kelvin, "at {}", elevation);
            last_brightness = value.brightness;
            last_kelvin = kelvin;
        }
        assert!((last_brightness - 1.0).abs() < 1e-9);
        assert!((last_kelvin - m.zenith_kelvin).abs() < 1e-9);
    }

    #[test]
    fn noon_sun_is_up_at_mid_latitudes() {
        let location = Location {
            latitude: 43.0,
            longitude: -73.5,
            altitude: 121.0,
        };
        let noon = Utc.with_ymd_and_hms(2024, 6, 21, 17, 0, 0).unwrap();
        let elevation = solar_elevation(&location, noon).unwrap();
        assert!(elevation > 50.0, "elevation {}", elevation);
        let midnight = Utc.with_ymd_and_hms(2024, 6, 21, 5, 0, 0).unwrap();
        let elevation = solar_elevation(&location, midnight).unwrap();
        assert!(elevation < 5.0, "elevation {}", elevation);
    }
}
