use serde_derive::{Deserialize, Serialize};

use crate::colorimetry::engine;
use crate::colorimetry::error::ColorError;
use crate::colorimetry::observer::ObserverTable;
use crate::colorimetry::spectrum::{spd_for, Spd};
use crate::colorimetry::system::ColorSystem;

/// What a fixture should show: a relative brightness and a color.
#[derive(PartialEq, Clone, Debug)]
pub struct LightValue {
    pub brightness: f64, // 0 - 1
    pub color: LightColor,
}

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum LightColor {
    Off,
    Kelvin(f64),
    Xy { x: f64, y: f64 }, // CIE 1931 color coordinates
}

impl LightValue {
    pub fn off() -> LightValue {
        LightValue {
            brightness: 0.0,
            color: LightColor::Off,
        }
    }

    pub fn is_off(&self) -> bool {
        self.color == LightColor::Off || self.brightness <= 0.0
    }
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Copy, Debug)]
pub struct XyColor {
    pub x: f64,
    pub y: f64,
}

/// Wire payload for a fixture, shaped like a zigbee2mqtt `set` message:
/// `{"state":"on","color":{"x":..,"y":..},"brightness":1..254}`. The off
/// state is a bare `{"state":"off"}`.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct LightState {
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<XyColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
}

impl LightState {
    pub fn off() -> LightState {
        LightState {
            state: "off".to_string(),
            color: None,
            brightness: None,
        }
    }

    /// Resolve a [`LightValue`] to a wire payload. Kelvin colors go through
    /// the colorimetry engine (SPD, tristimulus, chromaticity); xy colors
    /// pass straight through. Fixtures treat brightness 0 as a power cut,
    /// so lit values floor at 1 of 254.
    pub fn from_value(
        value: &LightValue,
        observer: &ObserverTable,
    ) -> Result<LightState, ColorError> {
        if !value.brightness.is_finite() || !(0.0..=1.0).contains(&value.brightness) {
            return Err(ColorError::InvalidParameter(format!(
                "brightness must be in [0, 1], got {}",
                value.brightness
            )));
        }
        if value.is_off() {
            return Ok(LightState::off());
        }
        let color = match value.color {
            LightColor::Off => unreachable!("handled by is_off above"),
            LightColor::Xy { x, y } => XyColor { x, y },
            LightColor::Kelvin(kelvin) => {
                let spd = spd_for(kelvin, observer)?;
                let xyz = engine::spd_to_xyz(&spd, observer)?;
                match xyz.chromaticity() {
                    Some(xy) => XyColor {
                        x: round4(xy.x),
                        y: round4(xy.y),
                    },
                    None => return Ok(LightState::off()),
                }
            }
        };
        let brightness = ((value.brightness * 254.0).round() as u8).max(1);
        Ok(LightState {
            state: "on".to_string(),
            color: Some(color),
            brightness: Some(brightness),
        })
    }

    /// 8-bit RGB rendition of this state, for transports that take RGB
    /// instead of xy. Uses the engine's full gamut-safe pipeline.
    pub fn to_rgb_bytes(
        value: &LightValue,
        observer: &ObserverTable,
        system: &ColorSystem,
    ) -> Result<[u8; 3], ColorError> {
        let spd = match value.color {
            LightColor::Off => Spd::off(observer),
            LightColor::Kelvin(kelvin) => spd_for(kelvin, observer)?,
            LightColor::Xy { .. } => {
                return Err(ColorError::InvalidParameter(
                    "xy values carry no spectrum to render as RGB".to_string(),
                ))
            }
        };
        let rgb = engine::to_rgb(&spd, observer, system, value.brightness)?;
        Ok(rgb.to_bytes())
    }
}

// The wire format carries four decimals.
fn round4(v: f64) -> f64 {
    (v * 10000.0).round() / 10000.0
}
