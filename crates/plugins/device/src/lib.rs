//! Smart light adapter for toolbridge.
//!
//! A mock actuator: the next state is computed from the request alone and
//! nothing is remembered between calls.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use toolbridge_core::{ControlLightArgs, Error, Result};
use tracing::info;

/// Full brightness, used when turning on without an explicit level.
pub const MAX_BRIGHTNESS: u8 = 100;

/// Power state of the light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Power {
    On,
    Off,
}

/// State of the light after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    pub power: Power,
    /// 0-100
    pub brightness: u8,
}

/// Compute the light state for an action.
///
/// `brightness` only applies to `on`; turning off always yields 0.
pub fn control_light(args: &ControlLightArgs) -> Result<DeviceState> {
    info!(action = args.action, brightness = ?args.brightness, "Light control");

    match args.action.as_str() {
        "on" => {
            let brightness = parse_brightness(args.brightness.as_ref())?;
            Ok(DeviceState {
                power: Power::On,
                brightness,
            })
        }
        "off" => Ok(DeviceState {
            power: Power::Off,
            brightness: 0,
        }),
        other => Err(Error::InvalidAction(format!(
            "unsupported light action '{}', expected 'on' or 'off'",
            other
        ))),
    }
}

/// Absent or `null` means full brightness; anything else must be an
/// integer in `0..=MAX_BRIGHTNESS`.
fn parse_brightness(raw: Option<&Value>) -> Result<u8> {
    let value = match raw {
        None | Some(Value::Null) => return Ok(MAX_BRIGHTNESS),
        Some(value) => value,
    };

    value
        .as_u64()
        .filter(|level| *level <= u64::from(MAX_BRIGHTNESS))
        .and_then(|level| u8::try_from(level).ok())
        .ok_or_else(|| {
            Error::InvalidInput(format!(
                "brightness must be an integer between 0 and {}, got {}",
                MAX_BRIGHTNESS, value
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(action: &str, brightness: Option<u8>) -> ControlLightArgs {
        raw_args(action, brightness.map(Value::from))
    }

    fn raw_args(action: &str, brightness: Option<Value>) -> ControlLightArgs {
        ControlLightArgs {
            action: action.to_string(),
            brightness,
        }
    }

    #[test]
    fn test_on_defaults_to_full_brightness() {
        let state = control_light(&args("on", None)).unwrap();
        assert_eq!(
            state,
            DeviceState {
                power: Power::On,
                brightness: 100
            }
        );
    }

    #[test]
    fn test_on_with_brightness() {
        let state = control_light(&args("on", Some(40))).unwrap();
        assert_eq!(state.power, Power::On);
        assert_eq!(state.brightness, 40);
    }

    #[test]
    fn test_on_with_zero_brightness_is_kept() {
        let state = control_light(&args("on", Some(0))).unwrap();
        assert_eq!(state.brightness, 0);
    }

    #[test]
    fn test_off_ignores_brightness() {
        let state = control_light(&args("off", Some(40))).unwrap();
        assert_eq!(
            state,
            DeviceState {
                power: Power::Off,
                brightness: 0
            }
        );
    }

    #[test]
    fn test_unknown_action() {
        let err = control_light(&args("dance", None)).unwrap_err();
        assert!(matches!(err, Error::InvalidAction(_)));
        assert!(err.to_string().contains("dance"));
    }

    #[test]
    fn test_brightness_out_of_range() {
        assert!(control_light(&args("on", Some(150))).is_err());
        assert!(control_light(&raw_args("on", Some(json!(-5)))).is_err());
        assert!(control_light(&raw_args("on", Some(json!(40.5)))).is_err());

        let err = control_light(&raw_args("on", Some(json!("high")))).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(err.to_string().contains("high"));
    }

    #[test]
    fn test_on_with_null_brightness() {
        let state = control_light(&raw_args("on", Some(Value::Null))).unwrap();
        assert_eq!(state.brightness, MAX_BRIGHTNESS);
    }

    #[test]
    fn test_off_accepts_any_brightness() {
        for raw in [json!(400), json!(-5), json!("high"), json!(40.5)] {
            let state = control_light(&raw_args("off", Some(raw))).unwrap();
            assert_eq!(
                state,
                DeviceState {
                    power: Power::Off,
                    brightness: 0
                }
            );
        }
    }

    #[test]
    fn test_calls_are_independent() {
        control_light(&args("on", Some(10))).unwrap();
        let state = control_light(&args("on", None)).unwrap();
        assert_eq!(state.brightness, 100);
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_value(control_light(&args("on", Some(40))).unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({"power": "on", "brightness": 40}));
    }
}
