//! Models for the Adax client API (`/rest/v1/content` and `/rest/v1/control`).
//!
//! Notes
//! - Entities reference each other by id only; nothing is embedded.
//! - Temperatures are integers in hundredths of a degree Celsius (2150 = 21.5 °C).
//! - The control endpoint expects `targetTemperature` as a JSON string.

use serde::{Deserialize, Serialize};

// =====================
// Scalar ID newtype wrappers
// =====================

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HomeId(pub i64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub i64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub i64);

/// Temperature in hundredths of a degree Celsius, transmitted as a string
/// by the control endpoint (`21` is sent as `"21"`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TargetTemperature(pub i64);

impl TargetTemperature {
    /// Convert decimal degrees into API units, rounding to the nearest hundredth.
    pub fn from_celsius(celsius: f64) -> Self {
        TargetTemperature((celsius * 100.0).round() as i64)
    }

    pub fn as_celsius(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl serde::Serialize for TargetTemperature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for TargetTemperature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct V;
        impl<'de> serde::de::Visitor<'de> for V {
            type Value = TargetTemperature;

            fn expecting(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, "an integer or a numeric string for targetTemperature")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(TargetTemperature(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                i64::try_from(value)
                    .map(TargetTemperature)
                    .map_err(|_| E::invalid_value(serde::de::Unexpected::Unsigned(value), &self))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                value
                    .trim()
                    .parse::<i64>()
                    .map(TargetTemperature)
                    .map_err(|_| E::invalid_value(serde::de::Unexpected::Str(value), &self))
            }
        }

        deserializer.deserialize_any(V)
    }
}

// =====================
// GET /rest/v1/content
// =====================

/// Everything the account can see, returned in one response without paging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub homes: Vec<Home>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub devices: Vec<Device>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Home {
    pub id: HomeId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub home_id: HomeId,
    pub name: String,
    #[serde(default)]
    pub heating_enabled: bool,
    /// Current temperature; absent while the room has no reporting heater.
    #[serde(default)]
    pub temperature: Option<i64>,
    #[serde(default)]
    pub target_temperature: Option<TargetTemperature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: DeviceId,
    pub home_id: HomeId,
    pub room_id: RoomId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub device_type: String,
}

// =====================
// POST /rest/v1/control
// =====================

/// Desired state for a single home, room or device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Update {
    pub id: i64,
    pub heating_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_temperature: Option<TargetTemperature>,
}

impl Update {
    /// Toggle heating only. The body carries `id` and `heatingEnabled` with no
    /// `targetTemperature`, so the heater keeps its current target. This is
    /// narrower than the full `{id, heatingEnabled, targetTemperature}` shape
    /// that [`Update::target`] sends.
    pub fn heating(id: i64, enabled: bool) -> Self {
        Update {
            id,
            heating_enabled: enabled,
            target_temperature: None,
        }
    }

    pub fn target(id: i64, temperature: TargetTemperature) -> Self {
        Update {
            id,
            heating_enabled: true,
            target_temperature: Some(temperature),
        }
    }
}

/// Batch of updates keyed by entity kind. Empty lists are left out of the body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Updates {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub homes: Vec<Update>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rooms: Vec<Update>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<Update>,
}
