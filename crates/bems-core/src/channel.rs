//! # Channels
//!
//! The closed set of logical measurement streams a BEMS node reports.
//! Each channel owns its storage key, so callers select a channel once at the
//! boundary instead of dispatching on field names inside aggregation loops.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Temperature,
    Humidity,
    Light,
    Noise,
    Gas,
    Vibration,
    UvStatus,
}

impl Channel {
    pub const ALL: [Channel; 7] = [
        Channel::Temperature,
        Channel::Humidity,
        Channel::Light,
        Channel::Noise,
        Channel::Gas,
        Channel::Vibration,
        Channel::UvStatus,
    ];

    /// Stable key used in storage keys and query strings.
    pub fn key(self) -> &'static str {
        match self {
            Channel::Temperature => "temperature",
            Channel::Humidity => "humidity",
            Channel::Light => "light",
            Channel::Noise => "noise",
            Channel::Gas => "gas",
            Channel::Vibration => "vibration",
            Channel::UvStatus => "uv_status",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Channel::Temperature => "Temperature",
            Channel::Humidity => "Humidity",
            Channel::Light => "Light",
            Channel::Noise => "Noise",
            Channel::Gas => "Gas/Smoke",
            Channel::Vibration => "Vibration",
            Channel::UvStatus => "Fire/UV",
        }
    }

    /// Display unit. Status-like channels (noise, vibration, UV) have none.
    pub fn unit(self) -> &'static str {
        match self {
            Channel::Temperature => "°C",
            Channel::Humidity => "%RH",
            Channel::Light => "lux",
            Channel::Gas => "ppm",
            Channel::Noise | Channel::Vibration | Channel::UvStatus => "",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Channel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Channel::ALL
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::UnknownChannel(s.to_string()))
    }
}
