//! Dashboard status thresholds per channel.

use serde::{Deserialize, Serialize};

use crate::{Channel, is_numeric};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Normal,
    Warning,
    Danger,
}

impl Channel {
    /// Classifies a live or averaged value. `None` for non-numeric values.
    pub fn status(self, value: f64) -> Option<Status> {
        if !is_numeric(value) {
            return None;
        }
        let v = value;
        let status = match self {
            Channel::Temperature if v > 30.0 || v < 18.0 => Status::Danger,
            Channel::Temperature if v > 28.0 || v < 20.0 => Status::Warning,
            Channel::Humidity if v > 70.0 || v < 40.0 => Status::Danger,
            Channel::Humidity if v > 60.0 || v < 45.0 => Status::Warning,
            Channel::Light if v < 20.0 => Status::Danger,
            Channel::Light if v < 50.0 || v > 1000.0 => Status::Warning,
            Channel::Noise if v > 0.5 => Status::Danger,
            Channel::Noise if v > 0.1 => Status::Warning,
            Channel::Gas if v > 350.0 => Status::Danger,
            Channel::Gas if v > 200.0 => Status::Warning,
            Channel::Vibration if v >= 1.0 => Status::Danger,
            // averaged fire/UV status above 0.5 means fire was seen more often than not
            Channel::UvStatus if v > 0.5 => Status::Danger,
            _ => Status::Normal,
        };
        Some(status)
    }
}
