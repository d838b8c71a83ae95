//! # Topics
//!
//! Fixed mapping from MQTT topic and payload field to channel.
//!
//! | topic | field | channel |
//! |---|---|---|
//! | `bems/environment` | `tempC`, `hum`, `lux` | temperature, humidity, light |
//! | `bems/gas_sound` | `sound_status_avg`, `mq2_adc` | noise, gas |
//! | `bems/motion` | `vibration_status` | vibration |
//! | `bems/uv_status` | `uv_status` | uv_status |

use anyhow::{bail, Context, Result};
use bems_core::{is_numeric, Channel};
use bems_redis::Reading;
use chrono::{DateTime, Utc};
use serde_json::Value;

pub const TOPIC_ENVIRONMENT: &str = "bems/environment";
pub const TOPIC_GAS_SOUND: &str = "bems/gas_sound";
pub const TOPIC_MOTION: &str = "bems/motion";
pub const TOPIC_UV_STATUS: &str = "bems/uv_status";

const ENVIRONMENT_FIELDS: &[(&str, Channel)] = &[
    ("tempC", Channel::Temperature),
    ("hum", Channel::Humidity),
    ("lux", Channel::Light),
];
const GAS_SOUND_FIELDS: &[(&str, Channel)] = &[
    ("sound_status_avg", Channel::Noise),
    ("mq2_adc", Channel::Gas),
];
const MOTION_FIELDS: &[(&str, Channel)] = &[("vibration_status", Channel::Vibration)];
const UV_FIELDS: &[(&str, Channel)] = &[("uv_status", Channel::UvStatus)];

/// Payload fields carried by `topic`. Empty for topics we do not store.
pub fn fields_for_topic(topic: &str) -> &'static [(&'static str, Channel)] {
    match topic {
        TOPIC_ENVIRONMENT => ENVIRONMENT_FIELDS,
        TOPIC_GAS_SOUND => GAS_SOUND_FIELDS,
        TOPIC_MOTION => MOTION_FIELDS,
        TOPIC_UV_STATUS => UV_FIELDS,
        _ => &[],
    }
}

/// Extracts the readings carried by one MQTT message.
///
/// Fields may be JSON numbers or numeric strings. Missing or non-numeric
/// fields are skipped; zero is kept. Unknown topics yield no readings.
pub fn parse_message(topic: &str, payload: &[u8], received_at: DateTime<Utc>) -> Result<Vec<Reading>> {
    let fields = fields_for_topic(topic);
    if fields.is_empty() {
        return Ok(Vec::new());
    }

    let data: Value = serde_json::from_slice(payload)
        .with_context(|| format!("payload on {topic} is not valid JSON"))?;
    let Some(object) = data.as_object() else {
        bail!("payload on {topic} is not a JSON object");
    };

    let readings = fields
        .iter()
        .filter_map(|&(field, channel)| {
            let value = object.get(field).and_then(numeric_value)?;
            Some(Reading::new(channel, value, received_at))
        })
        .collect();
    Ok(readings)
}

fn numeric_value(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    is_numeric(parsed).then_some(parsed)
}
