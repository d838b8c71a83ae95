//! Worker configuration, read from the environment (and `.env` if present).

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::TimeDelta;

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub client_id: String,
    pub topic: String,
    pub redis_url: String,
    /// Readings older than this are trimmed after each write. `None` keeps everything.
    pub retention: Option<TimeDelta>,
    pub reconnect_delay: Duration,
    pub queue_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            mqtt_host: "broker.emqx.io".to_string(),
            mqtt_port: 1883,
            client_id: "bems-worker".to_string(),
            topic: "bems/#".to_string(),
            redis_url: "redis://127.0.0.1/".to_string(),
            retention: None,
            reconnect_delay: Duration::from_secs(3),
            queue_capacity: 256,
        }
    }
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let retention_days: Option<i64> = parse_var(&lookup, "BEMS_RETENTION_DAYS")?;
        let reconnect_secs: Option<u64> = parse_var(&lookup, "MQTT_RECONNECT_SECS")?;

        Ok(Self {
            mqtt_host: lookup("MQTT_HOST").unwrap_or(defaults.mqtt_host),
            mqtt_port: parse_var(&lookup, "MQTT_PORT")?.unwrap_or(defaults.mqtt_port),
            client_id: lookup("MQTT_CLIENT_ID").unwrap_or(defaults.client_id),
            topic: lookup("MQTT_TOPIC").unwrap_or(defaults.topic),
            redis_url: lookup("REDIS_URL").unwrap_or(defaults.redis_url),
            retention: retention_days.and_then(TimeDelta::try_days),
            reconnect_delay: reconnect_secs.map_or(defaults.reconnect_delay, Duration::from_secs),
            queue_capacity: parse_var(&lookup, "BEMS_QUEUE_CAPACITY")?
                .unwrap_or(defaults.queue_capacity)
                .max(1),
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(name)
        .map(|raw| raw.trim().parse::<T>().with_context(|| format!("invalid {name}: {raw:?}")))
        .transpose()
}
