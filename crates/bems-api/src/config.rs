//! API configuration, read from the environment (and `.env` if present).

use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::{Context, Result};
use bems_core::GranularityPolicy;

use crate::query::Limits;

#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub redis_url: String,
    pub limits: Limits,
    pub policy: GranularityPolicy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
            redis_url: "redis://127.0.0.1/".to_string(),
            limits: Limits::default(),
            policy: GranularityPolicy::default(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let policy = GranularityPolicy {
            minute_max_hours: parse_var(&lookup, "BEMS_MINUTE_MAX_HOURS")?
                .unwrap_or(defaults.policy.minute_max_hours),
            hour_max_days: parse_var(&lookup, "BEMS_HOUR_MAX_DAYS")?
                .unwrap_or(defaults.policy.hour_max_days),
            day_max_days: parse_var(&lookup, "BEMS_DAY_MAX_DAYS")?
                .unwrap_or(defaults.policy.day_max_days),
        };
        let limits = Limits {
            default_limit: parse_var(&lookup, "BEMS_DEFAULT_LIMIT")?
                .unwrap_or(defaults.limits.default_limit),
            max_limit: parse_var(&lookup, "BEMS_MAX_LIMIT")?.unwrap_or(defaults.limits.max_limit),
        };

        Ok(Self {
            bind_addr: parse_var(&lookup, "BEMS_BIND_ADDR")?.unwrap_or(defaults.bind_addr),
            redis_url: lookup("REDIS_URL").unwrap_or(defaults.redis_url),
            limits,
            policy,
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
