use std::{env, fmt::Display, str::FromStr, time::Duration};

use anyhow::anyhow;
use tracing::{info, warn};

pub const DEFAULT_API_URL: &str = "https://student-feedback-backend-one.vercel.app";
const DEFAULT_TIMEOUT_SECS: &str = "15";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub request_timeout: Duration,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let api_url: String = try_load("FEEDBACK_API_URL", DEFAULT_API_URL)?;
        let timeout_secs: u64 = try_load("FEEDBACK_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(timeout_secs.max(1)),
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        anyhow!("environment misconfigured: {key}={raw} ({e})")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variable_falls_back_to_default() {
        let value: u64 = try_load("FEEDBACK_TEST_UNSET_VARIABLE", "42").unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn unparsable_default_is_an_error() {
        let value: anyhow::Result<u64> = try_load("FEEDBACK_TEST_UNSET_VARIABLE", "soon");
        assert!(value.is_err());
    }
}
