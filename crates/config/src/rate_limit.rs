//! Rate limiting configuration structures.

use std::time::Duration;

use duration_str::deserialize_duration;
use serde::{Deserialize, Deserializer, de::Error};

/// Settings for the global token bucket gating every request.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Whether requests are gated at all.
    pub enabled: bool,
    /// Maximum number of requests admitted in a burst.
    ///
    /// Accepts an integer or a numeric string, so the value can come from an environment
    /// variable: `capacity = "{{ env.APP_RPS_LIMIT }}"`.
    #[serde(deserialize_with = "deserialize_capacity")]
    pub capacity: u32,
    /// Time needed to regenerate a single token.
    #[serde(deserialize_with = "deserialize_duration")]
    pub refill_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 10,
            refill_interval: Duration::from_secs(1),
        }
    }
}

fn deserialize_capacity<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Capacity {
        Number(i64),
        Text(String),
    }

    let value = match Capacity::deserialize(deserializer)? {
        Capacity::Number(value) => value,
        Capacity::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("capacity should be a number, got '{text}'")))?,
    };

    u32::try_from(value).map_err(|_| D::Error::custom(format!("capacity must be a positive integer, got {value}")))
}
