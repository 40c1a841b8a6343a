//! Serde helpers shared by the configuration domains

use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

/// Durations are written as whole seconds in YAML and in `SITEHUB_*` overrides:
/// pool timeouts, prune interval, statement timeout and token expiry.
/// Sub-second precision is dropped on serialization.
pub mod serde_duration {
    use super::*;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

/// `#[serde(default = ...)]` for flags that are on unless configured off
pub fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize, Deserialize)]
    struct Timeouts {
        #[serde(with = "serde_duration")]
        acquire_timeout: Duration,
    }

    #[test]
    fn test_duration_is_whole_seconds() {
        let parsed: Timeouts = serde_yaml::from_str("acquire_timeout: 30").unwrap();
        assert_eq!(parsed.acquire_timeout, Duration::from_secs(30));

        let written = serde_yaml::to_string(&Timeouts {
            acquire_timeout: Duration::from_millis(1500),
        })
        .unwrap();
        assert_eq!(written.trim(), "acquire_timeout: 1");
    }
}
