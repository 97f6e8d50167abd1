use std::env;

use serde::Deserialize;

use crate::error::{FeedError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.waqi.info";

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FeedConfig {
    /// Scheme and host of the feed, without a trailing path.
    pub base_url: String,
    /// Size of the pool running asynchronous calls.
    pub worker_threads: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            worker_threads: 2,
        }
    }
}

impl FeedConfig {
    /// Reads `AQI_FEED_URL` and `AQI_FEED_WORKERS`, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = FeedConfig::default();

        let base_url = env::var("AQI_FEED_URL").unwrap_or(defaults.base_url);
        let worker_threads = match env::var("AQI_FEED_WORKERS") {
            Ok(value) => match value.trim().parse::<usize>() {
                Ok(workers) if workers > 0 => workers,
                _ => {
                    return Err(FeedError::Config(format!(
                        "AQI_FEED_WORKERS must be a positive integer, got {:?}",
                        value
                    )))
                }
            },
            Err(_) => defaults.worker_threads,
        };

        Ok(FeedConfig {
            base_url,
            worker_threads,
        })
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    fn clear_env() {
        env::remove_var("AQI_FEED_URL");
        env::remove_var("AQI_FEED_WORKERS");
    }

    #[serial]
    #[test]
    fn from_env_when_unset_then_defaults() {
        clear_env();

        assert_eq!(FeedConfig::from_env().unwrap(), FeedConfig::default());
    }

    #[serial]
    #[test]
    fn from_env_when_set_then_overrides() {
        clear_env();
        env::set_var("AQI_FEED_URL", "http://localhost:8080");
        env::set_var("AQI_FEED_WORKERS", "8");

        let config = FeedConfig::from_env().unwrap();
        clear_env();

        assert_eq!(
            config,
            FeedConfig {
                base_url: "http://localhost:8080".into(),
                worker_threads: 8,
            }
        );
    }

    #[serial]
    #[test]
    fn from_env_when_workers_not_a_number_then_fails() {
        clear_env();
        env::set_var("AQI_FEED_WORKERS", "many");

        let result = FeedConfig::from_env();
        clear_env();

        assert!(matches!(result, Err(FeedError::Config(_))));
    }

    #[serial]
    #[test]
    fn from_env_when_workers_zero_then_fails() {
        clear_env();
        env::set_var("AQI_FEED_WORKERS", "0");

        let result = FeedConfig::from_env();
        clear_env();

        assert!(matches!(result, Err(FeedError::Config(msg)) if msg.contains("positive")));
    }

    #[test]
    fn deserialize_when_partial_then_fills_defaults() {
        let config: FeedConfig = serde_json::from_str(r#"{"worker_threads": 4}"#).unwrap();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.worker_threads, 4);
    }
}
