use std::{env, str::FromStr, time::Duration};

use thiserror::Error;

/// The configuration of the voting system
#[derive(Debug, Clone)]
pub struct Config {
    /// How many times a vote is attempted before giving up on a storage fault
    pub vote_attempts: u32,
    /// How long to wait between vote attempts, in milliseconds
    pub vote_backoff_in_ms: u64,
    /// Changes arriving within this window are coalesced into one ranking refresh
    pub debounce_window_in_ms: u64,
    /// If set, rankings are refreshed this often even when no changes arrive
    pub poll_interval_in_seconds: Option<u64>,
    /// How many candidates a video search returns at most
    pub search_results: u32,
    /// Key for the YouTube Data API. Video search is unavailable without one.
    pub youtube_api_key: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a number, got \"{value}\"")]
    NotANumber { key: &'static str, value: String },
    #[error("{key} must be at least {min}")]
    TooSmall { key: &'static str, min: u64 },
}

impl Config {
    pub const ENV_PREFIX: &'static str = "SONGVOTE_";

    pub fn vote_backoff(&self) -> Duration {
        Duration::from_millis(self.vote_backoff_in_ms)
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_window_in_ms)
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval_in_seconds.map(Duration::from_secs)
    }

    /// Reads the config from `SONGVOTE_*` environment variables, using defaults for unset ones.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(format!("{}{}", Self::ENV_PREFIX, key)).ok())
    }

    /// Builds the config from any key lookup. Keys are given without the prefix.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let vote_attempts = parse(&lookup, "VOTE_ATTEMPTS")?.unwrap_or(defaults.vote_attempts);
        if vote_attempts < 1 {
            return Err(ConfigError::TooSmall {
                key: "VOTE_ATTEMPTS",
                min: 1,
            });
        }

        let poll_interval_in_seconds = parse(&lookup, "POLL_INTERVAL_SECS")?;
        if poll_interval_in_seconds == Some(0) {
            return Err(ConfigError::TooSmall {
                key: "POLL_INTERVAL_SECS",
                min: 1,
            });
        }

        Ok(Self {
            vote_attempts,
            vote_backoff_in_ms: parse(&lookup, "VOTE_BACKOFF_MS")?
                .unwrap_or(defaults.vote_backoff_in_ms),
            debounce_window_in_ms: parse(&lookup, "DEBOUNCE_MS")?
                .unwrap_or(defaults.debounce_window_in_ms),
            poll_interval_in_seconds,
            search_results: parse(&lookup, "SEARCH_RESULTS")?.unwrap_or(defaults.search_results),
            youtube_api_key: lookup("YOUTUBE_API_KEY").filter(|k| !k.trim().is_empty()),
        })
    }
}

fn parse<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::NotANumber { key, value }),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // A couple of retries ride out most connection hiccups
            vote_attempts: 3,
            vote_backoff_in_ms: 500,
            debounce_window_in_ms: 1000,
            // Change notifications are enough on their own
            poll_interval_in_seconds: None,
            search_results: 8,
            youtube_api_key: None,
        }
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).expect("config is valid");

        assert_eq!(config.vote_attempts, 3);
        assert_eq!(config.vote_backoff(), Duration::from_millis(500));
        assert_eq!(config.debounce_window(), Duration::from_secs(1));
        assert_eq!(config.poll_interval(), None);
        assert_eq!(config.youtube_api_key, None);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("VOTE_ATTEMPTS", "5"),
            ("VOTE_BACKOFF_MS", " 20 "),
            ("POLL_INTERVAL_SECS", "30"),
            ("YOUTUBE_API_KEY", "abc"),
        ]))
        .expect("config is valid");

        assert_eq!(config.vote_attempts, 5);
        assert_eq!(config.vote_backoff_in_ms, 20);
        assert_eq!(config.poll_interval(), Some(Duration::from_secs(30)));
        assert_eq!(config.youtube_api_key.as_deref(), Some("abc"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            Config::from_lookup(lookup(&[("DEBOUNCE_MS", "soon")])),
            Err(ConfigError::NotANumber { key: "DEBOUNCE_MS", .. })
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("VOTE_ATTEMPTS", "0")])),
            Err(ConfigError::TooSmall { .. })
        ));
    }
}
