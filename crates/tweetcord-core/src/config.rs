use std::{env, fmt, path::PathBuf, time::Duration};

use crate::{errors::Error, Result};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(120);
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_TRACKER_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_TWITTER_API_BASE: &str = "https://api.twitter.com/1.1";

/// OAuth 1.0a credentials for the Twitter API.
#[derive(Clone)]
pub struct TwitterCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl fmt::Debug for TwitterCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwitterCredentials")
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

/// Typed runtime configuration, read from the environment.
#[derive(Clone)]
pub struct Config {
    // Credentials
    pub discord_token: String,
    pub twitter: TwitterCredentials,

    // Behavior
    pub command_prefix: String,
    pub poll_interval: Duration,
    pub http_timeout: Duration,

    // Storage / endpoints
    pub tracker_config_path: PathBuf,
    pub twitter_api_base: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("discord_token", &"<redacted>")
            .field("twitter", &self.twitter)
            .field("command_prefix", &self.command_prefix)
            .field("poll_interval", &self.poll_interval)
            .field("http_timeout", &self.http_timeout)
            .field("tracker_config_path", &self.tracker_config_path)
            .field("twitter_api_base", &self.twitter_api_base)
            .finish()
    }
}

impl Config {
    /// Load from `.env` (if present) and the process environment.
    ///
    /// Variables already set in the environment win over `.env`.
    pub fn load() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(Error::Config(format!("failed to read .env: {e}"))),
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            lookup(key).and_then(non_empty).ok_or_else(|| {
                Error::Config(format!("{key} environment variable is required"))
            })
        };

        let discord_token = required("DISCORD_TOKEN")?;
        let twitter = TwitterCredentials {
            api_key: required("TWITTER_API_KEY")?,
            api_secret: required("TWITTER_API_SECRET")?,
            access_token: required("TWITTER_ACCESS_TOKEN")?,
            access_token_secret: required("TWITTER_ACCESS_TOKEN_SECRET")?,
        };

        let command_prefix = lookup("COMMAND_PREFIX")
            .and_then(non_empty)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| "!".to_string());

        let poll_interval = parse_u64(lookup("POLL_INTERVAL_SECS"))
            .map(|secs| Duration::from_secs(secs.max(1)))
            .unwrap_or(DEFAULT_POLL_INTERVAL);
        let http_timeout = parse_u64(lookup("HTTP_TIMEOUT_SECS"))
            .map(|secs| Duration::from_secs(secs.max(1)))
            .unwrap_or(DEFAULT_HTTP_TIMEOUT);

        let tracker_config_path = lookup("TRACKER_CONFIG_PATH")
            .and_then(non_empty)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TRACKER_CONFIG_PATH));
        let twitter_api_base = lookup("TWITTER_API_BASE")
            .and_then(non_empty)
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_TWITTER_API_BASE.to_string());

        Ok(Self {
            discord_token,
            twitter,
            command_prefix,
            poll_interval,
            http_timeout,
            tracker_config_path,
            twitter_api_base,
        })
    }
}

fn parse_u64(v: Option<String>) -> Option<u64> {
    v.and_then(|s| s.trim().parse::<u64>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn full_env() -> HashMap<&'static str, String> {
        [
            ("DISCORD_TOKEN", "discord"),
            ("TWITTER_API_KEY", "key"),
            ("TWITTER_API_SECRET", "secret"),
            ("TWITTER_ACCESS_TOKEN", "token"),
            ("TWITTER_ACCESS_TOKEN_SECRET", "token-secret"),
        ]
        .into_iter()
        .map(|(k, v)| (k, v.to_string()))
        .collect()
    }

    #[test]
    fn loads_defaults_when_only_credentials_are_set() {
        let env = full_env();
        let cfg = Config::from_lookup(|k| env.get(k).cloned()).unwrap();

        assert_eq!(cfg.discord_token, "discord");
        assert_eq!(cfg.twitter.access_token_secret, "token-secret");
        assert_eq!(cfg.command_prefix, "!");
        assert_eq!(cfg.poll_interval, Duration::from_secs(120));
        assert_eq!(cfg.http_timeout, Duration::from_secs(15));
        assert_eq!(cfg.tracker_config_path, PathBuf::from("config.json"));
        assert_eq!(cfg.twitter_api_base, "https://api.twitter.com/1.1");
    }

    #[test]
    fn missing_credential_is_startup_fatal() {
        for key in [
            "DISCORD_TOKEN",
            "TWITTER_API_KEY",
            "TWITTER_API_SECRET",
            "TWITTER_ACCESS_TOKEN",
            "TWITTER_ACCESS_TOKEN_SECRET",
        ] {
            let mut env = full_env();
            env.insert(key, "  ".to_string());
            let err = Config::from_lookup(|k| env.get(k).cloned()).unwrap_err();
            assert!(err.is_startup_fatal(), "{key}: {err}");
            assert!(err.to_string().contains(key));
        }
    }

    #[test]
    fn overrides_are_parsed_and_clamped() {
        let mut env = full_env();
        env.insert("POLL_INTERVAL_SECS", "0".to_string());
        env.insert("HTTP_TIMEOUT_SECS", "30".to_string());
        env.insert("COMMAND_PREFIX", "?".to_string());
        env.insert("TWITTER_API_BASE", "http://localhost:9000/1.1/".to_string());
        let cfg = Config::from_lookup(|k| env.get(k).cloned()).unwrap();

        assert_eq!(cfg.poll_interval, Duration::from_secs(1));
        assert_eq!(cfg.http_timeout, Duration::from_secs(30));
        assert_eq!(cfg.command_prefix, "?");
        assert_eq!(cfg.twitter_api_base, "http://localhost:9000/1.1");
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let env = full_env();
        let cfg = Config::from_lookup(|k| env.get(k).cloned()).unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("token-secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
