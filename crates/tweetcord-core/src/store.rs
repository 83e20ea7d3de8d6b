//! Persisted tracker configuration (`config.json`).
//!
//! The document is tiny and rewritten in full on every mutation:
//!
//! ```json
//! {
//!     "twitter_accounts": ["alice", "bob"],
//!     "discord_channel_id": 1234567890
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{domain::ChannelId, Result};

/// The sole persisted entity: tracked accounts + delivery target.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    twitter_accounts: Vec<String>,
    #[serde(default)]
    discord_channel_id: Option<u64>,
}

impl Configuration {
    pub fn accounts(&self) -> &[String] {
        &self.twitter_accounts
    }

    pub fn is_tracking(&self, account: &str) -> bool {
        self.twitter_accounts.iter().any(|a| a == account)
    }

    /// Append `account`; returns false (no mutation) if already tracked.
    pub fn add_account(&mut self, account: &str) -> bool {
        if self.is_tracking(account) {
            return false;
        }
        self.twitter_accounts.push(account.to_string());
        true
    }

    /// Remove `account`; returns false (no mutation) if not tracked.
    pub fn remove_account(&mut self, account: &str) -> bool {
        let Some(idx) = self.twitter_accounts.iter().position(|a| a == account) else {
            return false;
        };
        self.twitter_accounts.remove(idx);
        true
    }

    pub fn channel(&self) -> Option<ChannelId> {
        self.discord_channel_id.map(ChannelId)
    }

    pub fn set_channel(&mut self, channel: ChannelId) {
        self.discord_channel_id = Some(channel.0);
    }

    /// Drop duplicate accounts from a hand-edited document, keeping first occurrence.
    fn dedup_accounts(&mut self) {
        let mut seen = Vec::with_capacity(self.twitter_accounts.len());
        self.twitter_accounts.retain(|a| {
            if seen.contains(a) {
                false
            } else {
                seen.push(a.clone());
                true
            }
        });
    }
}

/// Reads/writes [`Configuration`] at a fixed path.
#[derive(Clone, Debug)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document; a missing file yields an empty configuration.
    pub async fn load(&self) -> Result<Configuration> {
        let txt = match tokio::fs::read_to_string(&self.path).await {
            Ok(txt) => txt,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no tracker config found, starting empty");
                return Ok(Configuration::default());
            }
            Err(e) => return Err(e.into()),
        };

        let mut cfg: Configuration = serde_json::from_str(&txt)?;
        cfg.dedup_accounts();
        Ok(cfg)
    }

    /// Overwrite the document entirely.
    pub async fn save(&self, cfg: &Configuration) -> Result<()> {
        tokio::fs::write(&self.path, render(cfg)?).await?;
        Ok(())
    }
}

/// Deterministic rendering: field order is fixed by the struct, 4-space indent.
pub fn render(cfg: &Configuration) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let fmt = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, fmt);
    cfg.serialize(&mut ser)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn add_preserves_first_insertion_order_without_duplicates() {
        let mut cfg = Configuration::default();
        for name in ["bob", "alice", "bob", "carol", "alice"] {
            cfg.add_account(name);
        }
        assert_eq!(cfg.accounts(), ["bob", "alice", "carol"]);
    }

    #[test]
    fn add_then_remove_restores_prior_state() {
        let mut cfg = Configuration::default();
        cfg.add_account("alice");
        cfg.add_account("bob");
        let before = cfg.clone();

        assert!(cfg.add_account("carol"));
        assert!(cfg.remove_account("carol"));
        assert_eq!(cfg, before);

        assert!(!cfg.remove_account("carol"));
        assert_eq!(cfg, before);
    }

    #[tokio::test]
    async fn missing_file_loads_empty_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("config.json"));

        let cfg = store.load().await.unwrap();
        assert!(cfg.accounts().is_empty());
        assert_eq!(cfg.channel(), None);
    }

    #[tokio::test]
    async fn save_of_load_is_byte_stable() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("config.json"));

        let mut cfg = Configuration::default();
        cfg.add_account("alice");
        cfg.add_account("bob");
        cfg.set_channel(ChannelId(42));
        store.save(&cfg).await.unwrap();

        let first = std::fs::read(store.path()).unwrap();
        store.save(&store.load().await.unwrap()).await.unwrap();
        let second = std::fs::read(store.path()).unwrap();
        store.save(&store.load().await.unwrap()).await.unwrap();
        let third = std::fs::read(store.path()).unwrap();

        assert_eq!(first, second);
        assert_eq!(second, third);
    }

    #[test]
    fn renders_the_documented_shape() {
        let mut cfg = Configuration::default();
        cfg.add_account("alice");
        let txt = String::from_utf8(render(&cfg).unwrap()).unwrap();
        assert_eq!(
            txt,
            "{\n    \"twitter_accounts\": [\n        \"alice\"\n    ],\n    \"discord_channel_id\": null\n}"
        );
    }

    #[tokio::test]
    async fn reads_null_channel_and_drops_duplicate_accounts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"twitter_accounts": ["a", "b", "a"], "discord_channel_id": null}"#,
        )
        .unwrap();

        let cfg = ConfigStore::new(&path).load().await.unwrap();
        assert_eq!(cfg.accounts(), ["a", "b"]);
        assert_eq!(cfg.channel(), None);
    }

    #[tokio::test]
    async fn malformed_document_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = ConfigStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[tokio::test]
    async fn unwritable_location_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("missing-dir").join("config.json"));

        let err = store.save(&Configuration::default()).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
