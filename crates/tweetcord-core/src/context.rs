use tokio::sync::Mutex;

use crate::{
    domain::ChannelId,
    store::{ConfigStore, Configuration},
    Result,
};

/// Shared application state, built once at startup and passed by `Arc`.
///
/// All reads and writes of [`Configuration`] go through this one lock.
pub struct AppContext {
    store: ConfigStore,
    config: Mutex<Configuration>,
}

/// What the poller sees of the configuration at the start of a tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickSnapshot {
    pub accounts: Vec<String>,
    pub channel: Option<ChannelId>,
}

/// Outcome of a mutating command.
#[derive(Debug)]
pub struct Mutation<T> {
    pub value: T,
    /// Set when the mutation changed memory but could not be persisted.
    pub persist_error: Option<crate::Error>,
}

impl AppContext {
    pub fn new(store: ConfigStore, config: Configuration) -> Self {
        Self {
            store,
            config: Mutex::new(config),
        }
    }

    /// Load the persisted configuration (or an empty one) and wrap it.
    pub async fn load(store: ConfigStore) -> Result<Self> {
        let config = store.load().await?;
        tracing::info!(
            path = %store.path().display(),
            accounts = config.accounts().len(),
            channel = ?config.channel(),
            "tracker config loaded"
        );
        Ok(Self::new(store, config))
    }

    pub async fn snapshot(&self) -> TickSnapshot {
        let cfg = self.config.lock().await;
        TickSnapshot {
            accounts: cfg.accounts().to_vec(),
            channel: cfg.channel(),
        }
    }

    pub async fn read<T>(&self, f: impl FnOnce(&Configuration) -> T) -> T {
        let cfg = self.config.lock().await;
        f(&cfg)
    }

    /// Apply `f` under the lock; if it reports a change, persist before releasing.
    ///
    /// A failed save leaves the in-memory change in place.
    pub async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Configuration) -> (bool, T),
    ) -> Mutation<T> {
        let mut cfg = self.config.lock().await;
        let (changed, value) = f(&mut cfg);
        if !changed {
            return Mutation {
                value,
                persist_error: None,
            };
        }

        let persist_error = match self.store.save(&cfg).await {
            Ok(()) => None,
            Err(e) => {
                tracing::error!(path = %self.store.path().display(), error = %e, "failed to save tracker config");
                Some(e)
            }
        };
        Mutation {
            value,
            persist_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mutation_persists_only_on_change() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("config.json"));
        let ctx = AppContext::new(store.clone(), Configuration::default());

        let m = ctx.mutate(|_| (false, ())).await;
        assert!(m.persist_error.is_none());
        assert!(!store.path().exists());

        let m = ctx.mutate(|cfg| (cfg.add_account("alice"), ())).await;
        assert!(m.persist_error.is_none());
        assert_eq!(store.load().await.unwrap().accounts(), ["alice"]);
    }

    #[tokio::test]
    async fn failed_save_keeps_memory_change() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("nope").join("config.json"));
        let ctx = AppContext::new(store, Configuration::default());

        let m = ctx.mutate(|cfg| (cfg.add_account("alice"), ())).await;
        assert!(matches!(m.persist_error, Some(crate::Error::Io(_))));
        assert_eq!(ctx.snapshot().await.accounts, vec!["alice".to_string()]);
    }
}
