/// Core error type.
///
/// Adapter crates map their specific errors into this type so the poller and
/// command handler can decide what is fatal and what only skips a unit of work.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("fetch failed for @{account}: {reason}")]
    Fetch { account: String, reason: String },

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    pub fn fetch(account: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            account: account.into(),
            reason: reason.into(),
        }
    }

    /// True for failures that must stop the process at startup.
    pub fn is_startup_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
