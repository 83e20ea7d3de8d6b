use tracing_subscriber::{fmt, EnvFilter};

use crate::{Error, Result};

/// Install the fmt subscriber for the `service_name` binary.
///
/// Without `RUST_LOG`, the workspace crates and the binary log at `info` and
/// the serenity gateway is held to `warn`. A second call returns
/// `Error::Config` instead of panicking.
pub fn init(service_name: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "info,serenity=warn,tweetcord_core=info,tweetcord_discord=info,tweetcord_twitter=info,{service_name}=info"
        ))
    });

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .try_init()
        .map_err(|e| Error::Config(format!("failed to install tracing subscriber: {e}")))?;

    Ok(())
}
