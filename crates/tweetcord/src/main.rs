use std::{process::ExitCode, sync::Arc};

use tweetcord_core::{config::Config, context::AppContext, ports::FeedSource, store::ConfigStore};
use tweetcord_twitter::TwitterClient;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = tweetcord_core::logging::init("tweetcord") {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "tweetcord stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), tweetcord_core::Error> {
    let cfg = Arc::new(Config::load()?);
    tracing::info!(
        prefix = %cfg.command_prefix,
        interval_secs = cfg.poll_interval.as_secs(),
        config = %cfg.tracker_config_path.display(),
        "tweetcord starting"
    );

    let ctx = Arc::new(AppContext::load(ConfigStore::new(cfg.tracker_config_path.clone())).await?);
    let feed: Arc<dyn FeedSource> = Arc::new(TwitterClient::new(
        cfg.twitter.clone(),
        cfg.twitter_api_base.clone(),
        cfg.http_timeout,
    )?);

    tweetcord_discord::router::run(cfg, ctx, feed)
        .await
        .map_err(|e| tweetcord_core::Error::External(format!("discord bot failed: {e}")))?;

    Ok(())
}
