use std::sync::Arc;

use serenity::Client;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use tweetcord_core::{
    commands::CommandHandler,
    config::Config,
    context::AppContext,
    poller::Poller,
    ports::{ChannelSink, FeedSource},
};

use crate::{handlers::CommandRouter, DiscordSink};

/// Connect to the gateway, start the poller, and block until the client stops.
///
/// Ctrl-C shuts the shards down; the poller is cancelled once the client returns.
pub async fn run(
    cfg: Arc<Config>,
    ctx: Arc<AppContext>,
    feed: Arc<dyn FeedSource>,
) -> anyhow::Result<()> {
    let commands = Arc::new(CommandHandler::new(ctx.clone(), cfg.command_prefix.clone()));

    let mut client = Client::builder(&cfg.discord_token, CommandRouter::intents())
        .event_handler(CommandRouter::new(commands))
        .await?;

    // The HTTP client works before the gateway is ready; early ticks whose
    // channel cannot be resolved are skipped.
    let sink: Arc<dyn ChannelSink> = Arc::new(DiscordSink::new(client.http.clone()));
    let poller = Poller::new(ctx, feed, sink, cfg.http_timeout)
        .spawn(cfg.poll_interval, CancellationToken::new());

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("ctrl-c received, shutting down");
                shard_manager.shutdown_all().await;
            }
            Err(e) => warn!(error = %e, "failed to listen for ctrl-c"),
        }
    });

    let res = client.start().await;
    poller.shutdown().await;
    res.map_err(|e| anyhow::anyhow!("discord client failed: {e}"))
}
