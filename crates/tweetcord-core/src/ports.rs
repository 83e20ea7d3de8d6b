use async_trait::async_trait;

use crate::{
    domain::{ChannelId, ChannelRef, Post},
    formatting::PostCard,
    Result,
};

/// Hexagonal port for the social-media side: "what did this account post last?"
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch exactly one post: the account's most recent. `Ok(None)` for an empty timeline.
    async fn latest_post(&self, account: &str) -> Result<Option<Post>>;
}

/// Hexagonal port for the chat side.
///
/// Discord is the only implementation; tests use in-memory fakes.
#[async_trait]
pub trait ChannelSink: Send + Sync {
    /// Resolve a channel id into something deliverable. `None` when the
    /// channel does not exist or is not a text channel the bot can see.
    async fn resolve_channel(&self, channel_id: ChannelId) -> Option<ChannelRef>;

    async fn send_card(&self, channel: &ChannelRef, card: &PostCard) -> Result<()>;
}
