//! Discord adapter (serenity).
//!
//! This crate implements the `tweetcord-core` ChannelSink over the Discord HTTP
//! API and routes prefixed chat commands into the core command handler.

use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{
    Channel, ChannelType, Colour, CreateEmbed, CreateEmbedAuthor, CreateMessage, Http, Timestamp,
};

pub mod handlers;
pub mod router;

use tweetcord_core::{
    domain::{ChannelId, ChannelRef},
    errors::Error,
    formatting::PostCard,
    ports::ChannelSink,
    Result,
};

#[derive(Clone)]
pub struct DiscordSink {
    http: Arc<Http>,
}

impl DiscordSink {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    fn dc_channel(channel_id: ChannelId) -> Option<serenity::all::ChannelId> {
        // Snowflakes are never zero; serenity panics on one.
        (channel_id.0 != 0).then(|| serenity::all::ChannelId::new(channel_id.0))
    }
}

/// Channel kinds a post card can be sent to.
pub fn is_deliverable_kind(kind: ChannelType) -> bool {
    matches!(kind, ChannelType::Text | ChannelType::News)
}

pub fn embed_timestamp(card: &PostCard) -> Option<Timestamp> {
    Timestamp::from_unix_timestamp(card.timestamp.timestamp()).ok()
}

pub fn build_embed(card: &PostCard) -> CreateEmbed {
    let mut author = CreateEmbedAuthor::new(&card.author_name).url(&card.author_url);
    if let Some(icon) = &card.author_icon_url {
        author = author.icon_url(icon);
    }

    let mut embed = CreateEmbed::new()
        .author(author)
        .description(&card.description)
        .colour(Colour::new(card.color));
    if let Some(ts) = embed_timestamp(card) {
        embed = embed.timestamp(ts);
    }
    if let Some(image) = &card.image_url {
        embed = embed.image(image);
    }
    embed
}

#[async_trait]
impl ChannelSink for DiscordSink {
    async fn resolve_channel(&self, channel_id: ChannelId) -> Option<ChannelRef> {
        let id = Self::dc_channel(channel_id)?;
        match self.http.get_channel(id).await {
            Ok(Channel::Guild(gc)) if is_deliverable_kind(gc.kind) => Some(ChannelRef {
                id: channel_id,
                name: gc.name,
            }),
            Ok(_) => {
                tracing::debug!(channel_id = channel_id.0, "channel is not a guild text channel");
                None
            }
            Err(e) => {
                tracing::debug!(channel_id = channel_id.0, error = %e, "failed to resolve channel");
                None
            }
        }
    }

    async fn send_card(&self, channel: &ChannelRef, card: &PostCard) -> Result<()> {
        let id = Self::dc_channel(channel.id)
            .ok_or_else(|| Error::Delivery("invalid channel id 0".to_string()))?;
        id.send_message(&self.http, CreateMessage::new().embed(build_embed(card)))
            .await
            .map_err(|e| Error::Delivery(format!("discord error: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn card() -> PostCard {
        PostCard {
            author_name: "@alice".to_string(),
            author_url: "https://twitter.com/alice".to_string(),
            author_icon_url: None,
            description: "hello".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 2, 3, 4, 5, 6).unwrap(),
            image_url: Some("https://pbs.twimg.com/media/1.jpg".to_string()),
            color: 0x3498DB,
        }
    }

    #[test]
    fn only_text_like_channels_are_deliverable() {
        assert!(is_deliverable_kind(ChannelType::Text));
        assert!(is_deliverable_kind(ChannelType::News));
        assert!(!is_deliverable_kind(ChannelType::Voice));
        assert!(!is_deliverable_kind(ChannelType::Category));
    }

    #[test]
    fn embed_timestamp_matches_post_time() {
        let c = card();
        let ts = embed_timestamp(&c).unwrap();
        assert_eq!(ts.unix_timestamp(), c.timestamp.timestamp());
    }

    #[test]
    fn zero_channel_id_is_never_built() {
        assert!(DiscordSink::dc_channel(ChannelId(0)).is_none());
        assert_eq!(
            DiscordSink::dc_channel(ChannelId(42)).map(|c| c.get()),
            Some(42)
        );
    }
}
