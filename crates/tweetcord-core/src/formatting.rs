use chrono::{DateTime, Utc};

use crate::domain::Post;

/// Accent color of delivered cards (Discord "blue").
pub const CARD_COLOR: u32 = 0x3498DB;

/// Messenger-agnostic rendering of one post as a styled card.
#[derive(Clone, Debug, PartialEq)]
pub struct PostCard {
    pub author_name: String,
    pub author_url: String,
    pub author_icon_url: Option<String>,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub image_url: Option<String>,
    pub color: u32,
}

pub fn profile_url(account: &str) -> String {
    format!("https://twitter.com/{account}")
}

pub fn post_card(account: &str, post: &Post) -> PostCard {
    PostCard {
        author_name: format!("@{account}"),
        author_url: profile_url(account),
        author_icon_url: post.author_avatar_url.clone(),
        description: post.text.clone(),
        timestamp: post.created_at,
        image_url: post.media_url.clone(),
        color: CARD_COLOR,
    }
}

pub fn tracking_list(accounts: &[String]) -> String {
    if accounts.is_empty() {
        return "No Twitter accounts are being tracked.".to_string();
    }
    let lines = accounts
        .iter()
        .map(|a| format!("@{a}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Currently tracking:\n{lines}")
}
