use chrono::{DateTime, Utc};

/// Discord channel id (snowflake).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelId(pub u64);

/// Twitter post id (snowflake). Monotonically increasing per account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PostId(pub u64);

/// A resolved, deliverable chat channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelRef {
    pub id: ChannelId,
    pub name: String,
}

impl ChannelRef {
    /// Discord mention syntax, renders as a clickable `#name`.
    pub fn mention(&self) -> String {
        format!("<#{}>", self.id.0)
    }
}

/// The latest post of a tracked account as returned by a feed source.
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    pub id: PostId,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author_avatar_url: Option<String>,
    pub media_url: Option<String>,
}
