//! Twitter adapter (REST v1.1, OAuth 1.0a user context).
//!
//! Implements the `tweetcord-core` FeedSource over `statuses/user_timeline`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use tweetcord_core::{
    config::TwitterCredentials,
    domain::{Post, PostId},
    errors::Error,
    ports::FeedSource,
    Result,
};

pub mod oauth;

use oauth::{encode, OAuthSigner};

const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

#[derive(Clone, Debug)]
pub struct TwitterClient {
    signer: OAuthSigner,
    api_base: String,
    http: reqwest::Client,
}

impl TwitterClient {
    pub fn new(
        creds: TwitterCredentials,
        api_base: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("reqwest client build failed: {e}")))?;
        Ok(Self {
            signer: OAuthSigner::new(creds),
            api_base: api_base.into(),
            http,
        })
    }

    fn timeline_url(&self) -> String {
        format!("{}/statuses/user_timeline.json", self.api_base)
    }
}

#[async_trait]
impl FeedSource for TwitterClient {
    async fn latest_post(&self, account: &str) -> Result<Option<Post>> {
        let url = self.timeline_url();
        let params = [
            ("screen_name", account),
            ("count", "1"),
            ("tweet_mode", "extended"),
        ];
        let auth = self.signer.authorization("GET", &url, &params)?;
        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let resp = self
            .http
            .get(format!("{url}?{query}"))
            .header(reqwest::header::AUTHORIZATION, auth)
            .send()
            .await
            .map_err(|e| Error::fetch(account, format!("request error: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::fetch(account, format!("body read error: {e}")))?;

        if !status.is_success() {
            return Err(Error::fetch(
                account,
                format!(
                    "twitter returned {status}: {}",
                    body.chars().take(200).collect::<String>()
                ),
            ));
        }

        parse_timeline(account, &body)
    }
}

#[derive(Debug, Deserialize)]
struct RawTweet {
    id_str: Option<String>,
    id: Option<u64>,
    full_text: Option<String>,
    text: Option<String>,
    created_at: String,
    user: Option<RawUser>,
    #[serde(default)]
    entities: RawEntities,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    profile_image_url_https: Option<String>,
    profile_image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawEntities {
    #[serde(default)]
    media: Vec<RawMedia>,
}

#[derive(Debug, Deserialize)]
struct RawMedia {
    media_url_https: Option<String>,
    media_url: Option<String>,
}

/// Parse a `user_timeline` response body; the first element is the latest post.
pub fn parse_timeline(account: &str, body: &str) -> Result<Option<Post>> {
    let tweets: Vec<RawTweet> = serde_json::from_str(body)
        .map_err(|e| Error::fetch(account, format!("malformed timeline: {e}")))?;
    let Some(raw) = tweets.into_iter().next() else {
        return Ok(None);
    };

    let id = raw
        .id_str
        .as_deref()
        .and_then(|s| s.parse::<u64>().ok())
        .or(raw.id)
        .ok_or_else(|| Error::fetch(account, "tweet without id"))?;

    let created_at = DateTime::parse_from_str(&raw.created_at, CREATED_AT_FORMAT)
        .map_err(|e| Error::fetch(account, format!("bad created_at {:?}: {e}", raw.created_at)))?
        .with_timezone(&Utc);

    let media_url = raw
        .entities
        .media
        .into_iter()
        .next()
        .and_then(|m| m.media_url_https.or(m.media_url));

    Ok(Some(Post {
        id: PostId(id),
        text: raw.full_text.or(raw.text).unwrap_or_default(),
        created_at,
        author_avatar_url: raw
            .user
            .and_then(|u| u.profile_image_url_https.or(u.profile_image_url)),
        media_url,
    }))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn parses_latest_tweet_with_media() {
        let body = r#"[{
            "id": 1850000000000000001,
            "id_str": "1850000000000000001",
            "created_at": "Wed Oct 10 20:19:24 +0000 2018",
            "full_text": "launch day https://t.co/x",
            "user": {"screen_name": "alice", "profile_image_url_https": "https://pbs.twimg.com/p.jpg"},
            "entities": {"media": [
                {"media_url_https": "https://pbs.twimg.com/media/1.jpg"},
                {"media_url_https": "https://pbs.twimg.com/media/2.jpg"}
            ]}
        }]"#;

        let post = parse_timeline("alice", body).unwrap().unwrap();
        assert_eq!(post.id, PostId(1_850_000_000_000_000_001));
        assert_eq!(post.text, "launch day https://t.co/x");
        assert_eq!(
            post.created_at,
            Utc.with_ymd_and_hms(2018, 10, 10, 20, 19, 24).unwrap()
        );
        assert_eq!(
            post.author_avatar_url.as_deref(),
            Some("https://pbs.twimg.com/p.jpg")
        );
        assert_eq!(
            post.media_url.as_deref(),
            Some("https://pbs.twimg.com/media/1.jpg")
        );
    }

    #[test]
    fn falls_back_to_compat_fields() {
        let body = r#"[{
            "id": 7,
            "created_at": "Mon Jan 05 08:00:00 +0100 2026",
            "text": "short",
            "entities": {"hashtags": []}
        }]"#;

        let post = parse_timeline("bob", body).unwrap().unwrap();
        assert_eq!(post.id, PostId(7));
        assert_eq!(post.text, "short");
        assert_eq!(
            post.created_at,
            Utc.with_ymd_and_hms(2026, 1, 5, 7, 0, 0).unwrap()
        );
        assert_eq!(post.author_avatar_url, None);
        assert_eq!(post.media_url, None);
    }

    #[test]
    fn empty_timeline_is_none() {
        assert_eq!(parse_timeline("quiet", "[]").unwrap(), None);
    }

    #[test]
    fn malformed_bodies_are_fetch_errors() {
        for body in [
            r#"{"errors":[{"code":34,"message":"Sorry, that page does not exist."}]}"#,
            r#"[{"id": 1, "created_at": "yesterday", "text": "x"}]"#,
            r#"[{"created_at": "Wed Oct 10 20:19:24 +0000 2018", "text": "x"}]"#,
        ] {
            let err = parse_timeline("alice", body).unwrap_err();
            assert!(
                matches!(&err, Error::Fetch { account, .. } if account == "alice"),
                "{body}: {err}"
            );
        }
    }

    #[tokio::test]
    async fn unreachable_api_is_a_fetch_error() {
        let client = TwitterClient::new(
            TwitterCredentials {
                api_key: "k".to_string(),
                api_secret: "s".to_string(),
                access_token: "t".to_string(),
                access_token_secret: "ts".to_string(),
            },
            "http://127.0.0.1:9/1.1",
            Duration::from_secs(2),
        )
        .unwrap();

        let err = client.latest_post("alice").await.unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
    }
}
