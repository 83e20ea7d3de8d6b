//! OAuth 1.0a request signing (HMAC-SHA1), user context.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha1::Sha1;

use tweetcord_core::{config::TwitterCredentials, errors::Error, Result};

type HmacSha1 = Hmac<Sha1>;

/// RFC 3986 percent-encoding: everything but `A-Za-z0-9-._~`.
pub fn encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

#[derive(Clone, Debug)]
pub struct OAuthSigner {
    creds: TwitterCredentials,
}

impl OAuthSigner {
    pub fn new(creds: TwitterCredentials) -> Self {
        Self { creds }
    }

    /// `Authorization` header value for a request, with a fresh nonce and timestamp.
    pub fn authorization(&self, method: &str, url: &str, params: &[(&str, &str)]) -> Result<String> {
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        self.authorization_with(method, url, params, &nonce, &timestamp)
    }

    pub fn authorization_with(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> Result<String> {
        let mut oauth = vec![
            ("oauth_consumer_key", self.creds.api_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", timestamp),
            ("oauth_token", self.creds.access_token.as_str()),
            ("oauth_version", "1.0"),
        ];

        let mut all = oauth.clone();
        all.extend_from_slice(params);
        let base = signature_base(method, url, &all);
        let signature = sign(
            &base,
            &self.creds.api_secret,
            &self.creds.access_token_secret,
        )?;

        oauth.push(("oauth_signature", signature.as_str()));
        oauth.sort_by(|a, b| a.0.cmp(b.0));

        let fields = oauth
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("OAuth {fields}"))
    }
}

/// Encoded, sorted `k=v&...` over request + oauth parameters.
pub fn parameter_string(params: &[(&str, &str)]) -> String {
    let mut encoded = params
        .iter()
        .map(|(k, v)| (encode(k), encode(v)))
        .collect::<Vec<_>>();
    encoded.sort();
    encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn signature_base(method: &str, url: &str, params: &[(&str, &str)]) -> String {
    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(url),
        encode(&parameter_string(params))
    )
}

pub fn sign(base: &str, consumer_secret: &str, token_secret: &str) -> Result<String> {
    let key = format!("{}&{}", encode(consumer_secret), encode(token_secret));
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| Error::External(format!("oauth signing key rejected: {e}")))?;
    mac.update(base.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
