//! Chat command surface: `add_twitter`, `remove_twitter`, `list_twitter`,
//! `set_channel`, `help`.
//!
//! Parsing and replies are messenger-agnostic; the adapter decides who is an
//! administrator and resolves channel handles through the [`ChannelSink`].

use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::{
    context::{AppContext, Mutation},
    domain::{ChannelId, ChannelRef},
    formatting::tracking_list,
    ports::ChannelSink,
    Error, Result,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    AddTwitter(String),
    RemoveTwitter(String),
    ListTwitter,
    SetChannel(String),
    Help,
    /// Known command with missing arguments.
    Usage(&'static str),
}

impl Command {
    /// Parse `<prefix><name> [arg]`. `None` for anything that is not one of ours.
    pub fn parse(prefix: &str, text: &str) -> Option<Self> {
        let body = text.trim().strip_prefix(prefix)?;
        let mut parts = body.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or("").to_lowercase();
        let arg = parts
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.split_whitespace().next().unwrap_or(s).to_string());

        let cmd = match (name.as_str(), arg) {
            ("add_twitter", Some(a)) => Self::AddTwitter(a),
            ("add_twitter", None) => Self::Usage("add_twitter <username>"),
            ("remove_twitter", Some(a)) => Self::RemoveTwitter(a),
            ("remove_twitter", None) => Self::Usage("remove_twitter <username>"),
            ("list_twitter", _) => Self::ListTwitter,
            ("set_channel", Some(a)) => Self::SetChannel(a),
            ("set_channel", None) => Self::Usage("set_channel <#channel>"),
            ("help", _) => Self::Help,
            _ => return None,
        };
        Some(cmd)
    }

    pub fn requires_admin(&self) -> bool {
        !matches!(self, Self::Help | Self::Usage(_))
    }
}

/// Who invoked a command, as far as the core cares.
#[derive(Clone, Copy, Debug)]
pub struct Caller {
    pub is_admin: bool,
}

pub struct CommandHandler {
    ctx: Arc<AppContext>,
    prefix: String,
}

impl CommandHandler {
    pub fn new(ctx: Arc<AppContext>, prefix: impl Into<String>) -> Self {
        Self {
            ctx,
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Run a parsed command and produce the reply text.
    ///
    /// `Err(Error::PermissionDenied)` when the caller is not an administrator.
    pub async fn dispatch(
        &self,
        cmd: Command,
        caller: Caller,
        sink: &dyn ChannelSink,
    ) -> Result<String> {
        if cmd.requires_admin() && !caller.is_admin {
            return Err(Error::PermissionDenied(
                "administrator permission is required".to_string(),
            ));
        }

        let reply = match cmd {
            Command::AddTwitter(raw) => self.add_account(&raw).await,
            Command::RemoveTwitter(raw) => self.remove_account(&raw).await,
            Command::ListTwitter => self.list_accounts().await,
            Command::SetChannel(raw) => match parse_channel_arg(&raw) {
                Some(id) => match sink.resolve_channel(id).await {
                    Some(channel) => self.set_channel(&channel).await,
                    None => format!("Channel not found: {raw}"),
                },
                None => format!("Channel not found: {raw}"),
            },
            Command::Help => self.help(),
            Command::Usage(usage) => format!("Usage: `{}{usage}`", self.prefix),
        };
        Ok(reply)
    }

    pub async fn add_account(&self, raw: &str) -> String {
        let Some(account) = normalize_username(raw) else {
            return invalid_username(raw);
        };

        let m = self
            .ctx
            .mutate(|cfg| {
                let added = cfg.add_account(&account);
                (added, added)
            })
            .await;

        let reply = if m.value {
            tracing::info!(account = %account, "now tracking");
            format!("Now tracking @{account}")
        } else {
            format!("Already tracking @{account}")
        };
        with_persist_warning(reply, &m)
    }

    /// Untrack `raw`. Stored entries are matched verbatim first, so entries
    /// that never went through [`normalize_username`] stay removable.
    pub async fn remove_account(&self, raw: &str) -> String {
        let raw = raw.trim();
        let normalized = normalize_username(raw);

        let m = self
            .ctx
            .mutate(|cfg| {
                let removed = if cfg.remove_account(raw) {
                    Some(raw.to_string())
                } else {
                    normalized
                        .as_deref()
                        .filter(|name| cfg.remove_account(name))
                        .map(str::to_string)
                };
                (removed.is_some(), removed)
            })
            .await;

        let reply = match (&m.value, &normalized) {
            (Some(account), _) => {
                tracing::info!(account = %account, "stopped tracking");
                format!("Stopped tracking @{}", account.trim_start_matches('@'))
            }
            (None, Some(name)) => format!("Not tracking @{name}"),
            (None, None) => return invalid_username(raw),
        };
        with_persist_warning(reply, &m)
    }

    pub async fn list_accounts(&self) -> String {
        self.ctx.read(|cfg| tracking_list(cfg.accounts())).await
    }

    pub async fn set_channel(&self, channel: &ChannelRef) -> String {
        let m = self
            .ctx
            .mutate(|cfg| {
                cfg.set_channel(channel.id);
                (true, ())
            })
            .await;

        tracing::info!(channel_id = channel.id.0, channel = %channel.name, "target channel set");
        with_persist_warning(
            format!("Twitter updates will be sent to {}", channel.mention()),
            &m,
        )
    }

    fn help(&self) -> String {
        let p = &self.prefix;
        format!(
            "Commands (administrators only):\n\
             `{p}add_twitter <username>` - start relaying an account\n\
             `{p}remove_twitter <username>` - stop relaying an account\n\
             `{p}list_twitter` - show tracked accounts\n\
             `{p}set_channel <#channel>` - choose where updates are posted"
        )
    }
}

/// Reply for callers that fail the permission check.
pub fn denial_message(err: &Error) -> String {
    match err {
        Error::PermissionDenied(_) => {
            "You need the Administrator permission to use this command.".to_string()
        }
        other => format!("Command failed: {other}"),
    }
}

/// Strip a leading `@` and validate Twitter's handle rules.
pub fn normalize_username(raw: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]{1,15}$").expect("valid regex"));

    let name = raw.trim().trim_start_matches('@');
    re.is_match(name).then(|| name.to_string())
}

/// Accepts a channel mention (`<#123>`) or a bare numeric id.
pub fn parse_channel_arg(raw: &str) -> Option<ChannelId> {
    let raw = raw.trim();
    let digits = raw
        .strip_prefix("<#")
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(raw);
    match digits.parse::<u64>() {
        Ok(0) | Err(_) => None,
        Ok(id) => Some(ChannelId(id)),
    }
}

fn invalid_username(raw: &str) -> String {
    format!("`{raw}` is not a valid Twitter username")
}

fn with_persist_warning<T>(reply: String, m: &Mutation<T>) -> String {
    match &m.persist_error {
        None => reply,
        Some(e) => format!("{reply}\n(warning: could not save configuration: {e})"),
    }
}
