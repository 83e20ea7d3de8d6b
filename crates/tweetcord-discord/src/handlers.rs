//! Gateway event handling: prefixed commands in, replies out.

use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{Context, EventHandler, GatewayIntents, GuildId, Message, Ready};
use tracing::{debug, info, warn};

use tweetcord_core::commands::{denial_message, Caller, Command, CommandHandler};

use crate::DiscordSink;

/// Routes `!add_twitter` & co. into the core [`CommandHandler`].
pub struct CommandRouter {
    commands: Arc<CommandHandler>,
}

impl CommandRouter {
    pub fn new(commands: Arc<CommandHandler>) -> Self {
        Self { commands }
    }

    /// Required gateway intents for the bot.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT
    }
}

/// Administrator check for the author of a guild message. DMs never qualify.
async fn is_admin(ctx: &Context, msg: &Message) -> bool {
    let Some(guild_id) = msg.guild_id else {
        return false;
    };

    let member = match guild_id.member(ctx, msg.author.id).await {
        Ok(m) => m,
        Err(e) => {
            warn!(guild_id = %guild_id, user_id = %msg.author.id, error = %e, "failed to fetch member");
            return false;
        }
    };

    let Some(guild) = ctx.cache.guild(guild_id) else {
        debug!(guild_id = %guild_id, "guild not cached yet");
        return false;
    };
    guild.member_permissions(&member).administrator()
}

#[async_trait]
impl EventHandler for CommandRouter {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            bot_name = %ready.user.name,
            guilds = ready.guilds.len(),
            prefix = %self.commands.prefix(),
            "discord bot ready"
        );
    }

    async fn message(&self, ctx: Context, msg: Message) {
        // Skip bot messages to prevent loops
        if msg.author.bot {
            return;
        }

        let Some(cmd) = Command::parse(self.commands.prefix(), &msg.content) else {
            return;
        };

        let caller = Caller {
            is_admin: is_admin(&ctx, &msg).await,
        };
        debug!(user = %msg.author.name, ?cmd, is_admin = caller.is_admin, "command received");

        let sink = DiscordSink::new(ctx.http.clone());
        let reply = match self.commands.dispatch(cmd, caller, &sink).await {
            Ok(reply) => reply,
            Err(e) => {
                info!(user = %msg.author.name, error = %e, "command rejected");
                denial_message(&e)
            }
        };

        if let Err(e) = msg.channel_id.say(&ctx.http, reply).await {
            warn!(channel_id = %msg.channel_id, error = %e, "failed to send command response");
        }
    }

    async fn cache_ready(&self, _ctx: Context, guilds: Vec<GuildId>) {
        debug!(guild_count = guilds.len(), "discord cache ready");
    }
}
