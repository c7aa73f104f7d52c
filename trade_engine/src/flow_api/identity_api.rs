use std::fmt::Debug;

use log::*;

use super::Caller;
use crate::{
    db_types::{CommandHistoryEntry, Snowflake},
    guild_cache::GuildMetadataCache,
    traits::{GuildDirectory, GuildManagement, UserManagement},
};

/// Invocation bookkeeping: keeps user and guild rows fresh and appends to the command audit log.
///
/// None of this may stop a command from running, so every failure is logged and swallowed.
pub struct IdentityApi<B, D> {
    db: B,
    guilds: GuildMetadataCache<D>,
}

impl<B, D> Debug for IdentityApi<B, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IdentityApi ({:?})", self.guilds.policy())
    }
}

impl<B, D> IdentityApi<B, D> {
    pub fn new(db: B, guilds: GuildMetadataCache<D>) -> Self {
        Self { db, guilds }
    }

    pub fn guild_cache(&self) -> &GuildMetadataCache<D> {
        &self.guilds
    }
}

impl<B, D> IdentityApi<B, D>
where
    B: UserManagement + GuildManagement,
    D: GuildDirectory,
{
    pub async fn record_invocation(
        &self,
        guild: Option<&Snowflake>,
        caller: &Caller,
        command_name: &str,
        options: serde_json::Value,
    ) {
        if let Err(e) = self.db.upsert_user(caller.as_new_user()).await {
            warn!("🔄️ Could not record user {}: {e}", caller.user_id);
        }
        if let Some(guild) = guild {
            let name = self.guild_name(guild).await;
            if let Err(e) = self.db.upsert_guild(guild, &name).await {
                warn!("🔄️ Could not record guild {guild}: {e}");
            }
        }
        let entry = CommandHistoryEntry {
            guild_id: guild.cloned(),
            user_id: Some(caller.user_id.clone()),
            command_name: command_name.to_string(),
            options,
        };
        match self.db.record_command(entry).await {
            Ok(id) => trace!("🔄️ Command '{command_name}' by {} logged as #{id}", caller.user_id),
            Err(e) => warn!("🔄️ Could not log command '{command_name}' by {}: {e}", caller.user_id),
        }
    }

    /// The best available name for the guild: the remote name, else the stored one, else the id itself.
    async fn guild_name(&self, guild: &Snowflake) -> String {
        match self.guilds.fetch_guild_metadata(guild).await {
            Ok(Some(metadata)) => return metadata.name,
            Ok(None) => debug!("🔄️ Guild {guild} is not visible to the bot"),
            Err(e) => warn!("🔄️ Could not fetch the metadata of guild {guild}: {e}"),
        }
        match self.db.fetch_guild(guild).await {
            Ok(Some(stored)) => stored.name,
            _ => guild.to_string(),
        }
    }
}
