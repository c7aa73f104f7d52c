use crate::{db_types::Snowflake, traits::GatewayError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildMetadata {
    pub id: Snowflake,
    pub name: String,
}

/// Remote lookup of guild metadata. `None` means the guild is not visible to the bot.
#[allow(async_fn_in_trait)]
pub trait GuildDirectory {
    async fn fetch_guild_metadata(&self, guild: &Snowflake) -> Result<Option<GuildMetadata>, GatewayError>;
}
