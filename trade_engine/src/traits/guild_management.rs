use crate::{
    db_types::{ChannelKind, Guild, Snowflake, TagKind},
    traits::TradeDbError,
};

/// Per-guild configuration.
///
/// The add/remove methods are idempotent and report whether anything changed.
#[allow(async_fn_in_trait)]
pub trait GuildManagement {
    /// Creates the guild, or refreshes its name if it already exists.
    async fn upsert_guild(&self, id: &Snowflake, name: &str) -> Result<Guild, TradeDbError>;

    async fn fetch_guild(&self, id: &Snowflake) -> Result<Option<Guild>, TradeDbError>;

    async fn set_trade_channel(
        &self,
        guild: &Snowflake,
        channel: &Snowflake,
        kind: ChannelKind,
    ) -> Result<Option<Guild>, TradeDbError>;

    async fn clear_trade_channel(&self, guild: &Snowflake) -> Result<Option<Guild>, TradeDbError>;

    async fn set_admin_role(&self, guild: &Snowflake, role: Option<&Snowflake>) -> Result<Option<Guild>, TradeDbError>;

    async fn add_moderator_role(&self, guild: &Snowflake, role: &Snowflake) -> Result<bool, TradeDbError>;

    async fn remove_moderator_role(&self, guild: &Snowflake, role: &Snowflake) -> Result<bool, TradeDbError>;

    /// Moderator roles in the order they were added.
    async fn moderator_roles(&self, guild: &Snowflake) -> Result<Vec<Snowflake>, TradeDbError>;

    async fn add_forum_tag(&self, guild: &Snowflake, kind: TagKind, tag: &Snowflake) -> Result<bool, TradeDbError>;

    async fn remove_forum_tag(&self, guild: &Snowflake, kind: TagKind, tag: &Snowflake) -> Result<bool, TradeDbError>;

    /// Forum tags of the given kind in the order they were added.
    async fn forum_tags(&self, guild: &Snowflake, kind: TagKind) -> Result<Vec<Snowflake>, TradeDbError>;
}
