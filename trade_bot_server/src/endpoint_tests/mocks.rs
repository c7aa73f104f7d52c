use mockall::mock;
use trade_engine::{
    db_types::Snowflake,
    traits::{GatewayError, GuildMetadata},
    GuildDirectory,
};

mock! {
    pub Directory {}
    impl GuildDirectory for Directory {
        async fn fetch_guild_metadata(&self, guild: &Snowflake) -> Result<Option<GuildMetadata>, GatewayError>;
    }
}
