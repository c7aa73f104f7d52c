use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{ChannelKind, Guild, Snowflake, TagKind},
    traits::TradeDbError,
};

pub async fn upsert_guild(id: &Snowflake, name: &str, conn: &mut SqliteConnection) -> Result<Guild, TradeDbError> {
    let guild = sqlx::query_as::<_, Guild>(
        r#"
            INSERT INTO guilds (id, name) VALUES ($1, $2)
            ON CONFLICT(id) DO UPDATE SET name = excluded.name, updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(name)
    .fetch_one(conn)
    .await?;
    Ok(guild)
}

pub async fn fetch_guild(id: &Snowflake, conn: &mut SqliteConnection) -> Result<Option<Guild>, TradeDbError> {
    let guild = sqlx::query_as::<_, Guild>("SELECT * FROM guilds WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(guild)
}

pub async fn set_trade_channel(
    guild: &Snowflake,
    channel: Option<(&Snowflake, ChannelKind)>,
    conn: &mut SqliteConnection,
) -> Result<Option<Guild>, TradeDbError> {
    let (channel, kind) = channel.unzip();
    let result = sqlx::query_as::<_, Guild>(
        r#"
            UPDATE guilds SET trade_channel_id = $1, trade_channel_type = $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $3
            RETURNING *;
        "#,
    )
    .bind(channel)
    .bind(kind)
    .bind(guild)
    .fetch_optional(conn)
    .await?;
    debug!("🗃️ Trade channel for guild {guild} set to {channel:?} ({kind:?})");
    Ok(result)
}

pub async fn set_admin_role(
    guild: &Snowflake,
    role: Option<&Snowflake>,
    conn: &mut SqliteConnection,
) -> Result<Option<Guild>, TradeDbError> {
    let result = sqlx::query_as::<_, Guild>(
        "UPDATE guilds SET admin_role_id = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(role)
    .bind(guild)
    .fetch_optional(conn)
    .await?;
    debug!("🗃️ Admin role for guild {guild} set to {role:?}");
    Ok(result)
}

pub async fn add_moderator_role(
    guild: &Snowflake,
    role: &Snowflake,
    conn: &mut SqliteConnection,
) -> Result<bool, TradeDbError> {
    let result = sqlx::query("INSERT INTO guild_roles (guild_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
        .bind(guild)
        .bind(role)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn remove_moderator_role(
    guild: &Snowflake,
    role: &Snowflake,
    conn: &mut SqliteConnection,
) -> Result<bool, TradeDbError> {
    let result = sqlx::query("DELETE FROM guild_roles WHERE guild_id = $1 AND role_id = $2")
        .bind(guild)
        .bind(role)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn moderator_roles(guild: &Snowflake, conn: &mut SqliteConnection) -> Result<Vec<Snowflake>, TradeDbError> {
    let roles = sqlx::query_scalar::<_, Snowflake>("SELECT role_id FROM guild_roles WHERE guild_id = $1 ORDER BY id")
        .bind(guild)
        .fetch_all(conn)
        .await?;
    Ok(roles)
}

pub async fn add_forum_tag(
    guild: &Snowflake,
    kind: TagKind,
    tag: &Snowflake,
    conn: &mut SqliteConnection,
) -> Result<bool, TradeDbError> {
    let result =
        sqlx::query("INSERT INTO guild_forum_tags (guild_id, kind, tag_id) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING")
            .bind(guild)
            .bind(kind)
            .bind(tag)
            .execute(conn)
            .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn remove_forum_tag(
    guild: &Snowflake,
    kind: TagKind,
    tag: &Snowflake,
    conn: &mut SqliteConnection,
) -> Result<bool, TradeDbError> {
    let result = sqlx::query("DELETE FROM guild_forum_tags WHERE guild_id = $1 AND kind = $2 AND tag_id = $3")
        .bind(guild)
        .bind(kind)
        .bind(tag)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn forum_tags(
    guild: &Snowflake,
    kind: TagKind,
    conn: &mut SqliteConnection,
) -> Result<Vec<Snowflake>, TradeDbError> {
    let tags = sqlx::query_scalar::<_, Snowflake>(
        "SELECT tag_id FROM guild_forum_tags WHERE guild_id = $1 AND kind = $2 ORDER BY id",
    )
    .bind(guild)
    .bind(kind)
    .fetch_all(conn)
    .await?;
    Ok(tags)
}
