use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{CommandHistoryEntry, NewUser, Snowflake, User},
    traits::TradeDbError,
};

/// Inserts or refreshes a user. Name fields are overwritten, but an incoming `NULL` never replaces a stored value.
pub async fn upsert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, TradeDbError> {
    let user = sqlx::query_as::<_, User>(
        r#"
            INSERT INTO users (id, username, display_name, discriminator) VALUES ($1, $2, $3, $4)
            ON CONFLICT(id) DO UPDATE SET
                username = excluded.username,
                display_name = COALESCE(excluded.display_name, users.display_name),
                discriminator = COALESCE(excluded.discriminator, users.discriminator),
                updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(user.id)
    .bind(user.username)
    .bind(user.display_name)
    .bind(user.discriminator)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ User {} ({}) upserted", user.id, user.username);
    Ok(user)
}

pub async fn fetch_user(id: &Snowflake, conn: &mut SqliteConnection) -> Result<Option<User>, TradeDbError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn record_command(entry: CommandHistoryEntry, conn: &mut SqliteConnection) -> Result<i64, TradeDbError> {
    let options = entry.options.to_string();
    let id = sqlx::query_scalar::<_, i64>(
        r#"
            INSERT INTO command_history (guild_id, user_id, command_name, options_json)
            VALUES ($1, $2, $3, $4)
            RETURNING id;
        "#,
    )
    .bind(entry.guild_id)
    .bind(entry.user_id)
    .bind(entry.command_name)
    .bind(options)
    .fetch_one(conn)
    .await?;
    Ok(id)
}
