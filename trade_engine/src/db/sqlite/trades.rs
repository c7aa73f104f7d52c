use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{AnnouncementUpdate, NewTrade, Patch, Snowflake, Trade, TradeStatus},
    traits::TradeDbError,
};

pub const MAX_DISCOUNT_PERCENT: i64 = 95;

/// Inserts a new trade. This is not atomic with respect to control-id assignment; [`super::SqliteDatabase`] wraps
/// both steps in a transaction.
pub async fn insert_trade(trade: NewTrade, conn: &mut SqliteConnection) -> Result<Trade, TradeDbError> {
    if !trade.price.is_positive() {
        return Err(TradeDbError::Validation(format!("Price must be a positive amount, not {}", trade.price)));
    }
    if trade.stock < 1 {
        return Err(TradeDbError::Validation(format!("Stock must be at least 1, not {}", trade.stock)));
    }
    let trade = sqlx::query_as::<_, Trade>(
        r#"
            INSERT INTO trades (guild_id, user_id, title, price, stock, image_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(trade.guild_id)
    .bind(trade.user_id)
    .bind(trade.title)
    .bind(trade.price)
    .bind(trade.stock)
    .bind(trade.image_url)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Trade #{} inserted", trade.id);
    Ok(trade)
}

pub async fn fetch_trade(id: i64, conn: &mut SqliteConnection) -> Result<Option<Trade>, TradeDbError> {
    let trade = sqlx::query_as::<_, Trade>("SELECT * FROM trades WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(trade)
}

pub async fn open_trades_for_user(
    guild: &Snowflake,
    user: &Snowflake,
    conn: &mut SqliteConnection,
) -> Result<Vec<Trade>, TradeDbError> {
    let trades = sqlx::query_as::<_, Trade>(
        "SELECT * FROM trades WHERE guild_id = $1 AND user_id = $2 AND status = 'open' ORDER BY id ASC",
    )
    .bind(guild)
    .bind(user)
    .fetch_all(conn)
    .await?;
    trace!("🗃️ {} open trades for user {user} in guild {guild}", trades.len());
    Ok(trades)
}

/// Takes `amount` units off an open trade in a single guarded statement, flipping it to `sold_out` when the stock is
/// exhausted. SQLite evaluates every `SET` expression against the pre-update row.
pub async fn reduce_stock(id: i64, amount: i64, conn: &mut SqliteConnection) -> Result<Option<Trade>, TradeDbError> {
    if amount < 1 {
        return Err(TradeDbError::Validation(format!("Amount must be at least 1, not {amount}")));
    }
    let trade = sqlx::query_as::<_, Trade>(
        r#"
            UPDATE trades SET
                stock = stock - $1,
                status = CASE WHEN stock - $1 <= 0 THEN 'sold_out' ELSE status END,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND status = 'open' AND stock >= $1
            RETURNING *;
        "#,
    )
    .bind(amount)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    match &trade {
        Some(t) => debug!("🗃️ Trade #{id} stock reduced by {amount}. {} left, status {}", t.stock, t.status),
        None => debug!("🗃️ Trade #{id} stock reduction by {amount} rejected"),
    }
    Ok(trade)
}

pub async fn update_status(
    id: i64,
    status: TradeStatus,
    reason: Option<String>,
    conn: &mut SqliteConnection,
) -> Result<Option<Trade>, TradeDbError> {
    let trade = sqlx::query_as::<_, Trade>(
        r#"
            UPDATE trades SET
                status = $1,
                reason = COALESCE($2, reason),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $3
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(reason)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    debug!("🗃️ Trade #{id} status set to {status}");
    Ok(trade)
}

pub fn validate_discount(percent: Option<i64>) -> Result<(), TradeDbError> {
    match percent {
        Some(p) if !(0..=MAX_DISCOUNT_PERCENT).contains(&p) => Err(TradeDbError::Validation(format!(
            "Discount must be between 0 and {MAX_DISCOUNT_PERCENT} percent, not {p}"
        ))),
        _ => Ok(()),
    }
}

/// Sets or clears the discount on an open trade. The discounted price is computed by the database so that it always
/// derives from the stored price.
pub async fn update_discount(
    id: i64,
    percent: Option<i64>,
    conn: &mut SqliteConnection,
) -> Result<Option<Trade>, TradeDbError> {
    validate_discount(percent)?;
    let trade = sqlx::query_as::<_, Trade>(
        r#"
            UPDATE trades SET
                discount_percent = $1,
                discounted_price = CASE
                    WHEN $1 IS NULL THEN NULL
                    ELSE CAST(ROUND(price * (100 - $1) / 100.0) AS INTEGER)
                END,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND status = 'open'
            RETURNING *;
        "#,
    )
    .bind(percent)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    debug!("🗃️ Trade #{id} discount set to {percent:?}. Applied: {}", trade.is_some());
    Ok(trade)
}

pub(crate) fn push_patch<T>(builder: &mut QueryBuilder<'_, Sqlite>, column: &str, patch: Patch<T>)
where T: for<'q> sqlx::Encode<'q, Sqlite> + sqlx::Type<Sqlite> + Send + 'static {
    match patch {
        Patch::Unchanged => {},
        Patch::Clear => {
            builder.push(format!(", {column} = NULL"));
        },
        Patch::Set(value) => {
            builder.push(format!(", {column} = "));
            builder.push_bind(value);
        },
    }
}

pub async fn update_announcement_metadata(
    id: i64,
    update: AnnouncementUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Trade>, TradeDbError> {
    if update.is_empty() {
        debug!("🗃️ No announcement fields to update for trade #{id}. Update request skipped.");
        return fetch_trade(id, conn).await;
    }
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE trades SET updated_at = CURRENT_TIMESTAMP");
    push_patch(&mut builder, "announcement_channel_id", update.channel_id);
    push_patch(&mut builder, "announcement_message_id", update.message_id);
    push_patch(&mut builder, "control_done_one", update.done_one);
    push_patch(&mut builder, "control_done_all", update.done_all);
    push_patch(&mut builder, "control_cancel", update.cancel);
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING *");
    trace!("🗃️ Executing query: {}", builder.sql());
    let trade = builder.build_query_as::<Trade>().fetch_optional(conn).await?;
    Ok(trade)
}
