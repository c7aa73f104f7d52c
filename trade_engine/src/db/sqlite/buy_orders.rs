use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::trades::push_patch;
use crate::{
    db_types::{AnnouncementUpdate, BuyOrder, BuyOrderStatus, NewBuyOrder, Patch, Snowflake},
    traits::TradeDbError,
};

pub async fn insert_buy_order(order: NewBuyOrder, conn: &mut SqliteConnection) -> Result<BuyOrder, TradeDbError> {
    if !order.price.is_positive() {
        return Err(TradeDbError::Validation(format!("Price must be a positive amount, not {}", order.price)));
    }
    if let Some(amount) = order.amount.filter(|a| *a < 1) {
        return Err(TradeDbError::Validation(format!("Amount must be at least 1, not {amount}")));
    }
    let order = sqlx::query_as::<_, BuyOrder>(
        r#"
            INSERT INTO buy_orders (guild_id, user_id, item, price, amount, attachment_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(order.guild_id)
    .bind(order.user_id)
    .bind(order.item)
    .bind(order.price)
    .bind(order.amount)
    .bind(order.attachment_url)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Buy order #{} inserted", order.id);
    Ok(order)
}

pub async fn fetch_buy_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<BuyOrder>, TradeDbError> {
    let order =
        sqlx::query_as::<_, BuyOrder>("SELECT * FROM buy_orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn open_buy_orders_for_user(
    guild: &Snowflake,
    user: &Snowflake,
    conn: &mut SqliteConnection,
) -> Result<Vec<BuyOrder>, TradeDbError> {
    let orders = sqlx::query_as::<_, BuyOrder>(
        "SELECT * FROM buy_orders WHERE guild_id = $1 AND user_id = $2 AND status = 'open' ORDER BY id ASC",
    )
    .bind(guild)
    .bind(user)
    .fetch_all(conn)
    .await?;
    trace!("🗃️ {} open buy orders for user {user} in guild {guild}", orders.len());
    Ok(orders)
}

/// Closes an open buy order. Only `fulfilled` and `cancelled` are valid targets.
pub async fn update_buy_order_status(
    id: i64,
    status: BuyOrderStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<BuyOrder>, TradeDbError> {
    if status == BuyOrderStatus::Open {
        return Err(TradeDbError::Validation("A buy order cannot be re-opened".to_string()));
    }
    let order = sqlx::query_as::<_, BuyOrder>(
        r#"
            UPDATE buy_orders SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND status = 'open'
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    debug!("🗃️ Buy order #{id} -> {status}. Applied: {}", order.is_some());
    Ok(order)
}

pub async fn update_announcement_metadata(
    id: i64,
    update: AnnouncementUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<BuyOrder>, TradeDbError> {
    if matches!(update.done_all, Patch::Set(_)) {
        return Err(TradeDbError::Validation(format!("Buy order #{id} has no \"done all\" control")));
    }
    if update.is_empty() {
        debug!("🗃️ No announcement fields to update for buy order #{id}. Update request skipped.");
        return fetch_buy_order(id, conn).await;
    }
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE buy_orders SET updated_at = CURRENT_TIMESTAMP");
    push_patch(&mut builder, "announcement_channel_id", update.channel_id);
    push_patch(&mut builder, "announcement_message_id", update.message_id);
    push_patch(&mut builder, "control_done", update.done_one);
    push_patch(&mut builder, "control_cancel", update.cancel);
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING *");
    trace!("🗃️ Executing query: {}", builder.sql());
    let order = builder.build_query_as::<BuyOrder>().fetch_optional(conn).await?;
    Ok(order)
}
