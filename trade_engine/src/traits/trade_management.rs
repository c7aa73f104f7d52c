use crate::{
    db_types::{AnnouncementUpdate, NewTrade, Snowflake, Trade, TradeStatus},
    traits::TradeDbError,
};

/// Persistence of sell listings.
///
/// Every state-changing method is a single guarded statement. A `None` result means the guard rejected the
/// transition (or the row does not exist); it is not an error.
#[allow(async_fn_in_trait)]
pub trait TradeManagement {
    /// Stores a new trade and assigns its control ids in the same transaction. Price and stock must be positive.
    async fn create_trade(&self, trade: NewTrade) -> Result<Trade, TradeDbError>;

    async fn fetch_trade(&self, id: i64) -> Result<Option<Trade>, TradeDbError>;

    /// Open trades owned by `user` in `guild`, oldest first.
    async fn open_trades_for_user(&self, guild: &Snowflake, user: &Snowflake) -> Result<Vec<Trade>, TradeDbError>;

    /// Takes `amount` units off an open trade. The trade becomes `sold_out` when its stock reaches zero. Returns `None`
    /// if the trade is not open or has fewer than `amount` units left.
    async fn reduce_stock(&self, id: i64, amount: i64) -> Result<Option<Trade>, TradeDbError>;

    /// Overwrites the status unconditionally. A `reason` replaces any stored reason; `None` keeps it.
    async fn update_status(
        &self,
        id: i64,
        status: TradeStatus,
        reason: Option<String>,
    ) -> Result<Option<Trade>, TradeDbError>;

    /// Sets (`Some`) or clears (`None`) the discount on an open trade. Percentages outside 0..=95 are rejected before
    /// the database is touched.
    async fn update_discount(&self, id: i64, percent: Option<i64>) -> Result<Option<Trade>, TradeDbError>;

    async fn update_trade_announcement(
        &self,
        id: i64,
        update: AnnouncementUpdate,
    ) -> Result<Option<Trade>, TradeDbError>;
}
