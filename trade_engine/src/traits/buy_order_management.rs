use crate::{
    db_types::{AnnouncementUpdate, BuyOrder, BuyOrderStatus, NewBuyOrder, Snowflake},
    traits::TradeDbError,
};

#[allow(async_fn_in_trait)]
pub trait BuyOrderManagement {
    /// Stores a new buy order with its control ids. Price (and amount, when given) must be positive.
    async fn create_buy_order(&self, order: NewBuyOrder) -> Result<BuyOrder, TradeDbError>;

    async fn fetch_buy_order(&self, id: i64) -> Result<Option<BuyOrder>, TradeDbError>;

    async fn open_buy_orders_for_user(
        &self,
        guild: &Snowflake,
        user: &Snowflake,
    ) -> Result<Vec<BuyOrder>, TradeDbError>;

    /// Moves an open buy order to `fulfilled` or `cancelled`. Returns `None` if the order is no longer open.
    async fn update_buy_order_status(&self, id: i64, status: BuyOrderStatus)
        -> Result<Option<BuyOrder>, TradeDbError>;

    async fn update_buy_order_announcement(
        &self,
        id: i64,
        update: AnnouncementUpdate,
    ) -> Result<Option<BuyOrder>, TradeDbError>;
}
