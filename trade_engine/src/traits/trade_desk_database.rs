use crate::traits::{BuyOrderManagement, GuildManagement, TradeManagement, UserManagement};

/// Everything the command handlers need from a persistence backend.
///
/// Backends are cloned into every worker, so a clone must share the underlying connection pool.
pub trait TradeDeskDatabase: Clone + TradeManagement + BuyOrderManagement + GuildManagement + UserManagement {
    /// The URL of the database
    fn url(&self) -> &str;
}
