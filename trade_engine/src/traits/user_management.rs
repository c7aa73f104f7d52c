use crate::{
    db_types::{CommandHistoryEntry, NewUser, Snowflake, User},
    traits::TradeDbError,
};

#[allow(async_fn_in_trait)]
pub trait UserManagement {
    /// Inserts or updates the user. Name fields are last-write-wins, except that a missing incoming value never
    /// overwrites a stored one.
    async fn upsert_user(&self, user: NewUser) -> Result<User, TradeDbError>;

    async fn fetch_user(&self, id: &Snowflake) -> Result<Option<User>, TradeDbError>;

    /// Appends an entry to the command audit log and returns its id.
    async fn record_command(&self, entry: CommandHistoryEntry) -> Result<i64, TradeDbError>;
}
