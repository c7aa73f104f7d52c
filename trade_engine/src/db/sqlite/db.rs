use std::fmt::Debug;

use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};

use super::{buy_orders, db_url, guilds, new_pool, schema, trades, users};
use crate::{
    db_types::{
        AnnouncementUpdate,
        BuyOrder,
        BuyOrderStatus,
        ChannelKind,
        CommandHistoryEntry,
        Guild,
        NewBuyOrder,
        NewTrade,
        NewUser,
        Snowflake,
        TagKind,
        Trade,
        TradeStatus,
        User,
    },
    traits::{
        BuyOrderManagement,
        GuildManagement,
        TradeDbError,
        TradeDeskDatabase,
        TradeManagement,
        UserManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the `TB_DATABASE_URL` environment variable (or the default).
    pub async fn new(max_connections: u32) -> Result<Self, TradeDbError> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    /// Connects to the database at `url`, creating the file if it does not exist yet, and brings the schema up to
    /// date.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, TradeDbError> {
        if !Sqlite::database_exists(url).await? {
            info!("🗃️ Database {url} does not exist. Creating it.");
            Sqlite::create_database(url).await?;
        }
        let pool = new_pool(url, max_connections).await?;
        schema::prepare_schema(&pool).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) -> Result<(), TradeDbError> {
        self.pool.close().await;
        Ok(())
    }
}

impl TradeDeskDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }
}

impl TradeManagement for SqliteDatabase {
    async fn create_trade(&self, trade: NewTrade) -> Result<Trade, TradeDbError> {
        let mut tx = self.pool.begin().await?;
        let trade = trades::insert_trade(trade, &mut tx).await?;
        let controls = Trade::initial_controls(trade.id, trade.stock);
        let trade = trades::update_announcement_metadata(trade.id, controls, &mut tx)
            .await?
            .ok_or_else(|| TradeDbError::Validation(format!("Trade #{} vanished during creation", trade.id)))?;
        tx.commit().await?;
        debug!("🗃️ Trade #{} created with {} control ids", trade.id, trade.controls().len());
        Ok(trade)
    }

    async fn fetch_trade(&self, id: i64) -> Result<Option<Trade>, TradeDbError> {
        let mut conn = self.pool.acquire().await?;
        trades::fetch_trade(id, &mut conn).await
    }

    async fn open_trades_for_user(&self, guild: &Snowflake, user: &Snowflake) -> Result<Vec<Trade>, TradeDbError> {
        let mut conn = self.pool.acquire().await?;
        trades::open_trades_for_user(guild, user, &mut conn).await
    }

    async fn reduce_stock(&self, id: i64, amount: i64) -> Result<Option<Trade>, TradeDbError> {
        let mut conn = self.pool.acquire().await?;
        trades::reduce_stock(id, amount, &mut conn).await
    }

    async fn update_status(
        &self,
        id: i64,
        status: TradeStatus,
        reason: Option<String>,
    ) -> Result<Option<Trade>, TradeDbError> {
        let mut conn = self.pool.acquire().await?;
        trades::update_status(id, status, reason, &mut conn).await
    }

    async fn update_discount(&self, id: i64, percent: Option<i64>) -> Result<Option<Trade>, TradeDbError> {
        trades::validate_discount(percent)?;
        let mut conn = self.pool.acquire().await?;
        trades::update_discount(id, percent, &mut conn).await
    }

    async fn update_trade_announcement(
        &self,
        id: i64,
        update: AnnouncementUpdate,
    ) -> Result<Option<Trade>, TradeDbError> {
        let mut conn = self.pool.acquire().await?;
        trades::update_announcement_metadata(id, update, &mut conn).await
    }
}

impl BuyOrderManagement for SqliteDatabase {
    async fn create_buy_order(&self, order: NewBuyOrder) -> Result<BuyOrder, TradeDbError> {
        let mut tx = self.pool.begin().await?;
        let order = buy_orders::insert_buy_order(order, &mut tx).await?;
        let controls = BuyOrder::initial_controls(order.id);
        let order = buy_orders::update_announcement_metadata(order.id, controls, &mut tx)
            .await?
            .ok_or_else(|| TradeDbError::Validation(format!("Buy order #{} vanished during creation", order.id)))?;
        tx.commit().await?;
        debug!("🗃️ Buy order #{} created", order.id);
        Ok(order)
    }

    async fn fetch_buy_order(&self, id: i64) -> Result<Option<BuyOrder>, TradeDbError> {
        let mut conn = self.pool.acquire().await?;
        buy_orders::fetch_buy_order(id, &mut conn).await
    }

    async fn open_buy_orders_for_user(
        &self,
        guild: &Snowflake,
        user: &Snowflake,
    ) -> Result<Vec<BuyOrder>, TradeDbError> {
        let mut conn = self.pool.acquire().await?;
        buy_orders::open_buy_orders_for_user(guild, user, &mut conn).await
    }

    async fn update_buy_order_status(
        &self,
        id: i64,
        status: BuyOrderStatus,
    ) -> Result<Option<BuyOrder>, TradeDbError> {
        let mut conn = self.pool.acquire().await?;
        buy_orders::update_buy_order_status(id, status, &mut conn).await
    }

    async fn update_buy_order_announcement(
        &self,
        id: i64,
        update: AnnouncementUpdate,
    ) -> Result<Option<BuyOrder>, TradeDbError> {
        let mut conn = self.pool.acquire().await?;
        buy_orders::update_announcement_metadata(id, update, &mut conn).await
    }
}

impl GuildManagement for SqliteDatabase {
    async fn upsert_guild(&self, id: &Snowflake, name: &str) -> Result<Guild, TradeDbError> {
        let mut conn = self.pool.acquire().await?;
        guilds::upsert_guild(id, name, &mut conn).await
    }

    async fn fetch_guild(&self, id: &Snowflake) -> Result<Option<Guild>, TradeDbError> {
        let mut conn = self.pool.acquire().await?;
        guilds::fetch_guild(id, &mut conn).await
    }

    async fn set_trade_channel(
        &self,
        guild: &Snowflake,
        channel: &Snowflake,
        kind: ChannelKind,
    ) -> Result<Option<Guild>, TradeDbError> {
        let mut conn = self.pool.acquire().await?;
        guilds::set_trade_channel(guild, Some((channel, kind)), &mut conn).await
    }

    async fn clear_trade_channel(&self, guild: &Snowflake) -> Result<Option<Guild>, TradeDbError> {
        let mut conn = self.pool.acquire().await?;
        guilds::set_trade_channel(guild, None, &mut conn).await
    }

    async fn set_admin_role(&self, guild: &Snowflake, role: Option<&Snowflake>) -> Result<Option<Guild>, TradeDbError> {
        let mut conn = self.pool.acquire().await?;
        guilds::set_admin_role(guild, role, &mut conn).await
    }

    async fn add_moderator_role(&self, guild: &Snowflake, role: &Snowflake) -> Result<bool, TradeDbError> {
        let mut conn = self.pool.acquire().await?;
        guilds::add_moderator_role(guild, role, &mut conn).await
    }

    async fn remove_moderator_role(&self, guild: &Snowflake, role: &Snowflake) -> Result<bool, TradeDbError> {
        let mut conn = self.pool.acquire().await?;
        guilds::remove_moderator_role(guild, role, &mut conn).await
    }

    async fn moderator_roles(&self, guild: &Snowflake) -> Result<Vec<Snowflake>, TradeDbError> {
        let mut conn = self.pool.acquire().await?;
        guilds::moderator_roles(guild, &mut conn).await
    }

    async fn add_forum_tag(&self, guild: &Snowflake, kind: TagKind, tag: &Snowflake) -> Result<bool, TradeDbError> {
        let mut conn = self.pool.acquire().await?;
        guilds::add_forum_tag(guild, kind, tag, &mut conn).await
    }

    async fn remove_forum_tag(&self, guild: &Snowflake, kind: TagKind, tag: &Snowflake) -> Result<bool, TradeDbError> {
        let mut conn = self.pool.acquire().await?;
        guilds::remove_forum_tag(guild, kind, tag, &mut conn).await
    }

    async fn forum_tags(&self, guild: &Snowflake, kind: TagKind) -> Result<Vec<Snowflake>, TradeDbError> {
        let mut conn = self.pool.acquire().await?;
        guilds::forum_tags(guild, kind, &mut conn).await
    }
}

impl UserManagement for SqliteDatabase {
    async fn upsert_user(&self, user: NewUser) -> Result<User, TradeDbError> {
        let mut conn = self.pool.acquire().await?;
        users::upsert_user(user, &mut conn).await
    }

    async fn fetch_user(&self, id: &Snowflake) -> Result<Option<User>, TradeDbError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user(id, &mut conn).await
    }

    async fn record_command(&self, entry: CommandHistoryEntry) -> Result<i64, TradeDbError> {
        let mut conn = self.pool.acquire().await?;
        users::record_command(entry, &mut conn).await
    }
}
