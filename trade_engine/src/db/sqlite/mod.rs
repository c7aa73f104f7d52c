//! SQLite backend for the trade engine.
//!
//! The free functions in the submodules take a `&mut SqliteConnection` so that callers can compose them inside a
//! transaction (pass `&mut *tx`). [`SqliteDatabase`] wraps a pool and exposes them through the engine traits.
mod db;

pub mod buy_orders;
pub mod guilds;
pub mod schema;
pub mod trades;
pub mod users;

use std::env;

pub use db::SqliteDatabase;
use log::info;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use crate::traits::TradeDbError;

const SQLITE_DB_URL: &str = "sqlite://data/trade_desk.db";

pub fn db_url() -> String {
    let result = env::var("TB_DATABASE_URL").unwrap_or_else(|_| {
        info!("TB_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, TradeDbError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}
