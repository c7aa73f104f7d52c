//! Schema creation and in-place upgrades.
//!
//! On startup every table is created if it is missing. A table that exists in an older shape (a current column is
//! missing, or its status check constraint predates a newer status value) is rebuilt inside the same transaction:
//! the old table is renamed, the current table is created, rows are copied across with a column-presence-aware
//! `SELECT`, and the old table is dropped. Running the setup against an up-to-date database changes nothing.
use log::*;
use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    db_types::{BuyOrderStatus, TradeStatus},
    traits::TradeDbError,
};

struct ColumnSpec {
    name: &'static str,
    /// Predecessor column names, tried in order when the column itself is missing.
    legacy: &'static [&'static str],
    /// SQL expression used when neither the column nor a predecessor exists.
    fallback: &'static str,
}

const fn column(name: &'static str) -> ColumnSpec {
    ColumnSpec { name, legacy: &[], fallback: "NULL" }
}

const fn column_or(name: &'static str, fallback: &'static str) -> ColumnSpec {
    ColumnSpec { name, legacy: &[], fallback }
}

const fn renamed(name: &'static str, legacy: &'static [&'static str], fallback: &'static str) -> ColumnSpec {
    ColumnSpec { name, legacy, fallback }
}

struct TableSpec {
    name: &'static str,
    create: &'static str,
    columns: &'static [ColumnSpec],
    /// Every value the status check constraint must accept.
    statuses: &'static [&'static str],
    /// Older spellings of a status and the value they migrate to.
    status_aliases: &'static [(&'static str, &'static str)],
    /// Where rows with an unrecognised status end up.
    unknown_status: &'static str,
    indexes: &'static [&'static str],
}

const TRADE_STATUSES: [&str; 7] = ["open", "matched", "escrow", "complete", "sold_out", "cancelled", "expired"];
const BUY_ORDER_STATUSES: [&str; 3] = ["open", "fulfilled", "cancelled"];

const GUILDS: TableSpec = TableSpec {
    name: "guilds",
    create: r#"
        CREATE TABLE guilds (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            admin_role_id TEXT,
            trade_channel_id TEXT,
            trade_channel_type TEXT CHECK (trade_channel_type IS NULL OR trade_channel_type IN ('forum', 'text')),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )"#,
    columns: &[
        column("id"),
        column_or("name", "id"),
        column("admin_role_id"),
        column("trade_channel_id"),
        column("trade_channel_type"),
        column_or("created_at", "CURRENT_TIMESTAMP"),
        column_or("updated_at", "CURRENT_TIMESTAMP"),
    ],
    statuses: &[],
    status_aliases: &[],
    unknown_status: "open",
    indexes: &[],
};

const GUILD_ROLES: TableSpec = TableSpec {
    name: "guild_roles",
    create: r#"
        CREATE TABLE guild_roles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            guild_id TEXT NOT NULL,
            role_id TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (guild_id, role_id)
        )"#,
    columns: &[column("id"), column("guild_id"), column("role_id"), column_or("created_at", "CURRENT_TIMESTAMP")],
    statuses: &[],
    status_aliases: &[],
    unknown_status: "open",
    indexes: &[],
};

const GUILD_FORUM_TAGS: TableSpec = TableSpec {
    name: "guild_forum_tags",
    create: r#"
        CREATE TABLE guild_forum_tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            guild_id TEXT NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('sell', 'buy')),
            tag_id TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (guild_id, kind, tag_id)
        )"#,
    columns: &[
        column("id"),
        column("guild_id"),
        column_or("kind", "'sell'"),
        column("tag_id"),
        column_or("created_at", "CURRENT_TIMESTAMP"),
    ],
    statuses: &[],
    status_aliases: &[],
    unknown_status: "open",
    indexes: &[],
};

const USERS: TableSpec = TableSpec {
    name: "users",
    create: r#"
        CREATE TABLE users (
            id TEXT PRIMARY KEY NOT NULL,
            username TEXT NOT NULL,
            display_name TEXT,
            discriminator TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )"#,
    columns: &[
        column("id"),
        column_or("username", "id"),
        column("display_name"),
        column("discriminator"),
        column_or("created_at", "CURRENT_TIMESTAMP"),
        column_or("updated_at", "CURRENT_TIMESTAMP"),
    ],
    statuses: &[],
    status_aliases: &[],
    unknown_status: "open",
    indexes: &[],
};

const TRADES: TableSpec = TableSpec {
    name: "trades",
    create: r#"
        CREATE TABLE trades (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            guild_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            price INTEGER NOT NULL,
            discount_percent INTEGER CHECK (discount_percent IS NULL OR discount_percent BETWEEN 0 AND 95),
            discounted_price INTEGER,
            stock INTEGER NOT NULL DEFAULT 1 CHECK (stock >= 0),
            image_url TEXT,
            status TEXT NOT NULL DEFAULT 'open'
                CHECK (status IN ('open', 'matched', 'escrow', 'complete', 'sold_out', 'cancelled', 'expired')),
            reason TEXT,
            announcement_channel_id TEXT,
            announcement_message_id TEXT,
            control_done_one TEXT,
            control_done_all TEXT,
            control_cancel TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )"#,
    columns: &[
        column("id"),
        column("guild_id"),
        column("user_id"),
        column_or("title", "''"),
        column("price"),
        column("discount_percent"),
        column("discounted_price"),
        renamed("stock", &["quantity"], "1"),
        column("image_url"),
        column_or("status", "'open'"),
        column("reason"),
        renamed("announcement_channel_id", &["announcement_channel"], "NULL"),
        renamed("announcement_message_id", &["announcement_message"], "NULL"),
        column("control_done_one"),
        column("control_done_all"),
        column("control_cancel"),
        column_or("created_at", "CURRENT_TIMESTAMP"),
        column_or("updated_at", "CURRENT_TIMESTAMP"),
    ],
    statuses: &TRADE_STATUSES,
    status_aliases: &[
        ("closed", "complete"),
        ("completed", "complete"),
        ("sold", "sold_out"),
        ("canceled", "cancelled"),
    ],
    unknown_status: "expired",
    indexes: &[
        "CREATE INDEX IF NOT EXISTS trades_owner ON trades (guild_id, user_id, status)",
    ],
};

const BUY_ORDERS: TableSpec = TableSpec {
    name: "buy_orders",
    create: r#"
        CREATE TABLE buy_orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            guild_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            item TEXT NOT NULL,
            price INTEGER NOT NULL,
            amount INTEGER,
            attachment_url TEXT,
            status TEXT NOT NULL DEFAULT 'open' CHECK (status IN ('open', 'fulfilled', 'cancelled')),
            announcement_channel_id TEXT,
            announcement_message_id TEXT,
            control_done TEXT,
            control_cancel TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )"#,
    columns: &[
        column("id"),
        column("guild_id"),
        column("user_id"),
        column_or("item", "''"),
        column("price"),
        renamed("amount", &["quantity"], "NULL"),
        column("attachment_url"),
        column_or("status", "'open'"),
        renamed("announcement_channel_id", &["announcement_channel"], "NULL"),
        renamed("announcement_message_id", &["announcement_message"], "NULL"),
        column("control_done"),
        column("control_cancel"),
        column_or("created_at", "CURRENT_TIMESTAMP"),
        column_or("updated_at", "CURRENT_TIMESTAMP"),
    ],
    statuses: &BUY_ORDER_STATUSES,
    status_aliases: &[("completed", "fulfilled"), ("closed", "fulfilled"), ("canceled", "cancelled")],
    unknown_status: "cancelled",
    indexes: &[
        "CREATE INDEX IF NOT EXISTS buy_orders_owner ON buy_orders (guild_id, user_id, status)",
    ],
};

const COMMAND_HISTORY: TableSpec = TableSpec {
    name: "command_history",
    create: r#"
        CREATE TABLE command_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            guild_id TEXT,
            user_id TEXT,
            command_name TEXT NOT NULL,
            options_json TEXT NOT NULL DEFAULT '{}',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )"#,
    columns: &[
        column("id"),
        column("guild_id"),
        column("user_id"),
        column_or("command_name", "''"),
        column_or("options_json", "'{}'"),
        column_or("created_at", "CURRENT_TIMESTAMP"),
    ],
    statuses: &[],
    status_aliases: &[],
    unknown_status: "open",
    indexes: &[],
};

const TABLES: [&TableSpec; 7] = [&GUILDS, &GUILD_ROLES, &GUILD_FORUM_TAGS, &USERS, &TRADES, &BUY_ORDERS, &COMMAND_HISTORY];

/// Creates or upgrades every table in a single transaction.
pub async fn prepare_schema(pool: &SqlitePool) -> Result<(), TradeDbError> {
    debug_assert_eq!(TRADE_STATUSES.len(), TradeStatus::ALL.len());
    debug_assert_eq!(BUY_ORDER_STATUSES.len(), BuyOrderStatus::ALL.len());
    let mut tx = pool.begin().await?;
    for table in TABLES {
        prepare_table(table, &mut tx).await?;
    }
    tx.commit().await?;
    debug!("🗃️ Database schema is up to date");
    Ok(())
}

/// The column names of `table`, in declaration order. Empty if the table does not exist.
pub async fn table_columns(table: &str, conn: &mut SqliteConnection) -> Result<Vec<String>, TradeDbError> {
    let columns = sqlx::query_scalar::<_, String>("SELECT name FROM pragma_table_info($1) ORDER BY cid")
        .bind(table)
        .fetch_all(conn)
        .await?;
    Ok(columns)
}

async fn table_sql(table: &str, conn: &mut SqliteConnection) -> Result<Option<String>, TradeDbError> {
    let sql = sqlx::query_scalar::<_, String>("SELECT sql FROM sqlite_master WHERE type = 'table' AND name = $1")
        .bind(table)
        .fetch_optional(conn)
        .await?;
    Ok(sql)
}

async fn prepare_table(table: &TableSpec, conn: &mut SqliteConnection) -> Result<(), TradeDbError> {
    let existing = table_columns(table.name, conn).await?;
    if existing.is_empty() {
        sqlx::query(table.create).execute(&mut *conn).await?;
        info!("🗃️ Created table {}", table.name);
    } else if let Some(reason) = outdated_reason(table, &existing, conn).await? {
        info!("🗃️ Table {} is outdated ({reason}). Migrating.", table.name);
        migrate_table(table, &existing, conn).await?;
    }
    for index in table.indexes {
        sqlx::query(index).execute(&mut *conn).await?;
    }
    Ok(())
}

async fn outdated_reason(
    table: &TableSpec,
    existing: &[String],
    conn: &mut SqliteConnection,
) -> Result<Option<String>, TradeDbError> {
    let missing =
        table.columns.iter().filter(|c| !existing.iter().any(|e| e == c.name)).map(|c| c.name).collect::<Vec<_>>();
    if !missing.is_empty() {
        return Ok(Some(format!("missing columns: {}", missing.join(", "))));
    }
    if table.statuses.is_empty() {
        return Ok(None);
    }
    let sql = table_sql(table.name, conn).await?.unwrap_or_default();
    let unsupported = table.statuses.iter().filter(|s| !sql.contains(&format!("'{s}'"))).copied().collect::<Vec<_>>();
    if unsupported.is_empty() {
        Ok(None)
    } else {
        Ok(Some(format!("status constraint does not allow {}", unsupported.join(", "))))
    }
}

fn copy_expression(column: &ColumnSpec, existing: &[String]) -> String {
    std::iter::once(column.name)
        .chain(column.legacy.iter().copied())
        .find(|name| existing.iter().any(|e| e == name))
        .map(|name| format!("\"{name}\""))
        .unwrap_or_else(|| column.fallback.to_string())
}

fn sql_list<'a>(values: impl Iterator<Item = &'a str>) -> String {
    values.map(|v| format!("'{v}'")).collect::<Vec<_>>().join(", ")
}

/// Maps legacy status values onto the current set. Missing statuses become `open`; unrecognised ones become
/// `table.unknown_status`.
fn status_expression(table: &TableSpec) -> String {
    let mut sql = format!(
        "CASE WHEN \"status\" IS NULL THEN 'open' WHEN LOWER(\"status\") IN ({}) THEN LOWER(\"status\")",
        sql_list(table.statuses.iter().copied())
    );
    for (alias, status) in table.status_aliases {
        sql.push_str(&format!(" WHEN LOWER(\"status\") = '{alias}' THEN '{status}'"));
    }
    sql.push_str(&format!(" ELSE '{}' END", table.unknown_status));
    sql
}

async fn report_unknown_statuses(
    table: &TableSpec,
    legacy: &str,
    conn: &mut SqliteConnection,
) -> Result<(), TradeDbError> {
    let known = sql_list(table.statuses.iter().chain(table.status_aliases.iter().map(|(alias, _)| alias)).copied());
    let query = format!(
        "SELECT \"status\", COUNT(*) FROM \"{legacy}\" WHERE \"status\" IS NOT NULL AND LOWER(\"status\") NOT IN \
         ({known}) GROUP BY \"status\""
    );
    let unknown = sqlx::query_as::<_, (String, i64)>(&query).fetch_all(&mut *conn).await?;
    for (status, count) in unknown {
        warn!(
            "🗃️ {count} row(s) in {} have the unknown status '{status}'. They are migrated as '{}'.",
            table.name, table.unknown_status
        );
    }
    Ok(())
}

async fn migrate_table(table: &TableSpec, existing: &[String], conn: &mut SqliteConnection) -> Result<(), TradeDbError> {
    let legacy = format!("{}_legacy", table.name);
    sqlx::query(&format!("DROP TABLE IF EXISTS \"{legacy}\"")).execute(&mut *conn).await?;
    sqlx::query(&format!("ALTER TABLE \"{}\" RENAME TO \"{legacy}\"", table.name)).execute(&mut *conn).await?;
    sqlx::query(table.create).execute(&mut *conn).await?;
    let map_status = !table.statuses.is_empty() && existing.iter().any(|e| e == "status");
    if map_status {
        report_unknown_statuses(table, &legacy, conn).await?;
    }
    let targets = table.columns.iter().map(|c| format!("\"{}\"", c.name)).collect::<Vec<_>>().join(", ");
    let sources = table
        .columns
        .iter()
        .map(|c| if map_status && c.name == "status" { status_expression(table) } else { copy_expression(c, existing) })
        .collect::<Vec<_>>()
        .join(", ");
    let copy = format!("INSERT INTO \"{}\" ({targets}) SELECT {sources} FROM \"{legacy}\"", table.name);
    trace!("🗃️ Executing query: {copy}");
    let copied = sqlx::query(&copy)
        .execute(&mut *conn)
        .await
        .map_err(|e| TradeDbError::Migration(format!("Could not copy rows into {}: {e}", table.name)))?;
    sqlx::query(&format!("DROP TABLE \"{legacy}\"")).execute(&mut *conn).await?;
    info!("🗃️ Migrated {} rows into the current {} table", copied.rows_affected(), table.name);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn copy_expressions_prefer_current_then_legacy_then_fallback() {
        let existing = ["id", "quantity", "announcement_channel", "stock"].map(String::from).to_vec();
        assert_eq!(copy_expression(&renamed("stock", &["quantity"], "1"), &existing), "\"stock\"");
        let existing = ["id", "quantity"].map(String::from).to_vec();
        assert_eq!(copy_expression(&renamed("stock", &["quantity"], "1"), &existing), "\"quantity\"");
        assert_eq!(copy_expression(&renamed("stock", &["qty"], "1"), &existing), "1");
        assert_eq!(copy_expression(&column("reason"), &existing), "NULL");
    }

    #[test]
    fn legacy_statuses_map_onto_current_ones() {
        let sql = status_expression(&BUY_ORDERS);
        assert!(sql.starts_with("CASE WHEN \"status\" IS NULL THEN 'open'"), "{sql}");
        assert!(sql.contains("IN ('open', 'fulfilled', 'cancelled') THEN LOWER(\"status\")"), "{sql}");
        assert!(sql.contains("WHEN LOWER(\"status\") = 'completed' THEN 'fulfilled'"), "{sql}");
        assert!(sql.ends_with("ELSE 'cancelled' END"), "{sql}");
        for table in [&TRADES, &BUY_ORDERS] {
            assert!(table.statuses.contains(&table.unknown_status), "{}", table.name);
            for (_, status) in table.status_aliases {
                assert!(table.statuses.contains(status), "{}: {status}", table.name);
            }
        }
    }

    #[test]
    fn table_definitions_cover_their_columns() {
        for table in TABLES {
            for column in table.columns {
                assert!(table.create.contains(&format!(" {} ", column.name)), "{}.{} missing", table.name, column.name);
            }
        }
    }
}
