use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use trade_engine::{
    db_types::{Auec, BuyOrderStatus, TradeStatus},
    new_pool,
    schema::{prepare_schema, table_columns},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    BuyOrderManagement,
    SqliteDatabase,
    TradeManagement,
};

async fn empty_pool() -> (String, SqlitePool) {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let pool = new_pool(&url, 1).await.expect("Error connecting to database");
    (url, pool)
}

#[tokio::test]
async fn schema_setup_is_idempotent() {
    let (url, pool) = empty_pool().await;
    prepare_schema(&pool).await.unwrap();
    let mut conn = pool.acquire().await.unwrap();
    let before = table_columns("trades", &mut conn).await.unwrap();
    drop(conn);
    prepare_schema(&pool).await.unwrap();
    let mut conn = pool.acquire().await.unwrap();
    let after = table_columns("trades", &mut conn).await.unwrap();
    assert_eq!(before, after);
    assert_eq!(after.iter().filter(|c| *c == "stock").count(), 1);
    let legacy_tables = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sqlite_master WHERE name LIKE '%_legacy'")
        .fetch_one(&mut *conn)
        .await
        .unwrap();
    assert_eq!(legacy_tables, 0);
    drop(conn);
    pool.close().await;
    Sqlite::drop_database(&url).await.ok();
}

#[tokio::test]
async fn legacy_tables_are_upgraded_in_place() {
    let (url, pool) = empty_pool().await;
    let legacy = [
        r#"CREATE TABLE trades (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            guild_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            price INTEGER NOT NULL,
            quantity INTEGER NOT NULL DEFAULT 1,
            status TEXT NOT NULL DEFAULT 'open' CHECK (status IN ('open', 'complete', 'cancelled')),
            announcement_channel TEXT,
            announcement_message TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )"#,
        r#"INSERT INTO trades (guild_id, user_id, title, price, quantity, announcement_channel, announcement_message)
           VALUES ('10', '42', 'Ship', 5000, 3, '500', '900')"#,
        r#"CREATE TABLE buy_orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            guild_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            item TEXT NOT NULL,
            price INTEGER NOT NULL,
            quantity INTEGER,
            status TEXT NOT NULL DEFAULT 'open'
        )"#,
        "INSERT INTO buy_orders (guild_id, user_id, item, price, quantity) VALUES ('10', '43', 'Fighter', 200000, 2)",
    ];
    for statement in legacy {
        sqlx::query(statement).execute(&pool).await.unwrap();
    }
    pool.close().await;

    let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error upgrading database");
    let trade = db.fetch_trade(1).await.unwrap().unwrap();
    assert_eq!(trade.title, "Ship");
    assert_eq!(trade.price, Auec::from(5000));
    assert_eq!(trade.stock, 3);
    assert_eq!(trade.status, TradeStatus::Open);
    assert_eq!(trade.announcement_channel_id, Some("500".into()));
    assert_eq!(trade.announcement_message_id, Some("900".into()));
    assert!(trade.control_cancel.is_none());

    // The rebuilt constraint accepts the newer statuses
    let trade = db.update_status(1, TradeStatus::Escrow, None).await.unwrap().unwrap();
    assert_eq!(trade.status, TradeStatus::Escrow);

    let order = db.fetch_buy_order(1).await.unwrap().unwrap();
    assert_eq!(order.amount, Some(2));
    assert!(order.announcement_channel_id.is_none());

    // New rows keep counting from the migrated ids
    let reopened = SqliteDatabase::new_with_url(&url, 1).await.expect("Error reopening database");
    let fresh = reopened
        .create_trade(trade_engine::db_types::NewTrade::new("10".into(), "42".into(), "Armor", Auec::from(10)))
        .await
        .unwrap();
    assert_eq!(fresh.id, 2);
    Sqlite::drop_database(&url).await.ok();
}

#[tokio::test]
async fn legacy_statuses_are_mapped_instead_of_aborting() {
    let (url, pool) = empty_pool().await;
    let legacy = [
        r#"CREATE TABLE buy_orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            guild_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            item TEXT NOT NULL,
            price INTEGER NOT NULL,
            status TEXT
        )"#,
        r#"INSERT INTO buy_orders (guild_id, user_id, item, price, status) VALUES
            ('10', '43', 'Fighter', 200000, 'Completed'),
            ('10', '43', 'Hauler', 90000, 'on_hold'),
            ('10', '43', 'Scout', 5000, NULL),
            ('10', '43', 'Miner', 70000, 'cancelled')"#,
    ];
    for statement in legacy {
        sqlx::query(statement).execute(&pool).await.unwrap();
    }
    pool.close().await;

    let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error upgrading database");
    let expected = [
        BuyOrderStatus::Fulfilled,
        BuyOrderStatus::Cancelled,
        BuyOrderStatus::Open,
        BuyOrderStatus::Cancelled,
    ];
    for (id, status) in (1..).zip(expected) {
        let order = db.fetch_buy_order(id).await.unwrap().unwrap();
        assert_eq!(order.status, status, "buy order #{id}");
    }
    Sqlite::drop_database(&url).await.ok();
}
