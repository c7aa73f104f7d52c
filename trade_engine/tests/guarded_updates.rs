use trade_engine::{
    db_types::{AnnouncementUpdate, Auec, BuyOrderStatus, NewBuyOrder, NewTrade, Patch, TradeStatus},
    test_utils::prepare_env::new_test_db,
    BuyOrderManagement,
    SqliteDatabase,
    TradeDbError,
    TradeManagement,
};

async fn trade_with_stock(db: &SqliteDatabase, stock: i64) -> i64 {
    let trade = NewTrade::new("10".into(), "42".into(), "Ship", Auec::from(5000)).with_stock(stock);
    db.create_trade(trade).await.expect("Error creating trade").id
}

async fn open_buy_order(db: &SqliteDatabase) -> i64 {
    let order = NewBuyOrder::new("10".into(), "43".into(), "Fighter", Auec::from(200_000));
    db.create_buy_order(order).await.expect("Error creating buy order").id
}

#[tokio::test]
async fn reduce_stock_ignores_closed_trades() {
    let db = new_test_db().await;
    let id = trade_with_stock(&db, 3).await;
    let cancelled = db.update_status(id, TradeStatus::Cancelled, None).await.unwrap().unwrap();

    assert!(db.reduce_stock(id, 1).await.unwrap().is_none());
    let trade = db.fetch_trade(id).await.unwrap().unwrap();
    assert_eq!(trade.stock, 3);
    assert_eq!(trade.status, TradeStatus::Cancelled);
    assert_eq!(trade.updated_at, cancelled.updated_at);
}

#[tokio::test]
async fn reduce_stock_never_oversells() {
    let db = new_test_db().await;
    let id = trade_with_stock(&db, 2).await;

    assert!(db.reduce_stock(id, 3).await.unwrap().is_none());
    let trade = db.fetch_trade(id).await.unwrap().unwrap();
    assert_eq!(trade.stock, 2);
    assert_eq!(trade.status, TradeStatus::Open);

    let trade = db.reduce_stock(id, 2).await.unwrap().unwrap();
    assert_eq!(trade.stock, 0);
    assert_eq!(trade.status, TradeStatus::SoldOut);
    assert!(db.reduce_stock(id, 1).await.unwrap().is_none());
    assert!(db.reduce_stock(99, 1).await.unwrap().is_none());
}

#[tokio::test]
async fn reduce_stock_needs_a_positive_amount() {
    let db = new_test_db().await;
    let id = trade_with_stock(&db, 2).await;
    for amount in [0, -1] {
        let err = db.reduce_stock(id, amount).await.unwrap_err();
        assert!(matches!(err, TradeDbError::Validation(_)), "{err:?}");
    }
    assert_eq!(db.fetch_trade(id).await.unwrap().unwrap().stock, 2);
}

#[tokio::test]
async fn concurrent_sales_of_the_last_unit() {
    let db = new_test_db().await;
    let id = trade_with_stock(&db, 1).await;

    let (a, b) = tokio::join!(db.reduce_stock(id, 1), db.reduce_stock(id, 1));
    let applied = [a.unwrap(), b.unwrap()].into_iter().flatten().collect::<Vec<_>>();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].stock, 0);

    let trade = db.fetch_trade(id).await.unwrap().unwrap();
    assert_eq!(trade.stock, 0);
    assert_eq!(trade.status, TradeStatus::SoldOut);
}

#[tokio::test]
async fn buy_order_status_only_leaves_open_once() {
    let db = new_test_db().await;
    let id = open_buy_order(&db).await;

    let order = db.update_buy_order_status(id, BuyOrderStatus::Fulfilled).await.unwrap().unwrap();
    assert_eq!(order.status, BuyOrderStatus::Fulfilled);
    assert!(db.update_buy_order_status(id, BuyOrderStatus::Cancelled).await.unwrap().is_none());
    let order = db.fetch_buy_order(id).await.unwrap().unwrap();
    assert_eq!(order.status, BuyOrderStatus::Fulfilled);

    let err = db.update_buy_order_status(id, BuyOrderStatus::Open).await.unwrap_err();
    assert!(matches!(err, TradeDbError::Validation(_)), "{err:?}");
    assert!(db.update_buy_order_status(99, BuyOrderStatus::Cancelled).await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_buy_order_transitions() {
    let db = new_test_db().await;
    let id = open_buy_order(&db).await;

    let (a, b) = tokio::join!(
        db.update_buy_order_status(id, BuyOrderStatus::Fulfilled),
        db.update_buy_order_status(id, BuyOrderStatus::Cancelled)
    );
    let applied = [a.unwrap(), b.unwrap()].into_iter().flatten().collect::<Vec<_>>();
    assert_eq!(applied.len(), 1);
    let order = db.fetch_buy_order(id).await.unwrap().unwrap();
    assert_eq!(order.status, applied[0].status);
}

#[tokio::test]
async fn buy_orders_have_a_single_done_control() {
    let db = new_test_db().await;
    let id = open_buy_order(&db).await;
    let order = db.fetch_buy_order(id).await.unwrap().unwrap();
    assert_eq!(order.control_done.as_deref(), Some("buy:1:done"));

    let update = AnnouncementUpdate { done_all: Patch::Set("buy:1:done:all".into()), ..Default::default() };
    let err = db.update_buy_order_announcement(id, update).await.unwrap_err();
    assert!(matches!(err, TradeDbError::Validation(_)), "{err:?}");

    let order = db.update_buy_order_announcement(id, AnnouncementUpdate::clear_controls()).await.unwrap().unwrap();
    assert!(order.control_done.is_none() && order.control_cancel.is_none());
}
