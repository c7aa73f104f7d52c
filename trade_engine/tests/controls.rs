mod support;

use support::{ctx, TestDesk, BUYER, SELLER};
use trade_engine::{
    db_types::{BuyOrderStatus, TradeStatus},
    dispatch_control,
    BuyOrderManagement,
    TradeManagement,
};

#[tokio::test]
async fn buttons_run_the_matching_transition() {
    let desk = TestDesk::new(None).await;
    desk.trades.create_trade(&ctx(SELLER), "Ship", 5000, Some(3), None).await.unwrap();
    desk.buy_orders.create_buy_order(&ctx(BUYER), "Fighter", 1_000, None, None).await.unwrap();

    let reply = dispatch_control(&desk.trades, &desk.buy_orders, &ctx(SELLER), "trade:1:done:one").await.unwrap();
    assert!(reply.contains("2 left in stock"), "{}", reply.text());
    let reply = dispatch_control(&desk.trades, &desk.buy_orders, &ctx(SELLER), "trade:1:done:all").await.unwrap();
    assert!(reply.contains("sold out"), "{}", reply.text());
    assert_eq!(desk.db.fetch_trade(1).await.unwrap().unwrap().status, TradeStatus::SoldOut);

    let reply = dispatch_control(&desk.trades, &desk.buy_orders, &ctx(BUYER), "buy:1:done").await.unwrap();
    assert!(reply.contains("fulfilled"));
    assert_eq!(desk.db.fetch_buy_order(1).await.unwrap().unwrap().status, BuyOrderStatus::Fulfilled);
}

#[tokio::test]
async fn stale_and_foreign_buttons() {
    let desk = TestDesk::new(None).await;
    desk.trades.create_trade(&ctx(SELLER), "Ship", 5000, None, None).await.unwrap();

    // Single-unit trades never get a "done all" button
    let reply = dispatch_control(&desk.trades, &desk.buy_orders, &ctx(SELLER), "trade:1:done:all").await.unwrap();
    assert_eq!(reply.text(), "This button is no longer active.");
    let reply = dispatch_control(&desk.trades, &desk.buy_orders, &ctx(BUYER), "trade:1:cancel").await.unwrap();
    assert_eq!(reply.text(), "Trade #1 is not yours.");
    let reply = dispatch_control(&desk.trades, &desk.buy_orders, &ctx(SELLER), "trade:1:cancel").await.unwrap();
    assert!(reply.contains("Trade #1 cancelled."));
    let reply = dispatch_control(&desk.trades, &desk.buy_orders, &ctx(SELLER), "trade:1:cancel").await.unwrap();
    assert_eq!(reply.text(), "This button is no longer active.");

    for garbage in ["trade:0:cancel", "trade:1:done", "sell:1:cancel", ""] {
        let reply = dispatch_control(&desk.trades, &desk.buy_orders, &ctx(SELLER), garbage).await.unwrap();
        assert_eq!(reply.text(), format!("This button is not recognised. Invalid identifier: {garbage}"));
    }
    let reply = dispatch_control(&desk.trades, &desk.buy_orders, &ctx(SELLER), "buy:7:done").await.unwrap();
    assert_eq!(reply.text(), "Buy order #7 was not found.");
}
