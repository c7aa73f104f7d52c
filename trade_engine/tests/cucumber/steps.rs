use cucumber::{given, then, when};
use trade_engine::{
    db_types::{BuyOrderStatus, ChannelKind, TradeStatus},
    dispatch_control,
    BuyOrderManagement,
    DoneAmount,
    GuildManagement,
    TradeManagement,
};

use super::world::{ctx, DeskSystem, TradeDeskWorld, GUILD};

#[given("a trade desk without a trade channel")]
async fn desk_without_channel(world: &mut TradeDeskWorld) {
    world.system = Some(DeskSystem::new().await);
}

#[given(expr = "a trade desk with a {word} trade channel {word}")]
async fn desk_with_channel(world: &mut TradeDeskWorld, kind: String, channel: String) {
    let system = DeskSystem::new().await;
    let kind = kind.parse::<ChannelKind>().expect("Not a channel kind");
    system.db.set_trade_channel(&GUILD.into(), &channel.into(), kind).await.expect("Error setting channel");
    world.system = Some(system);
}

#[when(expr = "user {word} lists {string} for {int} aUEC with {int} in stock")]
async fn list_trade(world: &mut TradeDeskWorld, user: String, title: String, price: i64, stock: i64) {
    let reply = world.system().trades.create_trade(&ctx(&user), &title, price, Some(stock), None).await;
    world.last_reply = Some(reply.expect("Error creating trade"));
}

#[when(expr = "user {word} posts a buy order for {string} at {int} aUEC")]
async fn post_buy_order(world: &mut TradeDeskWorld, user: String, item: String, price: i64) {
    let reply = world.system().buy_orders.create_buy_order(&ctx(&user), &item, price, None, None).await;
    world.last_reply = Some(reply.expect("Error creating buy order"));
}

#[when(expr = "user {word} sells {int} of trade {int}")]
async fn sell(world: &mut TradeDeskWorld, user: String, amount: i64, id: i64) {
    let reply = world.system().trades.done(&ctx(&user), id, DoneAmount::Units(amount)).await;
    world.last_reply = Some(reply.expect("Error recording sale"));
}

#[when(expr = "user {word} discounts trade {int} by {int}%")]
async fn discount(world: &mut TradeDeskWorld, user: String, id: i64, percent: i64) {
    let reply = world.system().trades.discount(&ctx(&user), id, Some(percent)).await;
    world.last_reply = Some(reply.expect("Error applying discount"));
}

#[when(expr = "user {word} cancels trade {int}")]
async fn cancel(world: &mut TradeDeskWorld, user: String, id: i64) {
    let reply = world.system().trades.cancel(&ctx(&user), id, None).await;
    world.last_reply = Some(reply.expect("Error cancelling trade"));
}

#[when(expr = "user {word} presses {string}")]
async fn press(world: &mut TradeDeskWorld, user: String, custom_id: String) {
    let system = world.system();
    let reply = dispatch_control(&system.trades, &system.buy_orders, &ctx(&user), &custom_id).await;
    world.last_reply = Some(reply.expect("Error handling button"));
}

#[then(expr = "the reply contains {string}")]
async fn reply_contains(world: &mut TradeDeskWorld, needle: String) {
    let reply = world.reply();
    assert!(reply.contains(&needle), "Reply was: {}", reply.text());
}

#[then(expr = "the reply offers {int} button(s)")]
async fn reply_buttons(world: &mut TradeDeskWorld, count: usize) {
    assert_eq!(world.reply().controls.len(), count);
}

#[then(expr = "trade {int} has {int} in stock and is {word}")]
async fn trade_state(world: &mut TradeDeskWorld, id: i64, stock: i64, status: String) {
    let trade = world.system().db.fetch_trade(id).await.expect("Error fetching trade").expect("No such trade");
    assert_eq!(trade.stock, stock);
    assert_eq!(trade.status, status.parse::<TradeStatus>().expect("Not a trade status"));
}

#[then(expr = "trade {int} sells for {int} aUEC")]
async fn trade_price(world: &mut TradeDeskWorld, id: i64, price: i64) {
    let trade = world.system().db.fetch_trade(id).await.expect("Error fetching trade").expect("No such trade");
    assert_eq!(trade.final_price().value(), price);
}

#[then(expr = "trade {int} has no buttons")]
async fn trade_without_controls(world: &mut TradeDeskWorld, id: i64) {
    let trade = world.system().db.fetch_trade(id).await.expect("Error fetching trade").expect("No such trade");
    assert!(!trade.has_controls(), "{:?}", trade.controls());
}

#[then(expr = "buy order {int} is {word} without an announcement")]
async fn buy_order_state(world: &mut TradeDeskWorld, id: i64, status: String) {
    let db = &world.system().db;
    let order = db.fetch_buy_order(id).await.expect("Error fetching buy order").expect("No such buy order");
    assert_eq!(order.status, status.parse::<BuyOrderStatus>().expect("Not a buy order status"));
    assert!(order.announcement_channel_id.is_none());
}

#[then(expr = "the announcement was updated {int} time(s)")]
async fn announcement_patches(world: &mut TradeDeskWorld, count: usize) {
    assert_eq!(world.system().gateway.patched_messages().len(), count);
}
