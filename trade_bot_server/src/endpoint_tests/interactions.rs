use actix_web::{http::StatusCode, test, test::TestRequest, App};
use serde_json::{json, Value};
use trade_engine::{
    db_types::{ChannelKind, Snowflake},
    test_utils::{
        fake_gateway::{FakeGateway, GatewayCall},
        prepare_env::{drop_database, new_test_db},
    },
    traits::GuildMetadata,
    GuildManagement,
    TradeManagement,
    UserManagement,
};

use super::{
    helpers::{call, desk, signed, unsigned},
    mocks::MockDirectory,
};
use crate::routes::health;

const PING: &str = r#"{"id":"1","type":1,"token":"t"}"#;

fn command(user: &str, name: &str, sub: &str, options: Value) -> String {
    json!({
        "id": "100",
        "type": 2,
        "token": "t",
        "guild_id": "10",
        "channel_id": "500",
        "member": { "user": { "id": user, "username": "alice", "global_name": "Alice" }, "roles": [], "permissions": "0" },
        "data": { "name": name, "options": [{ "name": sub, "type": 1, "options": options }] }
    })
    .to_string()
}

fn button(user: &str, custom_id: &str) -> String {
    json!({
        "id": "101",
        "type": 3,
        "token": "t",
        "guild_id": "10",
        "member": { "user": { "id": user, "username": "alice" }, "roles": [], "permissions": "0" },
        "data": { "custom_id": custom_id, "component_type": 2 }
    })
    .to_string()
}

fn reply_content(body: &str) -> String {
    let value: Value = serde_json::from_str(body).expect("reply is not JSON");
    assert_eq!(value["type"], 4, "not a channel message: {body}");
    assert_eq!(value["data"]["flags"], 64, "reply is not ephemeral: {body}");
    value["data"]["content"].as_str().unwrap_or_default().to_string()
}

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init().ok();
    let service = test::init_service(App::new().service(health)).await;
    let res = test::call_service(&service, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(test::read_body(res).await.as_ref(), "👍️\n".as_bytes());
}

#[actix_web::test]
async fn unsigned_interactions_are_rejected() {
    let _ = env_logger::try_init().ok();
    let mut db = new_test_db().await;
    let gateway = FakeGateway::new();
    let (status, body) = call(desk(&db, &gateway, gateway.clone()), true, unsigned(PING)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Missing X-Signature-Ed25519 header"), "{body}");
    drop_database(&mut db).await;
}

#[actix_web::test]
async fn tampered_interactions_are_rejected() {
    let _ = env_logger::try_init().ok();
    let mut db = new_test_db().await;
    let gateway = FakeGateway::new();
    // Signed for a ping, but the body says otherwise
    let req = signed(PING).set_payload(r#"{"id":"1","type":2,"token":"t"}"#);
    let (status, _) = call(desk(&db, &gateway, gateway.clone()), true, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    drop_database(&mut db).await;
}

#[actix_web::test]
async fn ping_pong() {
    let _ = env_logger::try_init().ok();
    let mut db = new_test_db().await;
    let gateway = FakeGateway::new();
    let (status, body) = call(desk(&db, &gateway, gateway.clone()), true, signed(PING)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"type":1}"#);
    drop_database(&mut db).await;
}

#[actix_web::test]
async fn signature_checks_can_be_disabled() {
    let _ = env_logger::try_init().ok();
    let mut db = new_test_db().await;
    let gateway = FakeGateway::new();
    let (status, body) = call(desk(&db, &gateway, gateway.clone()), false, unsigned(PING)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"type":1}"#);
    drop_database(&mut db).await;
}

#[actix_web::test]
async fn malformed_and_unsupported_payloads() {
    let _ = env_logger::try_init().ok();
    let mut db = new_test_db().await;
    let gateway = FakeGateway::new();
    let (status, body) = call(desk(&db, &gateway, gateway.clone()), true, signed(r#"{"type":"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Payload deserialization error"), "{body}");
    let autocomplete = r#"{"id":"1","type":4,"token":"t"}"#;
    let (status, body) = call(desk(&db, &gateway, gateway.clone()), true, signed(autocomplete)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Unsupported interaction type 4"), "{body}");
    drop_database(&mut db).await;
}

#[actix_web::test]
async fn trade_round_trip() {
    let _ = env_logger::try_init().ok();
    let mut db = new_test_db().await;
    let guild = Snowflake::from("10");
    db.upsert_guild(&guild, "Hangar").await.unwrap();
    db.set_trade_channel(&guild, &Snowflake::from("500"), ChannelKind::Text).await.unwrap();
    let gateway = FakeGateway::new().with_guild("10", "Hangar");
    let desk = desk(&db, &gateway, gateway.clone());

    let create = command(
        "42",
        "trade",
        "create",
        json!([{ "name": "title", "type": 3, "value": "Ship" }, { "name": "price", "type": 4, "value": 5000 },
               { "name": "stock", "type": 4, "value": 2 }]),
    );
    let (status, body) = call(desk.clone(), true, signed(&create)).await;
    assert_eq!(status, StatusCode::OK);
    let content = reply_content(&body);
    assert!(content.contains("Trade #1 created: Ship for 5000 aUEC, 2 in stock."), "{content}");
    assert!(content.contains("Announcement: https://discord.com/channels/10/500/9000"), "{content}");
    assert!(matches!(gateway.calls().as_slice(), [GatewayCall::PostMessage { .. }]));

    let (status, body) = call(desk.clone(), true, signed(&button("42", "trade:1:done:one"))).await;
    assert_eq!(status, StatusCode::OK);
    let content = reply_content(&body);
    assert!(content.contains("Sale recorded for trade #1. 1 left in stock."), "{content}");
    let trade = db.fetch_trade(1).await.unwrap().unwrap();
    assert_eq!(trade.stock, 1);
    assert_eq!(gateway.patched_messages().len(), 1);

    // Someone else pressing the seller's button
    let (_, body) = call(desk.clone(), true, signed(&button("43", "trade:1:done:one"))).await;
    assert_eq!(reply_content(&body), "Trade #1 is not yours.");

    let user = db.fetch_user(&Snowflake::from("42")).await.unwrap().unwrap();
    assert_eq!(user.display(), "Alice");
    let history = sqlx::query_as::<_, (String, String)>(
        "SELECT command_name, options_json FROM command_history ORDER BY id",
    )
    .fetch_all(db.pool())
    .await
    .unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].0, "trade create");
    assert_eq!(serde_json::from_str::<Value>(&history[0].1).unwrap()["price"], 5000);
    assert_eq!(history[1].0, "button");
    drop_database(&mut db).await;
}

#[actix_web::test]
async fn buy_order_without_channel() {
    let _ = env_logger::try_init().ok();
    let mut db = new_test_db().await;
    let gateway = FakeGateway::new();
    let create = command(
        "42",
        "buy",
        "create",
        json!([{ "name": "item", "type": 3, "value": "Fighter" }, { "name": "price", "type": 4, "value": 200000 }]),
    );
    let (_, body) = call(desk(&db, &gateway, gateway.clone()), true, signed(&create)).await;
    let content = reply_content(&body);
    assert!(content.contains("Buy order #1 created"), "{content}");
    assert!(content.contains("No trade channel is configured"), "{content}");
    assert!(gateway.calls().is_empty());
    drop_database(&mut db).await;
}

#[actix_web::test]
async fn bad_commands_get_a_reply() {
    let _ = env_logger::try_init().ok();
    let mut db = new_test_db().await;
    let gateway = FakeGateway::new();
    let desk = desk(&db, &gateway, gateway.clone());
    let (status, body) = call(desk.clone(), true, signed(&command("42", "trade", "explode", json!([])))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply_content(&body), "I don't know the command `trade explode`.");
    let missing = command("42", "trade", "create", json!([{ "name": "title", "type": 3, "value": "Ship" }]));
    let (_, body) = call(desk.clone(), true, signed(&missing)).await;
    assert_eq!(reply_content(&body), "The `price` option is required.");
    let (_, body) = call(desk.clone(), true, signed(&button("42", "trade:x:explode"))).await;
    assert_eq!(reply_content(&body), "This button is not recognised. Invalid identifier: trade:x:explode");
    drop_database(&mut db).await;
}

#[actix_web::test]
async fn direct_messages_are_refused() {
    let _ = env_logger::try_init().ok();
    let mut db = new_test_db().await;
    let gateway = FakeGateway::new();
    let dm = json!({
        "id": "100",
        "type": 2,
        "token": "t",
        "user": { "id": "42", "username": "alice" },
        "data": { "name": "trade", "options": [{ "name": "list", "type": 1, "options": [] }] }
    })
    .to_string();
    let (_, body) = call(desk(&db, &gateway, gateway.clone()), true, signed(&dm)).await;
    assert_eq!(reply_content(&body), "The trade desk only works inside a server.");
    // The invocation is still audited, without a guild
    let guild: Option<String> = sqlx::query_scalar("SELECT guild_id FROM command_history").fetch_one(db.pool()).await.unwrap();
    assert_eq!(guild, None);
    drop_database(&mut db).await;
}

#[actix_web::test]
async fn administration_requires_access() {
    let _ = env_logger::try_init().ok();
    let mut db = new_test_db().await;
    let gateway = FakeGateway::new();
    let desk = desk(&db, &gateway, gateway.clone());
    let set_channel = command("42", "tradeconfig", "channel", json!([{ "name": "channel", "type": 7, "value": "500" }]));
    let (_, body) = call(desk.clone(), true, signed(&set_channel)).await;
    assert!(reply_content(&body).starts_with("You need the administrator permission"));

    let admin = json!({
        "id": "100",
        "type": 2,
        "token": "t",
        "guild_id": "10",
        "member": { "user": { "id": "42", "username": "alice" }, "roles": [], "permissions": "8" },
        "data": { "name": "tradeconfig", "options": [{ "name": "channel", "type": 1, "options": [
            { "name": "channel", "type": 7, "value": "500" }, { "name": "type", "type": 3, "value": "forum" }
        ]}]}
    })
    .to_string();
    let (_, body) = call(desk.clone(), true, signed(&admin)).await;
    assert_eq!(reply_content(&body), "Trade announcements will be posted in <#500> (forum).");
    let guild = db.fetch_guild(&Snowflake::from("10")).await.unwrap().unwrap();
    assert_eq!(guild.trade_channel(), Some((&Snowflake::from("500"), ChannelKind::Forum)));
    drop_database(&mut db).await;
}

#[actix_web::test]
async fn guild_names_are_fetched_once() {
    let _ = env_logger::try_init().ok();
    let mut db = new_test_db().await;
    let gateway = FakeGateway::new();
    let mut directory = MockDirectory::new();
    directory
        .expect_fetch_guild_metadata()
        .times(1)
        .returning(|id| Ok(Some(GuildMetadata { id: id.clone(), name: "Hangar".into() })));
    let desk = desk(&db, &gateway, directory);
    for _ in 0..2 {
        let (status, _) = call(desk.clone(), true, signed(&command("42", "trade", "list", json!([])))).await;
        assert_eq!(status, StatusCode::OK);
    }
    let guild = db.fetch_guild(&Snowflake::from("10")).await.unwrap().unwrap();
    assert_eq!(guild.name, "Hangar");
    drop_database(&mut db).await;
}
