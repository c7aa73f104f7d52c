mod support;

use serde_json::json;
use support::{ctx, TestDesk, BUYER, GUILD, SELLER};
use trade_engine::{
    db_types::{ChannelKind, NewUser, Snowflake, TagKind},
    guild_cache::{CachePolicy, GuildMetadataCache},
    test_utils::{fake_gateway::FakeGateway, prepare_env::new_test_db},
    Caller,
    GuildConfigApi,
    GuildManagement,
    IdentityApi,
    InvocationContext,
    SqliteDatabase,
    UserManagement,
};

fn admin() -> InvocationContext {
    let mut admin = ctx(SELLER);
    admin.caller = admin.caller.with_permissions(0x8);
    admin
}

async fn config_api() -> GuildConfigApi<SqliteDatabase> {
    let desk = TestDesk::new(None).await;
    GuildConfigApi::new(desk.db)
}

#[tokio::test]
async fn moderator_roles_are_idempotent() {
    let api = config_api().await;
    let role = Snowflake::from("700");
    let reply = api.add_moderator_role(&admin(), &role).await.unwrap();
    assert_eq!(reply.text(), "Added <@&700> as a moderator role.");
    let reply = api.add_moderator_role(&admin(), &role).await.unwrap();
    assert_eq!(reply.text(), "<@&700> is already a moderator role.");
    api.add_moderator_role(&admin(), &"701".into()).await.unwrap();
    let reply = api.moderator_roles(&admin()).await.unwrap();
    assert_eq!(reply.text(), "Moderator roles: <@&700>, <@&701>");

    let reply = api.remove_moderator_role(&admin(), &role).await.unwrap();
    assert_eq!(reply.text(), "Removed <@&700> from the moderator roles.");
    let reply = api.remove_moderator_role(&admin(), &role).await.unwrap();
    assert_eq!(reply.text(), "<@&700> is not a moderator role.");
    assert_eq!(api.db().moderator_roles(&GUILD.into()).await.unwrap(), vec![Snowflake::from("701")]);
}

#[tokio::test]
async fn configuration_requires_admin_access() {
    let api = config_api().await;
    let reply = api.set_channel(&ctx(BUYER), Some("500".into()), None).await.unwrap();
    assert_eq!(reply.text(), "You need the administrator permission or the admin role to do that.");
    assert!(api.db().fetch_guild(&GUILD.into()).await.unwrap().unwrap().trade_channel_id.is_none());

    api.set_admin_role(&admin(), Some("800".into())).await.unwrap();
    let mut role_holder = ctx(BUYER);
    role_holder.caller = role_holder.caller.with_roles(vec!["800".into()]);
    let reply = api.set_channel(&role_holder, Some("500".into()), Some(ChannelKind::Forum)).await.unwrap();
    assert_eq!(reply.text(), "Trade announcements will be posted in <#500> (forum).");
    let guild = api.db().fetch_guild(&GUILD.into()).await.unwrap().unwrap();
    assert_eq!(guild.trade_channel(), Some((&Snowflake::from("500"), ChannelKind::Forum)));

    let reply = api.set_channel(&admin(), None, None).await.unwrap();
    assert!(reply.contains("cleared"));
    let guild = api.db().fetch_guild(&GUILD.into()).await.unwrap().unwrap();
    assert!(guild.trade_channel().is_none());
    assert!(guild.trade_channel_type.is_none());
}

#[tokio::test]
async fn forum_tags_per_kind() {
    let api = config_api().await;
    api.add_forum_tag(&admin(), TagKind::Sell, &"55".into()).await.unwrap();
    let reply = api.add_forum_tag(&admin(), TagKind::Sell, &"55".into()).await.unwrap();
    assert_eq!(reply.text(), "Tag `55` is already applied to sell announcements.");
    api.add_forum_tag(&admin(), TagKind::Buy, &"56".into()).await.unwrap();
    let reply = api.forum_tags(&admin(), TagKind::Sell).await.unwrap();
    assert_eq!(reply.text(), "Forum tags for sell announcements: `55`");
    api.remove_forum_tag(&admin(), TagKind::Buy, &"56".into()).await.unwrap();
    let reply = api.forum_tags(&admin(), TagKind::Buy).await.unwrap();
    assert_eq!(reply.text(), "No forum tags are configured for buy announcements.");
}

#[tokio::test]
async fn invocations_keep_users_and_guilds_fresh() {
    let db = new_test_db().await;
    let directory = FakeGateway::new().with_guild("10", "Hangar 18");
    let identity = IdentityApi::new(db.clone(), GuildMetadataCache::new(directory, CachePolicy::Forever));

    let mut caller = Caller::new("42".into(), "alice");
    caller.display_name = Some("Alice".into());
    caller.discriminator = Some("0001".into());
    identity.record_invocation(Some(&"10".into()), &caller, "trade", json!({"subcommand": "list"})).await;
    identity.record_invocation(Some(&"11".into()), &caller, "trade", json!({})).await;

    assert_eq!(db.fetch_guild(&"10".into()).await.unwrap().unwrap().name, "Hangar 18");
    assert_eq!(db.fetch_guild(&"11".into()).await.unwrap().unwrap().name, "11");

    // A later invocation without the optional fields keeps what was stored
    identity.record_invocation(None, &Caller::new("42".into(), "alice_2"), "buy", json!({})).await;
    let user = db.fetch_user(&"42".into()).await.unwrap().unwrap();
    assert_eq!(user.username, "alice_2");
    assert_eq!(user.display_name.as_deref(), Some("Alice"));
    assert_eq!(user.discriminator.as_deref(), Some("0001"));

    let logged = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM command_history").fetch_one(db.pool()).await.unwrap();
    assert_eq!(logged, 3);
}

#[tokio::test]
async fn user_upserts_never_erase_names() {
    let db = new_test_db().await;
    db.upsert_user(NewUser::new("42".into(), "alice").with_display_name("Alice".into())).await.unwrap();
    let user = db.upsert_user(NewUser::new("42".into(), "alice")).await.unwrap();
    assert_eq!(user.display(), "Alice");
}
