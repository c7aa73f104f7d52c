#![allow(dead_code)]
use trade_engine::{
    db_types::{ChannelKind, NewUser, Snowflake},
    test_utils::{fake_gateway::FakeGateway, prepare_env::new_test_db},
    BuyOrderFlowApi,
    Caller,
    FlowConfig,
    GuildManagement,
    InvocationContext,
    SqliteDatabase,
    TradeFlowApi,
    UserManagement,
};

pub const GUILD: &str = "10";
pub const SELLER: &str = "42";
pub const BUYER: &str = "43";

pub struct TestDesk {
    pub db: SqliteDatabase,
    pub gateway: FakeGateway,
    pub trades: TradeFlowApi<SqliteDatabase, FakeGateway>,
    pub buy_orders: BuyOrderFlowApi<SqliteDatabase, FakeGateway>,
}

impl TestDesk {
    pub async fn new(channel: Option<(&str, ChannelKind)>) -> Self {
        Self::with_gateway(channel, FakeGateway::new(), FlowConfig::default()).await
    }

    pub async fn with_gateway(channel: Option<(&str, ChannelKind)>, gateway: FakeGateway, config: FlowConfig) -> Self {
        let db = new_test_db().await;
        db.upsert_guild(&GUILD.into(), "Hangar").await.expect("Error creating guild");
        if let Some((channel, kind)) = channel {
            db.set_trade_channel(&GUILD.into(), &channel.into(), kind).await.expect("Error setting channel");
        }
        for (id, name) in [(SELLER, "alice"), (BUYER, "bob")] {
            let user = NewUser::new(id.into(), name).with_display_name(format!("{name} the trader"));
            db.upsert_user(user).await.expect("Error creating user");
        }
        let trades = TradeFlowApi::new(db.clone(), gateway.clone(), config.clone());
        let buy_orders = BuyOrderFlowApi::new(db.clone(), gateway.clone(), config);
        Self { db, gateway, trades, buy_orders }
    }
}

pub fn ctx(user: &str) -> InvocationContext {
    ctx_in(GUILD, user)
}

pub fn ctx_in(guild: &str, user: &str) -> InvocationContext {
    InvocationContext::new(Snowflake::from(guild), Caller::new(Snowflake::from(user), format!("user{user}")))
}
