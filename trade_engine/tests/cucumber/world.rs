use cucumber::World;
use log::*;
use trade_engine::{
    db_types::Snowflake,
    test_utils::{
        fake_gateway::FakeGateway,
        prepare_env::{create_database, random_db_path},
    },
    BuyOrderFlowApi,
    Caller,
    FlowConfig,
    GuildManagement,
    InvocationContext,
    Reply,
    SqliteDatabase,
    TradeFlowApi,
};

pub const GUILD: &str = "10";

#[derive(Default, Debug, World)]
pub struct TradeDeskWorld {
    pub system: Option<DeskSystem>,
    pub last_reply: Option<Reply>,
}

#[derive(Debug)]
pub struct DeskSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub gateway: FakeGateway,
    pub trades: TradeFlowApi<SqliteDatabase, FakeGateway>,
    pub buy_orders: BuyOrderFlowApi<SqliteDatabase, FakeGateway>,
}

impl DeskSystem {
    pub async fn new() -> Self {
        let db_path = random_db_path();
        create_database(&db_path).await;
        let db = SqliteDatabase::new_with_url(&db_path, 1).await.expect("Error creating connection to database");
        db.upsert_guild(&GUILD.into(), "Hangar").await.expect("Error creating guild");
        debug!("🚀️ Created database: {db_path}");
        let gateway = FakeGateway::new();
        let trades = TradeFlowApi::new(db.clone(), gateway.clone(), FlowConfig::default());
        let buy_orders = BuyOrderFlowApi::new(db.clone(), gateway.clone(), FlowConfig::default());
        Self { db_path, db, gateway, trades, buy_orders }
    }
}

impl TradeDeskWorld {
    pub fn system(&self) -> &DeskSystem {
        self.system.as_ref().expect("Trade desk not initialised")
    }

    pub fn reply(&self) -> &Reply {
        self.last_reply.as_ref().expect("No command has been run yet")
    }
}

pub fn ctx(user: &str) -> InvocationContext {
    InvocationContext::new(Snowflake::from(GUILD), Caller::new(Snowflake::from(user), format!("user{user}")))
}
