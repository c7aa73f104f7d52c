use actix_web::{
    http::{header::ContentType, StatusCode},
    test,
    test::TestRequest,
    web,
    App,
};
use ed25519_dalek::{Signer, SigningKey};
use log::debug;
use trade_engine::{
    guild_cache::{CachePolicy, GuildMetadataCache},
    test_utils::fake_gateway::FakeGateway,
    FlowConfig,
    GuildDirectory,
    SqliteDatabase,
};

use crate::{
    interactions::TradeDesk,
    middleware::SignatureMiddlewareFactory,
    routes::{health, InteractionsRoute},
    server::json_config,
};

pub const TIMESTAMP: &str = "1700000000";

// A throwaway key for signing test interactions. DO NOT re-use it anywhere.
pub fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[42u8; 32])
}

pub fn sign(body: &str) -> String {
    let message = format!("{TIMESTAMP}{body}");
    hex::encode(signing_key().sign(message.as_bytes()).to_bytes())
}

pub type TestDesk<D> = web::Data<TradeDesk<SqliteDatabase, FakeGateway, D>>;

pub fn desk<D: GuildDirectory>(db: &SqliteDatabase, gateway: &FakeGateway, directory: D) -> TestDesk<D> {
    let guilds = GuildMetadataCache::new(directory, CachePolicy::Forever);
    web::Data::new(TradeDesk::new(db.clone(), gateway.clone(), guilds, FlowConfig::default()))
}

/// A correctly signed interaction.
pub fn signed(body: &str) -> TestRequest {
    unsigned(body).insert_header(("X-Signature-Ed25519", sign(body))).insert_header(("X-Signature-Timestamp", TIMESTAMP))
}

pub fn unsigned(body: &str) -> TestRequest {
    TestRequest::post().uri("/interactions").insert_header(ContentType::json()).set_payload(body.to_string())
}

/// Sends the request through the same stack the server uses and returns the status and body. Middleware errors are
/// rendered the way the server would render them.
pub async fn call<D: GuildDirectory + 'static>(
    desk: TestDesk<D>,
    signature_checks: bool,
    req: TestRequest,
) -> (StatusCode, String) {
    let key = signing_key().verifying_key();
    let app = App::new().app_data(desk).app_data(json_config()).service(health).service(
        web::scope("/interactions")
            .wrap(SignatureMiddlewareFactory::new(Some(key), signature_checks))
            .service(InteractionsRoute::<SqliteDatabase, FakeGateway, D>::new()),
    );
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => (e.as_response_error().status_code(), e.to_string()),
    }
}
