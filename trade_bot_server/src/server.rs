use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use discord_tools::DiscordApi;
use log::*;
use trade_engine::{guild_cache::GuildMetadataCache, SqliteDatabase};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::discord::DiscordGateway,
    interactions::TradeDesk,
    middleware::SignatureMiddlewareFactory,
    routes::{health, InteractionsRoute},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    if config.signature_checks && config.public_key.is_none() {
        return Err(ServerError::ConfigurationError(
            "Signature checks are enabled, but TB_DISCORD_PUBLIC_KEY is missing or invalid.".into(),
        ));
    }
    let db = SqliteDatabase::new_with_url(&config.database_url, config.db_max_connections).await?;
    let api = DiscordApi::new(config.discord.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = DiscordGateway::new(api);
    let srv = create_server_instance(config, db, gateway)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: DiscordGateway,
) -> Result<Server, ServerError> {
    // One cache for all workers, so a guild name is fetched once per process rather than once per worker
    let guilds = GuildMetadataCache::new(gateway.clone(), config.guild_cache);
    let flow_config = config.flow_config();
    info!("🚀️ Trade desk configured: {flow_config:?}");
    let srv = HttpServer::new(move || {
        let desk = TradeDesk::new(db.clone(), gateway.clone(), guilds.clone(), flow_config.clone());
        let interactions_scope = web::scope("/interactions")
            .wrap(SignatureMiddlewareFactory::new(config.public_key, config.signature_checks))
            .service(InteractionsRoute::<SqliteDatabase, DiscordGateway, DiscordGateway>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("tb::access_log"))
            .app_data(web::Data::new(desk))
            .app_data(json_config())
            .service(health)
            .service(interactions_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Malformed payloads get the same JSON error body as every other transport failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ServerError::CouldNotDeserializePayload(err.to_string()).into())
}
