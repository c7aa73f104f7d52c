use std::{env, time::Duration};

use discord_tools::DiscordConfig;
use ed25519_dalek::{VerifyingKey, PUBLIC_KEY_LENGTH};
use log::*;
use trade_engine::{db_url, guild_cache::CachePolicy, FlowConfig, DEFAULT_LINK_HOST};

use crate::errors::ServerError;

const DEFAULT_TB_HOST: &str = "127.0.0.1";
const DEFAULT_TB_PORT: u16 = 8370;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub discord: DiscordConfig,
    /// The application's Ed25519 public key. Interactions are signed with the matching private key.
    pub public_key: Option<VerifyingKey>,
    /// If false, interaction signatures are not checked at all. **DANGER**: local testing only.
    pub signature_checks: bool,
    /// If true, records are persisted but nothing is posted to or patched on Discord.
    pub offline: bool,
    pub link_host: String,
    pub guild_cache: CachePolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_TB_HOST.to_string(),
            port: DEFAULT_TB_PORT,
            database_url: String::default(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            discord: DiscordConfig::default(),
            public_key: None,
            signature_checks: true,
            offline: false,
            link_host: DEFAULT_LINK_HOST.to_string(),
            guild_cache: CachePolicy::Forever,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("TB_HOST").ok().unwrap_or_else(|| DEFAULT_TB_HOST.into());
        let port = env::var("TB_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("🪛️ {s} is not a valid port for TB_PORT. {e} Using the default, {DEFAULT_TB_PORT}, instead.");
                    DEFAULT_TB_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_TB_PORT);
        let database_url = db_url();
        let db_max_connections = env::var("TB_DB_MAX_CONNECTIONS")
            .map(|s| {
                s.parse::<u32>().ok().filter(|n| *n > 0).unwrap_or_else(|| {
                    warn!(
                        "🪛️ {s} is not a valid pool size for TB_DB_MAX_CONNECTIONS. Using the default, \
                         {DEFAULT_DB_MAX_CONNECTIONS}, instead."
                    );
                    DEFAULT_DB_MAX_CONNECTIONS
                })
            })
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);
        let discord = DiscordConfig::new_from_env_or_default();
        let public_key = match env::var("TB_DISCORD_PUBLIC_KEY") {
            Ok(s) => parse_public_key(&s)
                .map_err(|e| error!("🪛️ TB_DISCORD_PUBLIC_KEY is invalid. {e}"))
                .ok(),
            Err(_) => {
                error!("🪛️ TB_DISCORD_PUBLIC_KEY is not set. Please set it to your Discord application's public key.");
                None
            },
        };
        let signature_checks = env::var("TB_SIGNATURE_CHECKS").map(|s| &s != "0" && &s != "false").unwrap_or(true);
        if !signature_checks {
            warn!("🚨️ Interaction signature checks are DISABLED. Anyone can issue commands as anyone.");
        }
        let offline = env::var("TB_OFFLINE").map(|s| &s == "1" || &s == "true").unwrap_or(false);
        if offline {
            info!("🪛️ Offline mode is on. Announcements will not be posted.");
        }
        let link_host = env::var("TB_LINK_HOST").ok().unwrap_or_else(|| DEFAULT_LINK_HOST.into());
        let guild_cache = env::var("TB_GUILD_CACHE_TTL_SECS")
            .ok()
            .map(|s| parse_cache_policy(&s))
            .unwrap_or_default();
        info!("🪛️ Guild metadata cache policy: {guild_cache:?}");
        Self {
            host,
            port,
            database_url,
            db_max_connections,
            discord,
            public_key,
            signature_checks,
            offline,
            link_host,
            guild_cache,
        }
    }

    pub fn flow_config(&self) -> FlowConfig {
        FlowConfig { offline: self.offline, link_host: self.link_host.clone() }
    }
}

/// Decodes a hex-encoded Ed25519 public key, as shown on the Discord developer portal.
pub fn parse_public_key(hex_key: &str) -> Result<VerifyingKey, ServerError> {
    let bytes = hex::decode(hex_key.trim()).map_err(|e| ServerError::ConfigurationError(format!("Not hex. {e}")))?;
    let bytes: [u8; PUBLIC_KEY_LENGTH] = bytes.try_into().map_err(|b: Vec<u8>| {
        ServerError::ConfigurationError(format!("Expected {PUBLIC_KEY_LENGTH} bytes, got {}", b.len()))
    })?;
    VerifyingKey::from_bytes(&bytes).map_err(|e| ServerError::ConfigurationError(e.to_string()))
}

fn parse_cache_policy(s: &str) -> CachePolicy {
    match s.parse::<u64>() {
        Ok(0) => {
            warn!("🪛️ TB_GUILD_CACHE_TTL_SECS is 0. Guild names will be fetched on every command.");
            CachePolicy::Ttl(Duration::ZERO)
        },
        Ok(secs) => CachePolicy::Ttl(Duration::from_secs(secs)),
        Err(e) => {
            warn!("🪛️ {s} is not a valid TB_GUILD_CACHE_TTL_SECS value. {e}. Guild names will be cached forever.");
            CachePolicy::Forever
        },
    }
}

#[cfg(test)]
mod test {
    use ed25519_dalek::SigningKey;

    use super::*;

    #[test]
    fn public_key_from_hex() {
        let key = SigningKey::from_bytes(&[7u8; 32]).verifying_key();
        let parsed = parse_public_key(&hex::encode(key.as_bytes())).unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn bad_public_keys() {
        let err = parse_public_key("not hex").unwrap_err();
        assert!(err.to_string().contains("Not hex"));
        let err = parse_public_key("abcd").unwrap_err();
        assert!(err.to_string().contains("Expected 32 bytes, got 2"));
    }

    #[test]
    fn cache_policies() {
        assert_eq!(parse_cache_policy("300"), CachePolicy::Ttl(Duration::from_secs(300)));
        assert_eq!(parse_cache_policy("0"), CachePolicy::Ttl(Duration::ZERO));
        assert_eq!(parse_cache_policy("soon"), CachePolicy::Forever);
    }

    #[test]
    fn defaults() {
        let config = ServerConfig::new("0.0.0.0", 9000);
        assert_eq!(config.port, 9000);
        assert!(config.signature_checks);
        assert!(!config.offline);
        assert_eq!(config.db_max_connections, 25);
        assert_eq!(config.flow_config().link_host, "discord.com");
    }
}
