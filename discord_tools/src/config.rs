use std::time::Duration;

use auec_common::Secret;
use log::*;

pub const DEFAULT_DISCORD_API_URL: &str = "https://discord.com/api/v10";
pub const DEFAULT_DISCORD_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct DiscordConfig {
    /// Base URL of the REST API, without a trailing slash.
    pub api_url: String,
    pub bot_token: Secret<String>,
    /// Applied to every REST request. Discord calls are best-effort, so they must never hang a handler.
    pub timeout: Duration,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_DISCORD_API_URL.to_string(),
            bot_token: Secret::default(),
            timeout: DEFAULT_DISCORD_TIMEOUT,
        }
    }
}

impl DiscordConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("TB_DISCORD_API_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| {
                debug!("TB_DISCORD_API_URL not set, using {DEFAULT_DISCORD_API_URL}");
                DEFAULT_DISCORD_API_URL.to_string()
            });
        let bot_token = Secret::from(std::env::var("TB_DISCORD_BOT_TOKEN").unwrap_or_default());
        if bot_token.is_blank() {
            warn!("TB_DISCORD_BOT_TOKEN not set. Announcements cannot be delivered without it.");
        }
        let timeout = std::env::var("TB_DISCORD_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("Invalid configuration value for TB_DISCORD_TIMEOUT_SECS. {e}"))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_DISCORD_TIMEOUT);
        Self { api_url, bot_token, timeout }
    }
}
