use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
    StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::DiscordConfig,
    data_objects::{Channel, ErrorBody, ForumThread, Guild, Message, MessagePayload, ModifyChannel, StartForumThread},
    DiscordApiError,
};

const USER_AGENT: &str = concat!("DiscordBot (https://github.com/trade-desk, ", env!("CARGO_PKG_VERSION"), ")");

#[derive(Clone)]
pub struct DiscordApi {
    config: DiscordConfig,
    client: Arc<Client>,
}

impl DiscordApi {
    pub fn new(config: DiscordConfig) -> Result<Self, DiscordApiError> {
        let mut headers = HeaderMap::with_capacity(3);
        if config.bot_token.is_blank() {
            warn!("No bot token is configured. Discord will reject every REST call.");
        } else {
            let mut val = HeaderValue::from_str(format!("Bot {}", config.bot_token.reveal()).as_str())
                .map_err(|e| DiscordApiError::Initialization(e.to_string()))?;
            val.set_sensitive(true);
            headers.insert("Authorization", val);
        }
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        headers.insert("User-Agent", HeaderValue::from_static(USER_AGENT));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| DiscordApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, DiscordApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {method} {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(body);
        }
        let response = req.send().await.map_err(|e| DiscordApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| DiscordApiError::JsonError(e.to_string()))
        } else {
            let status = response.status();
            let text = response.text().await.map_err(|e| DiscordApiError::RestResponseError(e.to_string()))?;
            Err(query_error(status, &text))
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    pub async fn create_message(&self, channel_id: &str, message: &MessagePayload) -> Result<Message, DiscordApiError> {
        let path = format!("/channels/{channel_id}/messages");
        debug!("Posting message to channel {channel_id}");
        let result = self.rest_query::<Message, _>(Method::POST, &path, Some(message)).await?;
        info!("Posted message {} to channel {channel_id}", result.id);
        Ok(result)
    }

    pub async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        message: &MessagePayload,
    ) -> Result<Message, DiscordApiError> {
        let path = format!("/channels/{channel_id}/messages/{message_id}");
        debug!("Editing message {message_id} in channel {channel_id}");
        self.rest_query::<Message, _>(Method::PATCH, &path, Some(message)).await
    }

    /// Starts a thread in a forum channel. The thread's starter message carries the given message payload.
    pub async fn start_forum_thread(
        &self,
        forum_id: &str,
        thread: &StartForumThread,
    ) -> Result<ForumThread, DiscordApiError> {
        let path = format!("/channels/{forum_id}/threads");
        debug!("Starting thread '{}' in forum {forum_id}", thread.name);
        let result = self.rest_query::<ForumThread, _>(Method::POST, &path, Some(thread)).await?;
        info!("Started thread {} in forum {forum_id}", result.channel.id);
        Ok(result)
    }

    pub async fn modify_channel(&self, channel_id: &str, changes: &ModifyChannel) -> Result<Channel, DiscordApiError> {
        let path = format!("/channels/{channel_id}");
        debug!("Modifying channel {channel_id}: {changes:?}");
        self.rest_query::<Channel, _>(Method::PATCH, &path, Some(changes)).await
    }

    pub async fn get_channel(&self, channel_id: &str) -> Result<Channel, DiscordApiError> {
        let path = format!("/channels/{channel_id}");
        self.rest_query::<Channel, ()>(Method::GET, &path, None).await
    }

    /// Fetches the guild. A guild the bot cannot see yields `None` rather than an error.
    pub async fn get_guild(&self, guild_id: &str) -> Result<Option<Guild>, DiscordApiError> {
        let path = format!("/guilds/{guild_id}");
        match self.rest_query::<Guild, ()>(Method::GET, &path, None).await {
            Ok(guild) => Ok(Some(guild)),
            Err(e) if e.is_not_found() => {
                debug!("Guild {guild_id} was not found");
                Ok(None)
            },
            Err(e) => Err(e),
        }
    }
}

fn query_error(status: StatusCode, text: &str) -> DiscordApiError {
    let (code, message) = match serde_json::from_str::<ErrorBody>(text) {
        Ok(body) => (body.code, body.message),
        Err(_) => (None, text.to_string()),
    };
    warn!("Discord returned {status}. code: {code:?}. {message}");
    DiscordApiError::QueryError { status: status.as_u16(), code, message }
}
