use thiserror::Error;

use crate::{db_types::Snowflake, render::AnnouncementView};

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("The forum requires a tag on new posts")]
    TagRequired,
    #[error("The channel or message no longer exists")]
    NotFound,
    #[error("The request was rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Could not reach the remote service: {0}")]
    Transport(String),
}

/// Where an announcement landed. For forum posts, `channel_id` is the thread and `message_id` its starter message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedAnnouncement {
    pub channel_id: Snowflake,
    pub message_id: Snowflake,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadPatch {
    pub name: Option<String>,
    pub archived: Option<bool>,
    pub locked: Option<bool>,
}

/// Remote announcement primitives. The tag-fallback policy for forum posts is not the gateway's concern; see
/// [`crate::announcements`].
#[allow(async_fn_in_trait)]
pub trait AnnouncementGateway {
    /// Posts a plain message to a text channel.
    async fn post_message(
        &self,
        channel: &Snowflake,
        view: &AnnouncementView,
    ) -> Result<PostedAnnouncement, GatewayError>;

    /// Starts a thread in a forum channel whose starter message carries the view.
    async fn create_forum_thread(
        &self,
        forum: &Snowflake,
        view: &AnnouncementView,
        tags: &[Snowflake],
    ) -> Result<PostedAnnouncement, GatewayError>;

    /// Tags available on a forum channel, in the order the forum lists them.
    async fn fetch_forum_tags(&self, forum: &Snowflake) -> Result<Vec<Snowflake>, GatewayError>;

    async fn patch_message(
        &self,
        channel: &Snowflake,
        message: &Snowflake,
        view: &AnnouncementView,
    ) -> Result<(), GatewayError>;

    async fn patch_thread(&self, thread: &Snowflake, patch: &ThreadPatch) -> Result<(), GatewayError>;
}
