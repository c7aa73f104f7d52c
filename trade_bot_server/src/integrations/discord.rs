//! The production [`AnnouncementGateway`] and [`GuildDirectory`], backed by the Discord REST API.
use discord_tools::{
    data_objects::{
        ActionRow,
        AllowedMentions,
        Button,
        ButtonStyle,
        Embed,
        EmbedField,
        EmbedFooter,
        EmbedImage,
        MessagePayload,
        ModifyChannel,
        StartForumThread,
    },
    DiscordApi,
    DiscordApiError,
    TAG_REQUIRED_ERROR_CODE,
    UNKNOWN_CHANNEL_ERROR_CODE,
};
use log::*;
use trade_engine::{
    control_id::ControlAction,
    db_types::Snowflake,
    render::{AnnouncementView, ControlView, EmbedView},
    traits::{GatewayError, GuildMetadata, PostedAnnouncement, ThreadPatch},
    AnnouncementGateway,
    GuildDirectory,
};

#[derive(Clone)]
pub struct DiscordGateway {
    api: DiscordApi,
}

impl DiscordGateway {
    pub fn new(api: DiscordApi) -> Self {
        Self { api }
    }
}

pub fn gateway_error(e: DiscordApiError) -> GatewayError {
    match e {
        e if e.error_code() == Some(TAG_REQUIRED_ERROR_CODE) => GatewayError::TagRequired,
        e if e.is_not_found() || e.error_code() == Some(UNKNOWN_CHANNEL_ERROR_CODE) => GatewayError::NotFound,
        DiscordApiError::QueryError { status, message, .. } => GatewayError::Rejected { status, message },
        e => GatewayError::Transport(e.to_string()),
    }
}

fn button_style(action: ControlAction) -> ButtonStyle {
    match action {
        a if a.is_cancel() => ButtonStyle::Danger,
        ControlAction::TradeDoneOne => ButtonStyle::Primary,
        _ => ButtonStyle::Success,
    }
}

pub fn action_rows(controls: &[ControlView]) -> Vec<ActionRow> {
    let buttons = controls.iter().map(|c| Button::new(button_style(c.action), c.label, c.custom_id.as_str())).collect();
    ActionRow::rows_for(buttons)
}

fn embed(view: &EmbedView) -> Embed {
    Embed {
        title: Some(view.title.clone()),
        description: None,
        color: Some(view.color),
        fields: view
            .fields
            .iter()
            .map(|f| EmbedField { name: f.name.clone(), value: f.value.clone(), inline: f.inline })
            .collect(),
        footer: Some(EmbedFooter { text: view.footer.clone() }),
        image: view.image_url.as_ref().map(|url| EmbedImage { url: url.clone() }),
    }
}

/// The full message for an announcement. Buttons are always sent, so a view without controls removes them.
pub fn message_payload(view: &AnnouncementView) -> MessagePayload {
    MessagePayload {
        content: Some(view.content.clone()),
        embeds: vec![embed(&view.embed)],
        components: action_rows(&view.controls),
        allowed_mentions: Some(AllowedMentions::users_only()),
        flags: None,
    }
}

impl AnnouncementGateway for DiscordGateway {
    async fn post_message(
        &self,
        channel: &Snowflake,
        view: &AnnouncementView,
    ) -> Result<PostedAnnouncement, GatewayError> {
        let message = self.api.create_message(channel.as_str(), &message_payload(view)).await.map_err(gateway_error)?;
        Ok(PostedAnnouncement { channel_id: Snowflake::from(message.channel_id), message_id: Snowflake::from(message.id) })
    }

    async fn create_forum_thread(
        &self,
        forum: &Snowflake,
        view: &AnnouncementView,
        tags: &[Snowflake],
    ) -> Result<PostedAnnouncement, GatewayError> {
        let thread = StartForumThread {
            name: view.thread_name.clone(),
            message: message_payload(view),
            applied_tags: tags.iter().map(|t| t.to_string()).collect(),
        };
        let result = self.api.start_forum_thread(forum.as_str(), &thread).await.map_err(gateway_error)?;
        let message_id = Snowflake::from(result.starter_message_id().to_string());
        Ok(PostedAnnouncement { channel_id: Snowflake::from(result.channel.id), message_id })
    }

    async fn fetch_forum_tags(&self, forum: &Snowflake) -> Result<Vec<Snowflake>, GatewayError> {
        let channel = self.api.get_channel(forum.as_str()).await.map_err(gateway_error)?;
        trace!("📣️ Forum {forum} offers {} tag(s)", channel.available_tags.len());
        Ok(channel.available_tags.into_iter().map(|t| Snowflake::from(t.id)).collect())
    }

    async fn patch_message(
        &self,
        channel: &Snowflake,
        message: &Snowflake,
        view: &AnnouncementView,
    ) -> Result<(), GatewayError> {
        self.api.edit_message(channel.as_str(), message.as_str(), &message_payload(view)).await.map_err(gateway_error)?;
        Ok(())
    }

    async fn patch_thread(&self, thread: &Snowflake, patch: &ThreadPatch) -> Result<(), GatewayError> {
        let changes = ModifyChannel { name: patch.name.clone(), archived: patch.archived, locked: patch.locked };
        self.api.modify_channel(thread.as_str(), &changes).await.map_err(gateway_error)?;
        Ok(())
    }
}

impl GuildDirectory for DiscordGateway {
    async fn fetch_guild_metadata(&self, guild: &Snowflake) -> Result<Option<GuildMetadata>, GatewayError> {
        let guild = self.api.get_guild(guild.as_str()).await.map_err(gateway_error)?;
        Ok(guild.map(|g| GuildMetadata { id: Snowflake::from(g.id), name: g.name }))
    }
}
