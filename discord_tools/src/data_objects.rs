//! Wire types for the Discord REST API and the interactions webhook.
//!
//! Only the fields the trade desk reads or writes are modelled. Unknown fields are ignored on deserialization, and
//! optional fields are omitted on serialization so that PATCH requests only touch what they name.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

//--------------------------------------     Messages     ---------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedImage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EmbedImage {
    pub url: String,
}

pub const COMPONENT_ACTION_ROW: u8 = 1;
pub const COMPONENT_BUTTON: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
}

impl From<ButtonStyle> for u8 {
    fn from(style: ButtonStyle) -> Self {
        match style {
            ButtonStyle::Primary => 1,
            ButtonStyle::Secondary => 2,
            ButtonStyle::Success => 3,
            ButtonStyle::Danger => 4,
        }
    }
}

impl TryFrom<u8> for ButtonStyle {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Primary),
            2 => Ok(Self::Secondary),
            3 => Ok(Self::Success),
            4 => Ok(Self::Danger),
            v => Err(format!("Unsupported button style {v}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Button {
    #[serde(rename = "type")]
    pub kind: u8,
    pub style: ButtonStyle,
    pub label: String,
    pub custom_id: String,
}

impl Button {
    pub fn new<L: Into<String>, I: Into<String>>(style: ButtonStyle, label: L, custom_id: I) -> Self {
        Self { kind: COMPONENT_BUTTON, style, label: label.into(), custom_id: custom_id.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionRow {
    #[serde(rename = "type")]
    pub kind: u8,
    pub components: Vec<Button>,
}

impl ActionRow {
    /// Discord allows at most five buttons per row.
    pub const MAX_BUTTONS: usize = 5;

    pub fn new(components: Vec<Button>) -> Self {
        Self { kind: COMPONENT_ACTION_ROW, components }
    }

    /// Packs buttons into as many rows as needed.
    pub fn rows_for(buttons: Vec<Button>) -> Vec<Self> {
        buttons.chunks(Self::MAX_BUTTONS).map(|chunk| Self::new(chunk.to_vec())).collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AllowedMentions {
    pub parse: Vec<String>,
}

impl AllowedMentions {
    pub fn users_only() -> Self {
        Self { parse: vec!["users".to_string()] }
    }
}

/// Body for creating or editing a message.
///
/// `components` is always serialized (an empty list removes existing buttons on edit), while `content` is omitted when
/// `None` so that an edit keeps the previous text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MessagePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub embeds: Vec<Embed>,
    #[serde(default)]
    pub components: Vec<ActionRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_mentions: Option<AllowedMentions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
}

//--------------------------------------     Channels     ---------------------------------------------------------

pub const CHANNEL_GUILD_TEXT: u8 = 0;
pub const CHANNEL_PUBLIC_THREAD: u8 = 11;
pub const CHANNEL_GUILD_FORUM: u8 = 15;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ForumTag {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub moderated: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub available_tags: Vec<ForumTag>,
}

/// The response to starting a forum thread: the thread channel, plus its starter message.
#[derive(Debug, Clone, Deserialize)]
pub struct ForumThread {
    #[serde(flatten)]
    pub channel: Channel,
    #[serde(default)]
    pub message: Option<Message>,
}

impl ForumThread {
    /// The starter message of a forum thread shares its id with the thread itself, so fall back to that when the
    /// response omits the message.
    pub fn starter_message_id(&self) -> &str {
        self.message.as_ref().map(|m| m.id.as_str()).unwrap_or(self.channel.id.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StartForumThread {
    pub name: String,
    pub message: MessagePayload,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub applied_tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ModifyChannel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Guild {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<u64>,
    #[serde(default)]
    pub message: String,
}

//--------------------------------------   Interactions   ---------------------------------------------------------

pub const INTERACTION_PING: u8 = 1;
pub const INTERACTION_APPLICATION_COMMAND: u8 = 2;
pub const INTERACTION_MESSAGE_COMPONENT: u8 = 3;

pub const RESPONSE_PONG: u8 = 1;
pub const RESPONSE_CHANNEL_MESSAGE: u8 = 4;

/// Message flag that makes an interaction reply visible only to the caller.
pub const FLAG_EPHEMERAL: u64 = 1 << 6;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub discriminator: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    /// Permission bit set, serialized by Discord as a decimal string.
    #[serde(default)]
    pub permissions: Option<String>,
}

pub const OPTION_SUB_COMMAND: u8 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolvedData {
    #[serde(default)]
    pub attachments: HashMap<String, Attachment>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionData {
    /// Command name for application commands
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub options: Vec<CommandOption>,
    #[serde(default)]
    pub resolved: Option<ResolvedData>,
    /// Set for message components
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default)]
    pub component_type: Option<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Interaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub member: Option<Member>,
    /// Only present for interactions in DMs
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub data: Option<InteractionData>,
}

impl Interaction {
    /// The invoking user, whether the interaction came from a guild or a DM.
    pub fn caller(&self) -> Option<&User> {
        self.member.as_ref().and_then(|m| m.user.as_ref()).or(self.user.as_ref())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<MessagePayload>,
}

impl InteractionResponse {
    pub fn pong() -> Self {
        Self { kind: RESPONSE_PONG, data: None }
    }

    pub fn message(data: MessagePayload) -> Self {
        Self { kind: RESPONSE_CHANNEL_MESSAGE, data: Some(data) }
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn edit_payload_omits_content_but_keeps_components() {
        let payload = MessagePayload { content: None, embeds: vec![Embed::default()], ..Default::default() };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value, json!({ "embeds": [{}], "components": [] }));
    }

    #[test]
    fn buttons_serialize_with_numeric_types() {
        let rows = ActionRow::rows_for(vec![Button::new(ButtonStyle::Danger, "Cancel", "trade:4:cancel")]);
        let value = serde_json::to_value(&rows).unwrap();
        assert_eq!(
            value,
            json!([{ "type": 1, "components": [{ "type": 2, "style": 4, "label": "Cancel", "custom_id": "trade:4:cancel" }] }])
        );
    }

    #[test]
    fn rows_hold_at_most_five_buttons() {
        let buttons = (0..7).map(|i| Button::new(ButtonStyle::Primary, format!("b{i}"), format!("id{i}"))).collect();
        let rows = ActionRow::rows_for(buttons);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].components.len(), 5);
        assert_eq!(rows[1].components.len(), 2);
    }

    #[test]
    fn thread_archive_patch_only_names_given_fields() {
        let patch = ModifyChannel { archived: Some(true), locked: Some(true), ..Default::default() };
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({ "archived": true, "locked": true }));
    }

    #[test]
    fn forum_thread_starter_message_falls_back_to_thread_id() {
        let thread: ForumThread = serde_json::from_value(json!({ "id": "900", "type": 11 })).unwrap();
        assert_eq!(thread.starter_message_id(), "900");
        let thread: ForumThread =
            serde_json::from_value(json!({ "id": "900", "type": 11, "message": { "id": "901", "channel_id": "900" } }))
                .unwrap();
        assert_eq!(thread.starter_message_id(), "901");
    }

    #[test]
    fn interaction_caller_prefers_member_user() {
        let interaction: Interaction = serde_json::from_value(json!({
            "id": "1",
            "type": 2,
            "token": "t",
            "guild_id": "10",
            "member": { "user": { "id": "42", "username": "alice" }, "roles": ["7"], "permissions": "8" },
            "data": { "name": "trade", "options": [] }
        }))
        .unwrap();
        assert_eq!(interaction.caller().map(|u| u.id.as_str()), Some("42"));
        assert_eq!(interaction.member.unwrap().roles, vec!["7".to_string()]);
    }
}
