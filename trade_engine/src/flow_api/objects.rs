use log::*;

use crate::{
    db_types::{NewUser, Snowflake},
    render::ControlView,
};

pub const DEFAULT_LINK_HOST: &str = "discord.com";

/// Who is invoking a command, as resolved by the transport layer.
#[derive(Debug, Clone, Default)]
pub struct Caller {
    pub user_id: Snowflake,
    pub username: String,
    pub display_name: Option<String>,
    pub discriminator: Option<String>,
    pub roles: Vec<Snowflake>,
    /// The caller's permission bit set in the guild.
    pub permissions: u64,
}

impl Caller {
    pub fn new<S: Into<String>>(user_id: Snowflake, username: S) -> Self {
        Self { user_id, username: username.into(), ..Default::default() }
    }

    pub fn with_roles(mut self, roles: Vec<Snowflake>) -> Self {
        self.roles = roles;
        self
    }

    pub fn with_permissions(mut self, permissions: u64) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn display(&self) -> &str {
        self.display_name.as_deref().unwrap_or(self.username.as_str())
    }

    pub fn as_new_user(&self) -> NewUser {
        NewUser {
            id: self.user_id.clone(),
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            discriminator: self.discriminator.clone(),
        }
    }
}

/// A command invocation inside a guild.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub guild_id: Snowflake,
    pub caller: Caller,
}

impl InvocationContext {
    pub fn new(guild_id: Snowflake, caller: Caller) -> Self {
        Self { guild_id, caller }
    }
}

#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Skip every call to the announcement gateway. Records are still persisted.
    pub offline: bool,
    /// Host used in announcement links.
    pub link_host: String,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self { offline: false, link_host: DEFAULT_LINK_HOST.to_string() }
    }
}

/// Best-effort failures collected while synchronizing an announcement. They are reported in this fixed order.
#[derive(Debug, Clone, Default)]
pub struct SyncWarnings {
    pub announcement: Option<String>,
    pub metadata: Option<String>,
    pub thread: Option<String>,
}

impl SyncWarnings {
    pub fn into_lines(self) -> Vec<String> {
        [
            self.announcement.map(|e| format!("⚠️ Could not update the announcement: {e}")),
            self.metadata.map(|e| format!("⚠️ Could not clear the announcement buttons: {e}")),
            self.thread.map(|e| format!("⚠️ Could not update the announcement thread: {e}")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// The text and buttons sent back to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub lines: Vec<String>,
    pub controls: Vec<ControlView>,
}

impl Reply {
    pub fn new<S: Into<String>>(line: S) -> Self {
        Self { lines: vec![line.into()], controls: Vec::new() }
    }

    pub fn line<S: Into<String>>(mut self, line: S) -> Self {
        self.lines.push(line.into());
        self
    }

    pub fn maybe_line(mut self, line: Option<String>) -> Self {
        self.lines.extend(line);
        self
    }

    pub fn lines(mut self, lines: Vec<String>) -> Self {
        self.lines.extend(lines);
        self
    }

    pub fn with_controls(mut self, controls: Vec<ControlView>) -> Self {
        self.controls = controls;
        self
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }
}

/// The reply for an unexpected failure. The details only go to the log.
pub fn generic_failure(e: &dyn std::error::Error) -> Reply {
    error!("🔄️ Command failed: {e}");
    Reply::new("Something went wrong while processing that command. Please try again later.")
}
