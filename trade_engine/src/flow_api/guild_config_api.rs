use std::fmt::Debug;

use log::*;

use super::{
    errors::{settle, Halt},
    helpers::{authorize, ensure_guild},
    FlowError,
    InvocationContext,
    Reply,
};
use crate::{
    access::AccessLevel,
    db_types::{ChannelKind, Snowflake, TagKind},
    traits::GuildManagement,
};

/// Per-guild configuration commands. Every operation requires admin access.
pub struct GuildConfigApi<B> {
    db: B,
}

impl<B> Debug for GuildConfigApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GuildConfigApi")
    }
}

fn role_mention(role: &Snowflake) -> String {
    format!("<@&{role}>")
}

fn channel_mention(channel: &Snowflake) -> String {
    format!("<#{channel}>")
}

impl<B> GuildConfigApi<B>
where B: GuildManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    async fn admin(&self, ctx: &InvocationContext) -> Result<(), Halt> {
        ensure_guild(&self.db, &ctx.guild_id).await?;
        authorize(&self.db, ctx, AccessLevel::Admin).await
    }

    /// Sets the announcement channel, or clears it when `channel` is `None`. The kind defaults to a text channel.
    pub async fn set_channel(
        &self,
        ctx: &InvocationContext,
        channel: Option<Snowflake>,
        kind: Option<ChannelKind>,
    ) -> Result<Reply, FlowError> {
        let result = async {
            self.admin(ctx).await?;
            let reply = match channel {
                Some(channel) => {
                    let kind = kind.unwrap_or(ChannelKind::Text);
                    self.db.set_trade_channel(&ctx.guild_id, &channel, kind).await?;
                    info!("🔄️ Guild {} now announces trades in {channel} ({kind})", ctx.guild_id);
                    Reply::new(format!("Trade announcements will be posted in {} ({kind}).", channel_mention(&channel)))
                },
                None => {
                    self.db.clear_trade_channel(&ctx.guild_id).await?;
                    info!("🔄️ Guild {} no longer has a trade channel", ctx.guild_id);
                    Reply::new("The trade channel has been cleared. New trades will not be announced.")
                },
            };
            Ok::<_, Halt>(reply)
        };
        settle(result.await)
    }

    pub async fn set_admin_role(&self, ctx: &InvocationContext, role: Option<Snowflake>) -> Result<Reply, FlowError> {
        let result = async {
            self.admin(ctx).await?;
            self.db.set_admin_role(&ctx.guild_id, role.as_ref()).await?;
            let reply = match &role {
                Some(role) => Reply::new(format!("The admin role is now {}.", role_mention(role))),
                None => Reply::new("The admin role has been cleared."),
            };
            Ok::<_, Halt>(reply)
        };
        settle(result.await)
    }

    pub async fn add_moderator_role(&self, ctx: &InvocationContext, role: &Snowflake) -> Result<Reply, FlowError> {
        let result = async {
            self.admin(ctx).await?;
            let reply = if self.db.add_moderator_role(&ctx.guild_id, role).await? {
                Reply::new(format!("Added {} as a moderator role.", role_mention(role)))
            } else {
                Reply::new(format!("{} is already a moderator role.", role_mention(role)))
            };
            Ok::<_, Halt>(reply)
        };
        settle(result.await)
    }

    pub async fn remove_moderator_role(&self, ctx: &InvocationContext, role: &Snowflake) -> Result<Reply, FlowError> {
        let result = async {
            self.admin(ctx).await?;
            let reply = if self.db.remove_moderator_role(&ctx.guild_id, role).await? {
                Reply::new(format!("Removed {} from the moderator roles.", role_mention(role)))
            } else {
                Reply::new(format!("{} is not a moderator role.", role_mention(role)))
            };
            Ok::<_, Halt>(reply)
        };
        settle(result.await)
    }

    pub async fn moderator_roles(&self, ctx: &InvocationContext) -> Result<Reply, FlowError> {
        let result = async {
            self.admin(ctx).await?;
            let roles = self.db.moderator_roles(&ctx.guild_id).await?;
            let reply = if roles.is_empty() {
                Reply::new("No moderator roles are configured.")
            } else {
                let roles = roles.iter().map(role_mention).collect::<Vec<_>>().join(", ");
                Reply::new(format!("Moderator roles: {roles}"))
            };
            Ok::<_, Halt>(reply)
        };
        settle(result.await)
    }

    pub async fn add_forum_tag(&self, ctx: &InvocationContext, kind: TagKind, tag: &Snowflake) -> Result<Reply, FlowError> {
        let result = async {
            self.admin(ctx).await?;
            let reply = if self.db.add_forum_tag(&ctx.guild_id, kind, tag).await? {
                Reply::new(format!("Tag `{tag}` will be applied to new {kind} announcements."))
            } else {
                Reply::new(format!("Tag `{tag}` is already applied to {kind} announcements."))
            };
            Ok::<_, Halt>(reply)
        };
        settle(result.await)
    }

    pub async fn remove_forum_tag(
        &self,
        ctx: &InvocationContext,
        kind: TagKind,
        tag: &Snowflake,
    ) -> Result<Reply, FlowError> {
        let result = async {
            self.admin(ctx).await?;
            let reply = if self.db.remove_forum_tag(&ctx.guild_id, kind, tag).await? {
                Reply::new(format!("Tag `{tag}` will no longer be applied to {kind} announcements."))
            } else {
                Reply::new(format!("Tag `{tag}` is not applied to {kind} announcements."))
            };
            Ok::<_, Halt>(reply)
        };
        settle(result.await)
    }

    pub async fn forum_tags(&self, ctx: &InvocationContext, kind: TagKind) -> Result<Reply, FlowError> {
        let result = async {
            self.admin(ctx).await?;
            let tags = self.db.forum_tags(&ctx.guild_id, kind).await?;
            let reply = if tags.is_empty() {
                Reply::new(format!("No forum tags are configured for {kind} announcements."))
            } else {
                let tags = tags.iter().map(|t| format!("`{t}`")).collect::<Vec<_>>().join(", ");
                Reply::new(format!("Forum tags for {kind} announcements: {tags}"))
            };
            Ok::<_, Halt>(reply)
        };
        settle(result.await)
    }
}
