//! Announcement publishing and synchronization policy.
//!
//! The gateway only exposes primitives. Deciding which primitive to call, retrying forum posts that need a tag and
//! working out whether an announcement lives in its own thread all happen here.
use log::*;

use crate::{
    db_types::{ChannelKind, Guild, Snowflake},
    flow_api::{FlowConfig, SyncWarnings},
    render::{announcement_link, AnnouncementView},
    traits::{AnnouncementGateway, GatewayError, PostedAnnouncement, ThreadPatch},
};

/// Publishes a new announcement in the trade channel.
///
/// Text channels get a plain message. Forum channels get a new thread. If the forum insists on a tag and none were
/// supplied, the forum's first available tag is fetched and the post is retried exactly once.
pub async fn post_announcement<G: AnnouncementGateway>(
    gateway: &G,
    channel: &Snowflake,
    kind: ChannelKind,
    view: &AnnouncementView,
    tags: &[Snowflake],
) -> Result<PostedAnnouncement, GatewayError> {
    match kind {
        ChannelKind::Text => gateway.post_message(channel, view).await,
        ChannelKind::Forum => match gateway.create_forum_thread(channel, view, tags).await {
            Err(GatewayError::TagRequired) if tags.is_empty() => {
                debug!("📣️ Forum {channel} requires a tag. Fetching the available tags.");
                let available = gateway.fetch_forum_tags(channel).await?;
                match available.first() {
                    Some(tag) => {
                        info!("📣️ Retrying the post in forum {channel} with tag {tag}");
                        gateway.create_forum_thread(channel, view, std::slice::from_ref(tag)).await
                    },
                    None => {
                        warn!("📣️ Forum {channel} requires a tag but has none available");
                        Err(GatewayError::TagRequired)
                    },
                }
            },
            result => result,
        },
    }
}

/// True when the announcement at `pointer_channel` is a forum thread of its own, rather than a message in the
/// configured channel.
pub fn is_forum_thread(guild: Option<&Guild>, pointer_channel: &Snowflake) -> bool {
    match guild.and_then(|g| g.trade_channel()) {
        Some((channel, ChannelKind::Forum)) => channel != pointer_channel,
        _ => false,
    }
}

/// Renames the thread to its final name and shuts it.
pub fn closing_thread_patch(view: &AnnouncementView) -> ThreadPatch {
    ThreadPatch { name: Some(view.thread_name.clone()), archived: Some(true), locked: Some(true) }
}

/// Where an already-committed record's announcement lives.
#[derive(Debug, Clone, Copy)]
pub struct SyncTarget<'a> {
    pub guild_id: &'a Snowflake,
    /// The guild configuration. Only needed to decide whether a closed record's thread should be shut.
    pub guild: Option<&'a Guild>,
    pub pointer: Option<(&'a Snowflake, &'a Snowflake)>,
    /// The record just left the open state for good.
    pub closed: bool,
}

/// Brings a remote announcement in line with the freshly rendered `view`.
///
/// Gateway failures are recorded in `warnings` and never returned. The returned line points the caller at the
/// announcement, or says there is none.
pub async fn sync_announcement<G: AnnouncementGateway>(
    gateway: &G,
    config: &FlowConfig,
    target: SyncTarget<'_>,
    view: &AnnouncementView,
    warnings: &mut SyncWarnings,
) -> String {
    let Some((channel, message)) = target.pointer else {
        return "There is no stored announcement to update.".to_string();
    };
    if config.offline {
        debug!("📣️ Offline mode. Not updating announcement {channel}/{message}");
    } else {
        if let Err(e) = gateway.patch_message(channel, message, view).await {
            warn!("📣️ Could not patch announcement {channel}/{message}: {e}");
            warnings.announcement = Some(e.to_string());
        }
        if target.closed && is_forum_thread(target.guild, channel) {
            if let Err(e) = gateway.patch_thread(channel, &closing_thread_patch(view)).await {
                warn!("📣️ Could not close thread {channel}: {e}");
                warnings.thread = Some(e.to_string());
            }
        }
    }
    format!("Announcement: {}", announcement_link(&config.link_host, target.guild_id, channel, message))
}
