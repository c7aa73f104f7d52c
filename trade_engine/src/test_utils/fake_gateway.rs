use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
    Mutex,
};

use crate::{
    db_types::Snowflake,
    render::AnnouncementView,
    traits::{AnnouncementGateway, GatewayError, GuildDirectory, GuildMetadata, PostedAnnouncement, ThreadPatch},
};

/// What the fake gateway was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    PostMessage { channel: Snowflake, view: AnnouncementView },
    CreateForumThread { forum: Snowflake, tags: Vec<Snowflake>, view: AnnouncementView },
    FetchForumTags { forum: Snowflake },
    PatchMessage { channel: Snowflake, message: Snowflake, view: AnnouncementView },
    PatchThread { thread: Snowflake, patch: ThreadPatch },
}

#[derive(Debug, Default)]
struct FakeState {
    calls: Vec<GatewayCall>,
    forum_tags: Vec<Snowflake>,
    require_tag: bool,
    fail_patches: bool,
    guild_names: Vec<(Snowflake, String)>,
}

/// An in-memory [`AnnouncementGateway`] that records every call. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct FakeGateway {
    state: Arc<Mutex<FakeState>>,
    next_id: Arc<AtomicU64>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forum posts without tags fail with [`GatewayError::TagRequired`]; `tags` are what the forum offers.
    pub fn requiring_tags(self, tags: &[&str]) -> Self {
        {
            let mut state = self.state.lock().expect("poisoned");
            state.require_tag = true;
            state.forum_tags = tags.iter().map(|t| Snowflake::from(*t)).collect();
        }
        self
    }

    /// Every patch (message or thread) fails with [`GatewayError::NotFound`].
    pub fn failing_patches(self) -> Self {
        self.state.lock().expect("poisoned").fail_patches = true;
        self
    }

    pub fn with_guild(self, id: &str, name: &str) -> Self {
        self.state.lock().expect("poisoned").guild_names.push((Snowflake::from(id), name.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state.lock().expect("poisoned").calls.clone()
    }

    pub fn patched_messages(&self) -> Vec<(Snowflake, AnnouncementView)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GatewayCall::PatchMessage { message, view, .. } => Some((message, view)),
                _ => None,
            })
            .collect()
    }

    pub fn patched_threads(&self) -> Vec<(Snowflake, ThreadPatch)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GatewayCall::PatchThread { thread, patch } => Some((thread, patch)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: GatewayCall) {
        self.state.lock().expect("poisoned").calls.push(call);
    }

    fn next_snowflake(&self) -> Snowflake {
        Snowflake(format!("{}", 9_000 + self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    fn patch_result(&self) -> Result<(), GatewayError> {
        if self.state.lock().expect("poisoned").fail_patches {
            Err(GatewayError::NotFound)
        } else {
            Ok(())
        }
    }
}

impl AnnouncementGateway for FakeGateway {
    async fn post_message(
        &self,
        channel: &Snowflake,
        view: &AnnouncementView,
    ) -> Result<PostedAnnouncement, GatewayError> {
        self.record(GatewayCall::PostMessage { channel: channel.clone(), view: view.clone() });
        Ok(PostedAnnouncement { channel_id: channel.clone(), message_id: self.next_snowflake() })
    }

    async fn create_forum_thread(
        &self,
        forum: &Snowflake,
        view: &AnnouncementView,
        tags: &[Snowflake],
    ) -> Result<PostedAnnouncement, GatewayError> {
        self.record(GatewayCall::CreateForumThread { forum: forum.clone(), tags: tags.to_vec(), view: view.clone() });
        if tags.is_empty() && self.state.lock().expect("poisoned").require_tag {
            return Err(GatewayError::TagRequired);
        }
        // A forum thread's starter message shares the thread's id
        let thread = self.next_snowflake();
        Ok(PostedAnnouncement { channel_id: thread.clone(), message_id: thread })
    }

    async fn fetch_forum_tags(&self, forum: &Snowflake) -> Result<Vec<Snowflake>, GatewayError> {
        self.record(GatewayCall::FetchForumTags { forum: forum.clone() });
        Ok(self.state.lock().expect("poisoned").forum_tags.clone())
    }

    async fn patch_message(
        &self,
        channel: &Snowflake,
        message: &Snowflake,
        view: &AnnouncementView,
    ) -> Result<(), GatewayError> {
        self.record(GatewayCall::PatchMessage { channel: channel.clone(), message: message.clone(), view: view.clone() });
        self.patch_result()
    }

    async fn patch_thread(&self, thread: &Snowflake, patch: &ThreadPatch) -> Result<(), GatewayError> {
        self.record(GatewayCall::PatchThread { thread: thread.clone(), patch: patch.clone() });
        self.patch_result()
    }
}

impl GuildDirectory for FakeGateway {
    async fn fetch_guild_metadata(&self, guild: &Snowflake) -> Result<Option<GuildMetadata>, GatewayError> {
        let state = self.state.lock().expect("poisoned");
        let found = state.guild_names.iter().find(|(id, _)| id == guild);
        Ok(found.map(|(id, name)| GuildMetadata { id: id.clone(), name: name.clone() }))
    }
}
