//! A read-through cache for guild metadata.
//!
//! Guild names change rarely and are only used for bookkeeping, so entries may be served stale. Lookups that find no
//! guild are not cached.
use std::{collections::HashMap, sync::Arc, time::Duration};

use log::*;
use tokio::{sync::RwLock, time::Instant};

use crate::{
    db_types::Snowflake,
    traits::{GatewayError, GuildDirectory, GuildMetadata},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Entries never expire.
    #[default]
    Forever,
    /// Entries are refetched once they are older than the given duration.
    Ttl(Duration),
}

impl CachePolicy {
    fn is_fresh(&self, fetched_at: Instant) -> bool {
        match self {
            Self::Forever => true,
            Self::Ttl(ttl) => fetched_at.elapsed() < *ttl,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    metadata: GuildMetadata,
    fetched_at: Instant,
}

pub struct GuildMetadataCache<D> {
    directory: D,
    policy: CachePolicy,
    entries: Arc<RwLock<HashMap<Snowflake, CacheEntry>>>,
}

impl<D: Clone> Clone for GuildMetadataCache<D> {
    fn clone(&self) -> Self {
        Self { directory: self.directory.clone(), policy: self.policy, entries: Arc::clone(&self.entries) }
    }
}

impl<D> GuildMetadataCache<D> {
    pub fn new(directory: D, policy: CachePolicy) -> Self {
        Self { directory, policy, entries: Arc::new(RwLock::new(HashMap::new())) }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub async fn invalidate(&self, guild: &Snowflake) {
        self.entries.write().await.remove(guild);
    }
}

impl<D: GuildDirectory> GuildMetadataCache<D> {
    pub async fn fetch_guild_metadata(&self, guild: &Snowflake) -> Result<Option<GuildMetadata>, GatewayError> {
        if let Some(entry) = self.entries.read().await.get(guild) {
            if self.policy.is_fresh(entry.fetched_at) {
                trace!("📣️ Guild {guild} metadata served from cache");
                return Ok(Some(entry.metadata.clone()));
            }
        }
        let metadata = self.directory.fetch_guild_metadata(guild).await?;
        if let Some(metadata) = &metadata {
            let entry = CacheEntry { metadata: metadata.clone(), fetched_at: Instant::now() };
            self.entries.write().await.insert(guild.clone(), entry);
            debug!("📣️ Guild {guild} metadata cached ({})", metadata.name);
        }
        Ok(metadata)
    }
}
