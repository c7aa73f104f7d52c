use log::*;

use super::{errors::Halt, InvocationContext, Reply, ValidationError};
use crate::{
    access::{ensure_access, Access, AccessLevel},
    db_types::{Guild, Snowflake},
    traits::{GuildManagement, TradeDbError, UserManagement},
};

/// Titles and item names share Discord's limit for embed titles that also feed thread names.
pub const MAX_TITLE_CHARS: usize = 100;

pub fn validate_title(title: &str) -> Result<String, ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(ValidationError::TitleTooLong { max: MAX_TITLE_CHARS });
    }
    Ok(title.to_string())
}

pub fn validate_price(price: i64) -> Result<i64, ValidationError> {
    if price < 1 {
        return Err(ValidationError::InvalidPrice(price));
    }
    Ok(price)
}

pub fn validate_stock(stock: i64) -> Result<i64, ValidationError> {
    if stock < 1 {
        return Err(ValidationError::InvalidStock(stock));
    }
    Ok(stock)
}

pub fn validate_amount(amount: i64) -> Result<i64, ValidationError> {
    if amount < 1 {
        return Err(ValidationError::InvalidAmount(amount));
    }
    Ok(amount)
}

/// The name shown in announcement footers. Falls back to the raw id if the owner has never been recorded.
pub async fn owner_name<B: UserManagement>(db: &B, user: &Snowflake) -> String {
    match db.fetch_user(user).await {
        Ok(Some(u)) => u.display().to_string(),
        Ok(None) => user.to_string(),
        Err(e) => {
            warn!("🔄️ Could not look up user {user}: {e}. Using the raw id.");
            user.to_string()
        },
    }
}

/// Guild configuration for best-effort decisions. A lookup failure is logged and treated as "not configured".
pub async fn guild_config<B: GuildManagement>(db: &B, guild: &Snowflake) -> Option<Guild> {
    match db.fetch_guild(guild).await {
        Ok(g) => g,
        Err(e) => {
            warn!("🔄️ Could not load the configuration for guild {guild}: {e}");
            None
        },
    }
}

/// Fetches the guild row, creating it if the bookkeeping for this invocation has not done so yet.
pub async fn ensure_guild<B: GuildManagement>(db: &B, guild: &Snowflake) -> Result<Guild, TradeDbError> {
    match db.fetch_guild(guild).await? {
        Some(g) => Ok(g),
        None => db.upsert_guild(guild, guild.as_str()).await,
    }
}

/// Stops with the denial message unless the caller has at least `level` access in the invocation's guild.
pub async fn authorize<B: GuildManagement>(db: &B, ctx: &InvocationContext, level: AccessLevel) -> Result<(), Halt> {
    let guild = db.fetch_guild(&ctx.guild_id).await?;
    let moderator_roles = match level {
        AccessLevel::Moderator => db.moderator_roles(&ctx.guild_id).await?,
        AccessLevel::Admin => Vec::new(),
    };
    match ensure_access(&ctx.caller, guild.as_ref(), &moderator_roles, level) {
        Access::Granted => Ok(()),
        Access::Denied(message) => {
            debug!("🔄️ {} was denied {level:?} access in guild {}", ctx.caller.user_id, ctx.guild_id);
            Err(Halt::Rejected(message))
        },
    }
}

/// Collects the per-record outcomes of a bulk operation into one reply.
#[derive(Debug, Default)]
pub struct BulkSummary {
    succeeded: Vec<i64>,
    notes: Vec<String>,
}

impl BulkSummary {
    /// Records a successful transition, keeping any warnings it produced.
    pub fn success(&mut self, id: i64, label: &str, reply: &Reply) {
        self.succeeded.push(id);
        self.notes.extend(reply.lines.iter().filter(|l| l.starts_with("⚠️")).map(|l| format!("{label} #{id}: {l}")));
    }

    pub fn failure(&mut self, id: i64, label: &str, message: &str) {
        self.notes.push(format!("{label} #{id}: {message}"));
    }

    pub fn into_reply(self, verb: &str, noun: &str) -> Reply {
        let ids = self.succeeded.iter().map(|id| format!("#{id}")).collect::<Vec<_>>().join(", ");
        let headline = match self.succeeded.len() {
            0 => format!("No {noun} were {verb}."),
            n => format!("{verb_cap} {n} {noun}: {ids}", verb_cap = capitalize(verb)),
        };
        Reply::new(headline).lines(self.notes)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
