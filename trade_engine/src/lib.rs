//! Trade Engine
//!
//! The lifecycle engine behind the trade desk bot. Guild members list items for sale ("trades") and post buy orders;
//! the engine persists every step of their lifecycle and mirrors it into an announcement message (or forum thread)
//! on Discord.
//!
//! The library is divided into three main sections:
//! 1. Persistence ([`mod@db_types`] and the [`traits`] the backends implement). SQLite is the supported backend.
//!    Every state transition is a single guarded statement, so concurrent commands against the same record cannot
//!    break its invariants.
//! 2. Rendering ([`mod@render`]). Pure functions from a record to what its announcement shows.
//! 3. Orchestration (the `*Api` types). Validate, persist, render and synchronize, reporting partial failures as
//!    warnings instead of errors.
//!
//! The engine knows nothing about HTTP or Discord's wire format. Remote calls go through the
//! [`AnnouncementGateway`] and [`GuildDirectory`] traits, which the server implements.
mod db;

pub mod access;
pub mod announcements;
pub mod control_id;
pub mod db_types;
mod flow_api;
pub mod guild_cache;
pub mod render;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{db_url, new_pool, schema, SqliteDatabase};
pub use flow_api::{
    dispatch_control,
    generic_failure,
    BuyOrderFlowApi,
    Caller,
    DoneAmount,
    FlowConfig,
    FlowError,
    GuildConfigApi,
    IdentityApi,
    InvocationContext,
    Reply,
    SyncWarnings,
    TradeFlowApi,
    ValidationError,
    DEFAULT_LINK_HOST,
    DEFAULT_MODERATOR_REASON,
    MAX_TITLE_CHARS,
};
pub use traits::{
    AnnouncementGateway,
    BuyOrderManagement,
    GatewayError,
    GuildDirectory,
    GuildManagement,
    TradeDbError,
    TradeDeskDatabase,
    TradeManagement,
    UserManagement,
};
