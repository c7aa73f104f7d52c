//! # Lifecycle orchestration
//!
//! Each user action runs the same pipeline: validate, apply one guarded persistence transition, re-render the record
//! and push the result to its remote announcement. The database is authoritative. Announcement failures never undo a
//! committed transition; they turn into warning lines on the reply.
//!
//! Business rejections (unknown id, someone else's trade, a trade that is already closed) are ordinary replies.
//! Only [`FlowError`] escapes, and only when persistence itself fails.
mod buy_flow_api;
mod controls;
mod errors;
mod guild_config_api;
mod helpers;
mod identity_api;
mod objects;
mod trade_flow_api;

pub use buy_flow_api::BuyOrderFlowApi;
pub use controls::dispatch_control;
pub use errors::{FlowError, ValidationError};
pub use guild_config_api::GuildConfigApi;
pub(crate) use helpers::BulkSummary;
pub use helpers::MAX_TITLE_CHARS;
pub use identity_api::IdentityApi;
pub use objects::{generic_failure, Caller, FlowConfig, InvocationContext, Reply, SyncWarnings, DEFAULT_LINK_HOST};
pub use trade_flow_api::{DoneAmount, TradeFlowApi, DEFAULT_MODERATOR_REASON};
