//! # Collaborator contracts
//!
//! The lifecycle APIs are generic over these traits so that persistence backends and the remote announcement service
//! can be swapped out (a SQLite database and the Discord REST API in production, fakes and mocks under test).
//!
//! * [`TradeManagement`] and [`BuyOrderManagement`] own the guarded state transitions of sell listings and buy orders.
//! * [`GuildManagement`] stores per-guild configuration: trade channel, admin role, moderator roles and forum tags.
//! * [`UserManagement`] keeps caller profiles up to date and appends to the command audit log.
//! * [`AnnouncementGateway`] is the remote side: posting and patching messages and threads. It is unreliable and every
//!   call into it is treated as best-effort.
//! * [`GuildDirectory`] resolves guild metadata (currently just the name) from the remote side.
//! * [`TradeDeskDatabase`] bundles the persistence traits for the transport layer.
mod announcement_gateway;
mod buy_order_management;
mod data_objects;
mod guild_directory;
mod guild_management;
mod trade_desk_database;
mod trade_management;
mod user_management;

pub use announcement_gateway::{AnnouncementGateway, GatewayError, PostedAnnouncement, ThreadPatch};
pub use buy_order_management::BuyOrderManagement;
pub use data_objects::TradeDbError;
pub use guild_directory::{GuildDirectory, GuildMetadata};
pub use guild_management::GuildManagement;
pub use trade_desk_database::TradeDeskDatabase;
pub use trade_management::TradeManagement;
pub use user_management::UserManagement;
