//! A thin client for the parts of the Discord REST API that the trade desk needs: posting and editing channel
//! messages, starting forum threads, renaming/archiving threads and looking up guild and forum metadata.
mod api;
mod config;
mod error;

pub mod data_objects;

pub use api::DiscordApi;
pub use config::DiscordConfig;
pub use error::{DiscordApiError, TAG_REQUIRED_ERROR_CODE, UNKNOWN_CHANNEL_ERROR_CODE};
