//! Discord interactions: from a webhook payload to an ephemeral reply.
mod command;
mod desk;

pub use command::{Command, CommandError, Invocation, Options};
pub use desk::{caller_from_interaction, reply_response, TradeDesk};
