//! Types shared by the trade desk crates: the aUEC currency amount and a log-safe wrapper for secrets.
mod auec;
mod secret;

pub use auec::{Auec, AUEC_CURRENCY_CODE};
pub use secret::Secret;
