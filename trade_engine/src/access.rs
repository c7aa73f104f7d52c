//! Access control for administrative commands.
//!
//! Ownership of trades and buy orders is checked separately by the lifecycle APIs and applies to everyone, admins
//! included.
use crate::{
    db_types::{Guild, Snowflake},
    flow_api::Caller,
};

/// The Discord `ADMINISTRATOR` permission bit.
pub const ADMINISTRATOR_PERMISSION: u64 = 0x8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    /// Guild administrators and holders of the configured admin role.
    Admin,
    /// Everyone with admin access, plus holders of any moderator role.
    Moderator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Granted,
    Denied(String),
}

impl Access {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

pub fn ensure_access(
    caller: &Caller,
    guild: Option<&Guild>,
    moderator_roles: &[Snowflake],
    level: AccessLevel,
) -> Access {
    if caller.permissions & ADMINISTRATOR_PERMISSION != 0 {
        return Access::Granted;
    }
    let admin_role = guild.and_then(|g| g.admin_role_id.as_ref());
    if admin_role.is_some_and(|role| caller.roles.contains(role)) {
        return Access::Granted;
    }
    match level {
        AccessLevel::Moderator if moderator_roles.iter().any(|r| caller.roles.contains(r)) => Access::Granted,
        AccessLevel::Moderator => Access::Denied(
            "You need the administrator permission, the admin role or a moderator role to do that.".to_string(),
        ),
        AccessLevel::Admin => {
            Access::Denied("You need the administrator permission or the admin role to do that.".to_string())
        },
    }
}
