use std::fmt::Display;

use serde_repr::{Deserialize_repr, Serialize_repr};

/// The privilege level attached to an identity and carried in its session
/// tokens. Levels are ordered: an administrator can do anything a
/// registrant can.
#[derive(
    Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Serialize_repr, Deserialize_repr,
)]
#[repr(u8)]
pub enum Role {
    Registrant = 0,
    Administrator = 1,
}

impl Default for Role {
    fn default() -> Self {
        Self::Registrant
    }
}

impl Display for Role {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                Self::Registrant => "registrant",
                Self::Administrator => "administrator",
            }
        )
    }
}

/// A marker for the privilege level a route requires; used as the type
/// parameter of [`super::AuthToken`] request guards.
pub trait Actor {
    const ROLE: Role;
}

/// Any authenticated identity.
pub struct Registrant;

impl Actor for Registrant {
    const ROLE: Role = Role::Registrant;
}

/// An authenticated identity holding the administrator role.
pub struct Administrator;

impl Actor for Administrator {
    const ROLE: Role = Role::Administrator;
}
