//! Session Model
//!
//! Supplied by the auth collaborator; treated as opaque identity here.

use serde::{Deserialize, Serialize};

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Stable user id; doubles as the shop namespace for shop users
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

impl Session {
    /// Shop (non-admin) session
    pub fn shop(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            is_admin: false,
        }
    }

    /// Administrator session
    pub fn admin(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            is_admin: true,
        }
    }
}
