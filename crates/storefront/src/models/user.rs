//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};

use dealshop_core::{Email, UserId};

/// A storefront account.
///
/// Users log in with either their username or their email address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Unique, normalized email address.
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// "First Last", or the username when both names are blank.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
}
