//! Password reset tokens.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ResetTokenId, UserId};

/// A single-use token emailed to a user who forgot their password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordResetToken {
    pub id: ResetTokenId,
    pub user_id: UserId,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

impl PasswordResetToken {
    /// Length of generated tokens.
    pub const LENGTH: usize = 100;

    /// How long a token stays usable after creation.
    pub const VALIDITY: TimeDelta = TimeDelta::minutes(60);

    /// Whether the token can still be used at `now`.
    ///
    /// A token exactly [`Self::VALIDITY`] old is still valid.
    #[must_use]
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at <= Self::VALIDITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_created(created_at: DateTime<Utc>) -> PasswordResetToken {
        PasswordResetToken {
            id: ResetTokenId::new(1),
            user_id: UserId::new(1),
            token: "a".repeat(PasswordResetToken::LENGTH),
            created_at,
        }
    }

    #[test]
    fn test_valid_within_the_hour() {
        let now = Utc::now();
        assert!(token_created(now).is_valid(now));
        assert!(token_created(now - TimeDelta::minutes(30)).is_valid(now));
    }

    #[test]
    fn test_expired_after_two_hours() {
        let now = Utc::now();
        assert!(!token_created(now - TimeDelta::hours(2)).is_valid(now));
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let now = Utc::now();
        assert!(token_created(now - TimeDelta::minutes(60)).is_valid(now));
        assert!(
            !token_created(now - TimeDelta::minutes(60) - TimeDelta::seconds(1)).is_valid(now)
        );
    }
}
