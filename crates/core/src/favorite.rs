//! Product favorites.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{FavoriteId, ProductId, UserId};

/// A product a user has marked as a favorite.
///
/// At most one favorite exists per `(user_id, product_id)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: FavoriteId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub created_at: DateTime<Utc>,
}
