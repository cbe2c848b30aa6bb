use serde::Serialize;
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// One directed half of an accepted friendship. A friendship between A and B
/// is stored as `(A -> B)` and `(B -> A)`.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct FriendshipEntity {
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct FriendRequestEntity {
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub message: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct BlockEntity {
    pub blocker_id: Uuid,
    pub blocked_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
