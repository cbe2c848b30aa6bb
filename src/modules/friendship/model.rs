use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::modules::friendship::schema::{BlockEntity, FriendRequestEntity};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestBody {
    pub recipient_id: Uuid,
    #[validate(length(max = 500, message = "Message must be at most 500 characters long"))]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestDirection {
    Incoming,
    Outgoing,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestResponse {
    pub direction: RequestDirection,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub message: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl FriendRequestResponse {
    pub fn new(direction: RequestDirection, request: FriendRequestEntity) -> Self {
        FriendRequestResponse {
            direction,
            from_user_id: request.from_user_id,
            to_user_id: request.to_user_id,
            message: request.message,
            created_at: request.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendResponse {
    pub user_id: Uuid,
    pub since: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockResponse {
    pub user_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<BlockEntity> for BlockResponse {
    fn from(block: BlockEntity) -> Self {
        BlockResponse { user_id: block.blocked_id, created_at: block.created_at }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectedResponse {
    pub connected: bool,
}

/// Result of an `add_block` write: the block row plus what the transaction
/// cleaned up alongside it.
#[derive(Debug, Clone)]
pub struct BlockOutcome {
    pub block: BlockEntity,
    pub created: bool,
    pub friendships_removed: u64,
    pub requests_removed: u64,
}
