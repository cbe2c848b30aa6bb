use uuid::Uuid;

use crate::api::error;
use crate::modules::friendship::model::BlockOutcome;
use crate::modules::friendship::schema::{BlockEntity, FriendRequestEntity, FriendshipEntity};

#[async_trait::async_trait]
pub trait FriendshipRepository {
    async fn friendship_exists(&self, from: &Uuid, to: &Uuid)
    -> Result<bool, error::SystemError>;

    /// Rows with `from = user_id`, one per friend.
    async fn find_friends(&self, user_id: &Uuid)
    -> Result<Vec<FriendshipEntity>, error::SystemError>;

    async fn find_friend_ids_from(&self, user_id: &Uuid) -> Result<Vec<Uuid>, error::SystemError>;

    async fn find_friend_ids_to(&self, user_id: &Uuid) -> Result<Vec<Uuid>, error::SystemError>;

    /// Deletes both directed rows between the pair, returning how many existed.
    async fn delete_friendship_pair(
        &self,
        user_id_a: &Uuid,
        user_id_b: &Uuid,
    ) -> Result<u64, error::SystemError>;
}

#[async_trait::async_trait]
pub trait FriendRequestRepository {
    async fn find_friend_request(
        &self,
        from: &Uuid,
        to: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError>;

    async fn find_friend_requests_to_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendRequestEntity>, error::SystemError>;

    async fn find_friend_requests_from_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendRequestEntity>, error::SystemError>;

    /// Returns `None` when a request for the ordered pair already exists.
    async fn insert_friend_request(
        &self,
        from: &Uuid,
        to: &Uuid,
        message: &Option<String>,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError>;

    async fn delete_friend_request(&self, from: &Uuid, to: &Uuid)
    -> Result<bool, error::SystemError>;
}

#[async_trait::async_trait]
pub trait BlockRepository {
    async fn block_exists(&self, blocker: &Uuid, blocked: &Uuid)
    -> Result<bool, error::SystemError>;

    async fn find_blocks_by(&self, blocker: &Uuid) -> Result<Vec<BlockEntity>, error::SystemError>;

    async fn delete_block(&self, blocker: &Uuid, blocked: &Uuid)
    -> Result<bool, error::SystemError>;
}

/// The full relationship store. The `*_atomic` methods either apply every
/// row change or none of them.
#[async_trait::async_trait]
pub trait RelationshipStore:
    FriendshipRepository + FriendRequestRepository + BlockRepository + Send + Sync
{
    /// Consumes `(requester -> accepter)`, writes both friendship rows and
    /// drops a mirrored `(accepter -> requester)` request. `None` when there
    /// was no request to consume.
    async fn accept_friend_request_atomic(
        &self,
        accepter: &Uuid,
        requester: &Uuid,
    ) -> Result<Option<(FriendshipEntity, FriendshipEntity)>, error::SystemError>;

    /// Inserts the block if absent and removes the pair's friendship rows and
    /// pending requests in both directions.
    async fn block_atomic(
        &self,
        blocker: &Uuid,
        blocked: &Uuid,
    ) -> Result<BlockOutcome, error::SystemError>;
}
