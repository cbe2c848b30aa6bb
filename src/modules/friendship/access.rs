//! Read-only connection checks for collaborators that gate content
//! visibility (posts, feeds, stories).

use uuid::Uuid;

use crate::modules::friendship::{repository::RelationshipStore, service::FriendshipService};

#[async_trait::async_trait]
pub trait ConnectionGate: Send + Sync {
    /// Whether the two users are friends. Fails closed: any error reads as
    /// `false`.
    async fn are_connected(&self, user_a: Uuid, user_b: Uuid) -> bool;

    /// Visibility of content owned by `owner` to `viewer`.
    async fn can_view(&self, viewer: Uuid, owner: Uuid, is_public: bool) -> bool {
        if viewer == owner || is_public {
            return true;
        }
        self.are_connected(viewer, owner).await
    }
}

#[async_trait::async_trait]
impl<R> ConnectionGate for FriendshipService<R>
where
    R: RelationshipStore,
{
    async fn are_connected(&self, user_a: Uuid, user_b: Uuid) -> bool {
        match self.are_friends(user_a, user_b).await {
            Ok(connected) => connected,
            Err(e) => {
                tracing::warn!(%user_a, %user_b, error = %e, "Connection check failed, denying");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        api::error,
        modules::friendship::{
            model::BlockOutcome,
            repository::{BlockRepository, FriendRequestRepository, FriendshipRepository},
            repository_memory::FriendshipRepositoryMemory,
            schema::{BlockEntity, FriendRequestEntity, FriendshipEntity},
        },
    };

    /// Store whose every call fails like a dropped database connection.
    struct UnavailableStore;

    fn unavailable() -> error::SystemError {
        error::SystemError::DatabaseError("connection refused".into())
    }

    #[async_trait::async_trait]
    impl FriendshipRepository for UnavailableStore {
        async fn friendship_exists(&self, _: &Uuid, _: &Uuid) -> Result<bool, error::SystemError> {
            Err(unavailable())
        }
        async fn find_friends(
            &self,
            _: &Uuid,
        ) -> Result<Vec<FriendshipEntity>, error::SystemError> {
            Err(unavailable())
        }
        async fn find_friend_ids_from(&self, _: &Uuid) -> Result<Vec<Uuid>, error::SystemError> {
            Err(unavailable())
        }
        async fn find_friend_ids_to(&self, _: &Uuid) -> Result<Vec<Uuid>, error::SystemError> {
            Err(unavailable())
        }
        async fn delete_friendship_pair(
            &self,
            _: &Uuid,
            _: &Uuid,
        ) -> Result<u64, error::SystemError> {
            Err(unavailable())
        }
    }

    #[async_trait::async_trait]
    impl FriendRequestRepository for UnavailableStore {
        async fn find_friend_request(
            &self,
            _: &Uuid,
            _: &Uuid,
        ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
            Err(unavailable())
        }
        async fn find_friend_requests_to_user(
            &self,
            _: &Uuid,
        ) -> Result<Vec<FriendRequestEntity>, error::SystemError> {
            Err(unavailable())
        }
        async fn find_friend_requests_from_user(
            &self,
            _: &Uuid,
        ) -> Result<Vec<FriendRequestEntity>, error::SystemError> {
            Err(unavailable())
        }
        async fn insert_friend_request(
            &self,
            _: &Uuid,
            _: &Uuid,
            _: &Option<String>,
        ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
            Err(unavailable())
        }
        async fn delete_friend_request(
            &self,
            _: &Uuid,
            _: &Uuid,
        ) -> Result<bool, error::SystemError> {
            Err(unavailable())
        }
    }

    #[async_trait::async_trait]
    impl BlockRepository for UnavailableStore {
        async fn block_exists(&self, _: &Uuid, _: &Uuid) -> Result<bool, error::SystemError> {
            Err(unavailable())
        }
        async fn find_blocks_by(&self, _: &Uuid) -> Result<Vec<BlockEntity>, error::SystemError> {
            Err(unavailable())
        }
        async fn delete_block(&self, _: &Uuid, _: &Uuid) -> Result<bool, error::SystemError> {
            Err(unavailable())
        }
    }

    #[async_trait::async_trait]
    impl RelationshipStore for UnavailableStore {
        async fn accept_friend_request_atomic(
            &self,
            _: &Uuid,
            _: &Uuid,
        ) -> Result<Option<(FriendshipEntity, FriendshipEntity)>, error::SystemError> {
            Err(unavailable())
        }
        async fn block_atomic(
            &self,
            _: &Uuid,
            _: &Uuid,
        ) -> Result<BlockOutcome, error::SystemError> {
            Err(unavailable())
        }
    }

    #[tokio::test]
    async fn store_failure_fails_closed() {
        let svc = FriendshipService::with_dependencies(Arc::new(UnavailableStore));
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        assert!(svc.are_friends(a, b).await.unwrap_err().is_storage());
        assert!(!svc.are_connected(a, b).await);
        assert!(!svc.can_view(a, b, false).await);
        assert!(svc.can_view(a, b, true).await);
        assert!(svc.can_view(a, a, false).await);
    }

    #[tokio::test]
    async fn friends_can_view_private_content() {
        let svc = FriendshipService::with_dependencies(Arc::new(FriendshipRepositoryMemory::new()));
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        svc.add_friend(a, b, None).await.unwrap();
        assert!(!svc.are_connected(a, b).await);

        svc.accept(b, a).await.unwrap();
        assert!(svc.are_connected(a, b).await);
        assert!(svc.can_view(b, a, false).await);
        assert!(!svc.can_view(c, a, false).await);
    }
}
