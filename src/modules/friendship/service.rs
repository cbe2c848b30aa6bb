use std::{collections::HashSet, sync::Arc};

use log::{info, warn};
use uuid::Uuid;

use crate::{
    api::error,
    modules::friendship::{
        model::{FriendRequestResponse, FriendResponse, RequestDirection},
        repository::RelationshipStore,
        schema::{BlockEntity, FriendRequestEntity},
    },
};

/// Friendship engine: request lifecycle, symmetric friendships, blocks and
/// mutual friends. Holds no state of its own between calls.
pub struct FriendshipService<R>
where
    R: RelationshipStore,
{
    store: Arc<R>,
}

impl<R: RelationshipStore> Clone for FriendshipService<R> {
    fn clone(&self) -> Self {
        FriendshipService { store: self.store.clone() }
    }
}

impl<R> FriendshipService<R>
where
    R: RelationshipStore,
{
    pub fn with_dependencies(store: Arc<R>) -> Self {
        FriendshipService { store }
    }

    /// True only when both directed rows exist. A lone row is a broken pair
    /// and does not count as a friendship.
    pub async fn are_friends(
        &self,
        user_a: Uuid,
        user_b: Uuid,
    ) -> Result<bool, error::SystemError> {
        let (forward, backward) = tokio::try_join!(
            self.store.friendship_exists(&user_b, &user_a),
            self.store.friendship_exists(&user_a, &user_b),
        )?;

        if forward != backward {
            warn!("Half friendship pair between {} and {}", user_a, user_b);
        }

        Ok(forward && backward)
    }

    pub async fn add_friend(
        &self,
        from_user: Uuid,
        to_user: Uuid,
        message: Option<String>,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        if from_user == to_user {
            return Err(error::SystemError::SelfReference);
        }

        if self.are_friends(from_user, to_user).await? {
            return Err(error::SystemError::AlreadyFriends);
        }

        let (existing, blocked) = tokio::try_join!(
            self.store.find_friend_request(&from_user, &to_user),
            self.store.block_exists(&to_user, &from_user),
        )?;

        if existing.is_some() {
            return Err(error::SystemError::AlreadyExists);
        }

        if blocked {
            return Err(error::SystemError::Blocked);
        }

        // a concurrent duplicate can still win between the check and the insert
        let request = self
            .store
            .insert_friend_request(&from_user, &to_user, &message)
            .await?
            .ok_or(error::SystemError::AlreadyExists)?;

        info!("Friend request sent from {} to {}", from_user, to_user);

        Ok(request)
    }

    /// `accepter` accepts the pending request `requester -> accepter`.
    pub async fn accept(
        &self,
        accepter: Uuid,
        requester: Uuid,
    ) -> Result<bool, error::SystemError> {
        if accepter == requester {
            return Err(error::SystemError::SelfReference);
        }

        self.store
            .accept_friend_request_atomic(&accepter, &requester)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Friend request not found"))?;

        info!("Friend request from {} accepted by {}", requester, accepter);

        Ok(true)
    }

    /// Deletes the pending request `from_user -> to_user`.
    pub async fn reject(&self, from_user: Uuid, to_user: Uuid) -> Result<bool, error::SystemError> {
        if !self.store.delete_friend_request(&from_user, &to_user).await? {
            return Err(error::SystemError::not_found("Friend request not found"));
        }

        info!("Friend request from {} to {} rejected", from_user, to_user);

        Ok(true)
    }

    pub async fn remove_friend(
        &self,
        user_a: Uuid,
        user_b: Uuid,
    ) -> Result<bool, error::SystemError> {
        let removed = self.store.delete_friendship_pair(&user_a, &user_b).await?;

        if removed == 1 {
            warn!("Removed half friendship pair between {} and {}", user_a, user_b);
        }
        if removed > 0 {
            info!("Friendship between {} and {} removed", user_a, user_b);
        }

        Ok(removed > 0)
    }

    /// Blocks `blocked` and tears down any friendship between the pair. The
    /// cleanup is committed even when the block already existed, in which case
    /// `AlreadyBlocked` is returned afterwards.
    pub async fn add_block(
        &self,
        blocker: Uuid,
        blocked: Uuid,
    ) -> Result<BlockEntity, error::SystemError> {
        if blocker == blocked {
            return Err(error::SystemError::SelfReference);
        }

        let outcome = self.store.block_atomic(&blocker, &blocked).await?;

        if outcome.friendships_removed > 0 || outcome.requests_removed > 0 {
            info!(
                "Block by {} on {} removed {} friendship row(s) and {} request(s)",
                blocker, blocked, outcome.friendships_removed, outcome.requests_removed
            );
        }

        if !outcome.created {
            return Err(error::SystemError::AlreadyBlocked);
        }

        info!("User {} blocked {}", blocker, blocked);

        Ok(outcome.block)
    }

    pub async fn remove_block(
        &self,
        blocker: Uuid,
        blocked: Uuid,
    ) -> Result<bool, error::SystemError> {
        let removed = self.store.delete_block(&blocker, &blocked).await?;

        if removed {
            info!("User {} unblocked {}", blocker, blocked);
        }

        Ok(removed)
    }

    /// Users that `user_a` lists as friends and that are linked to `user_b` in
    /// either direction. Neither argument is ever part of the result.
    pub async fn mutual_friends(
        &self,
        user_a: Uuid,
        user_b: Uuid,
    ) -> Result<HashSet<Uuid>, error::SystemError> {
        let (a_out, b_out, b_in) = tokio::try_join!(
            self.store.find_friend_ids_from(&user_a),
            self.store.find_friend_ids_from(&user_b),
            self.store.find_friend_ids_to(&user_b),
        )?;

        let b_linked: HashSet<Uuid> = b_out.into_iter().chain(b_in).collect();

        Ok(a_out
            .into_iter()
            .filter(|id| *id != user_a && *id != user_b && b_linked.contains(id))
            .collect())
    }

    pub async fn list_friends(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FriendResponse>, error::SystemError> {
        let friends = self.store.find_friends(&user_id).await?;

        Ok(friends
            .into_iter()
            .map(|f| FriendResponse { user_id: f.to_user_id, since: f.created_at })
            .collect())
    }

    pub async fn list_friend_requests(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FriendRequestResponse>, error::SystemError> {
        let (requests_to, requests_from) = tokio::try_join!(
            self.store.find_friend_requests_to_user(&user_id),
            self.store.find_friend_requests_from_user(&user_id),
        )?;

        let mut all = Vec::with_capacity(requests_to.len() + requests_from.len());
        all.extend(
            requests_to
                .into_iter()
                .map(|r| FriendRequestResponse::new(RequestDirection::Incoming, r)),
        );
        all.extend(
            requests_from
                .into_iter()
                .map(|r| FriendRequestResponse::new(RequestDirection::Outgoing, r)),
        );
        Ok(all)
    }

    pub async fn list_blocks(&self, blocker: Uuid) -> Result<Vec<BlockEntity>, error::SystemError> {
        self.store.find_blocks_by(&blocker).await
    }
}
