use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use uuid::Uuid;

use crate::{
    api::error,
    modules::friendship::{
        model::BlockOutcome,
        repository::{
            BlockRepository, FriendRequestRepository, FriendshipRepository, RelationshipStore,
        },
        schema::{BlockEntity, FriendRequestEntity, FriendshipEntity},
    },
};

type Pair = (Uuid, Uuid);

#[derive(Default)]
struct Tables {
    requests: BTreeMap<Pair, FriendRequestEntity>,
    friendships: BTreeMap<Pair, FriendshipEntity>,
    blocks: BTreeMap<Pair, BlockEntity>,
}

impl Tables {
    fn remove_both<T>(map: &mut BTreeMap<Pair, T>, a: Uuid, b: Uuid) -> u64 {
        let forward = map.remove(&(a, b)).is_some() as u64;
        let backward = map.remove(&(b, a)).is_some() as u64;
        forward + backward
    }
}

/// Process-local relationship store keyed by ordered pair.
///
/// Each method holds the table lock for its whole body and never awaits while
/// holding it, so the `*_atomic` operations see and leave a consistent state.
#[derive(Default)]
pub struct FriendshipRepositoryMemory {
    tables: Mutex<Tables>,
}

impl FriendshipRepositoryMemory {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, error::SystemError> {
        self.tables.lock().map_err(|e| {
            error::SystemError::InternalError(format!("relationship store poisoned: {e}").into())
        })
    }

    /// Writes a single directed friendship row, bypassing the engine.
    #[cfg(test)]
    pub(crate) fn insert_friendship_edge(&self, from: Uuid, to: Uuid) {
        let mut tables = self.tables.lock().unwrap();
        tables.friendships.insert(
            (from, to),
            FriendshipEntity { from_user_id: from, to_user_id: to, created_at: chrono::Utc::now() },
        );
    }

    #[cfg(test)]
    pub(crate) fn friendship_row_count(&self) -> usize {
        self.tables.lock().unwrap().friendships.len()
    }
}

#[async_trait::async_trait]
impl FriendshipRepository for FriendshipRepositoryMemory {
    async fn friendship_exists(
        &self,
        from: &Uuid,
        to: &Uuid,
    ) -> Result<bool, error::SystemError> {
        Ok(self.tables()?.friendships.contains_key(&(*from, *to)))
    }

    async fn find_friends(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendshipEntity>, error::SystemError> {
        let mut friends: Vec<FriendshipEntity> = self
            .tables()?
            .friendships
            .values()
            .filter(|f| f.from_user_id == *user_id)
            .cloned()
            .collect();
        friends.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(friends)
    }

    async fn find_friend_ids_from(&self, user_id: &Uuid) -> Result<Vec<Uuid>, error::SystemError> {
        Ok(self
            .tables()?
            .friendships
            .keys()
            .filter(|(from, _)| from == user_id)
            .map(|(_, to)| *to)
            .collect())
    }

    async fn find_friend_ids_to(&self, user_id: &Uuid) -> Result<Vec<Uuid>, error::SystemError> {
        Ok(self
            .tables()?
            .friendships
            .keys()
            .filter(|(_, to)| to == user_id)
            .map(|(from, _)| *from)
            .collect())
    }

    async fn delete_friendship_pair(
        &self,
        user_id_a: &Uuid,
        user_id_b: &Uuid,
    ) -> Result<u64, error::SystemError> {
        let mut tables = self.tables()?;
        Ok(Tables::remove_both(&mut tables.friendships, *user_id_a, *user_id_b))
    }
}

#[async_trait::async_trait]
impl FriendRequestRepository for FriendshipRepositoryMemory {
    async fn find_friend_request(
        &self,
        from: &Uuid,
        to: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
        Ok(self.tables()?.requests.get(&(*from, *to)).cloned())
    }

    async fn find_friend_requests_to_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendRequestEntity>, error::SystemError> {
        let mut requests: Vec<FriendRequestEntity> = self
            .tables()?
            .requests
            .values()
            .filter(|r| r.to_user_id == *user_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn find_friend_requests_from_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendRequestEntity>, error::SystemError> {
        let mut requests: Vec<FriendRequestEntity> = self
            .tables()?
            .requests
            .values()
            .filter(|r| r.from_user_id == *user_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn insert_friend_request(
        &self,
        from: &Uuid,
        to: &Uuid,
        message: &Option<String>,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
        if from == to {
            return Err(error::SystemError::SelfReference);
        }

        let mut tables = self.tables()?;
        if tables.requests.contains_key(&(*from, *to)) {
            return Ok(None);
        }

        let request = FriendRequestEntity {
            from_user_id: *from,
            to_user_id: *to,
            message: message.clone(),
            created_at: chrono::Utc::now(),
        };
        tables.requests.insert((*from, *to), request.clone());
        Ok(Some(request))
    }

    async fn delete_friend_request(
        &self,
        from: &Uuid,
        to: &Uuid,
    ) -> Result<bool, error::SystemError> {
        Ok(self.tables()?.requests.remove(&(*from, *to)).is_some())
    }
}

#[async_trait::async_trait]
impl BlockRepository for FriendshipRepositoryMemory {
    async fn block_exists(
        &self,
        blocker: &Uuid,
        blocked: &Uuid,
    ) -> Result<bool, error::SystemError> {
        Ok(self.tables()?.blocks.contains_key(&(*blocker, *blocked)))
    }

    async fn find_blocks_by(&self, blocker: &Uuid) -> Result<Vec<BlockEntity>, error::SystemError> {
        let mut blocks: Vec<BlockEntity> = self
            .tables()?
            .blocks
            .values()
            .filter(|b| b.blocker_id == *blocker)
            .cloned()
            .collect();
        blocks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(blocks)
    }

    async fn delete_block(
        &self,
        blocker: &Uuid,
        blocked: &Uuid,
    ) -> Result<bool, error::SystemError> {
        Ok(self.tables()?.blocks.remove(&(*blocker, *blocked)).is_some())
    }
}

#[async_trait::async_trait]
impl RelationshipStore for FriendshipRepositoryMemory {
    async fn accept_friend_request_atomic(
        &self,
        accepter: &Uuid,
        requester: &Uuid,
    ) -> Result<Option<(FriendshipEntity, FriendshipEntity)>, error::SystemError> {
        let mut tables = self.tables()?;

        if tables.requests.remove(&(*requester, *accepter)).is_none() {
            return Ok(None);
        }
        tables.requests.remove(&(*accepter, *requester));

        let now = chrono::Utc::now();
        let forward = tables
            .friendships
            .entry((*accepter, *requester))
            .or_insert_with(|| FriendshipEntity {
                from_user_id: *accepter,
                to_user_id: *requester,
                created_at: now,
            })
            .clone();
        let backward = tables
            .friendships
            .entry((*requester, *accepter))
            .or_insert_with(|| FriendshipEntity {
                from_user_id: *requester,
                to_user_id: *accepter,
                created_at: now,
            })
            .clone();

        Ok(Some((forward, backward)))
    }

    async fn block_atomic(
        &self,
        blocker: &Uuid,
        blocked: &Uuid,
    ) -> Result<BlockOutcome, error::SystemError> {
        if blocker == blocked {
            return Err(error::SystemError::SelfReference);
        }

        let mut tables = self.tables()?;

        let created = !tables.blocks.contains_key(&(*blocker, *blocked));
        let block = tables
            .blocks
            .entry((*blocker, *blocked))
            .or_insert_with(|| BlockEntity {
                blocker_id: *blocker,
                blocked_id: *blocked,
                created_at: chrono::Utc::now(),
            })
            .clone();

        let friendships_removed = Tables::remove_both(&mut tables.friendships, *blocker, *blocked);
        let requests_removed = Tables::remove_both(&mut tables.requests, *blocker, *blocked);

        Ok(BlockOutcome { block, created, friendships_removed, requests_removed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_request_is_insert_if_absent() {
        let store = FriendshipRepositoryMemory::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let first = store.insert_friend_request(&a, &b, &Some("hi".into())).await.unwrap();
        assert!(first.is_some());

        let second = store.insert_friend_request(&a, &b, &None).await.unwrap();
        assert!(second.is_none());

        let stored = store.find_friend_request(&a, &b).await.unwrap().unwrap();
        assert_eq!(stored.message.as_deref(), Some("hi"));

        // the reverse ordered pair is a different key
        assert!(store.insert_friend_request(&b, &a, &None).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn self_rows_are_rejected() {
        let store = FriendshipRepositoryMemory::new();
        let a = Uuid::new_v4();

        assert!(matches!(
            store.insert_friend_request(&a, &a, &None).await,
            Err(error::SystemError::SelfReference)
        ));
        assert!(matches!(store.block_atomic(&a, &a).await, Err(error::SystemError::SelfReference)));
    }

    #[tokio::test]
    async fn accept_without_request_changes_nothing() {
        let store = FriendshipRepositoryMemory::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        store.insert_friend_request(&a, &b, &None).await.unwrap();

        // b -> a was never requested, so a cannot accept it
        assert!(store.accept_friend_request_atomic(&a, &b).await.unwrap().is_none());
        assert_eq!(store.friendship_row_count(), 0);
        assert!(store.find_friend_request(&a, &b).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn accept_writes_both_rows_and_clears_requests() {
        let store = FriendshipRepositoryMemory::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        store.insert_friend_request(&a, &b, &None).await.unwrap();
        store.insert_friend_request(&b, &a, &None).await.unwrap();

        let (forward, backward) =
            store.accept_friend_request_atomic(&b, &a).await.unwrap().unwrap();
        assert_eq!((forward.from_user_id, forward.to_user_id), (b, a));
        assert_eq!((backward.from_user_id, backward.to_user_id), (a, b));

        assert!(store.find_friend_request(&a, &b).await.unwrap().is_none());
        assert!(store.find_friend_request(&b, &a).await.unwrap().is_none());
        assert_eq!(store.friendship_row_count(), 2);
    }

    #[tokio::test]
    async fn block_reports_existing_row() {
        let store = FriendshipRepositoryMemory::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let first = store.block_atomic(&a, &b).await.unwrap();
        assert!(first.created);

        let second = store.block_atomic(&a, &b).await.unwrap();
        assert!(!second.created);
        assert_eq!(second.block, first.block);
        assert_eq!(store.find_blocks_by(&a).await.unwrap().len(), 1);
    }
}
