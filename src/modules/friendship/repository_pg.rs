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

#[derive(Clone)]
pub struct FriendshipRepositoryPg {
    pool: sqlx::PgPool,
}

impl FriendshipRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    /// Locks the pending requests of an unordered pair in key order.
    ///
    /// Every transaction that rewrites a pair's relationship takes this lock
    /// first, so crossed writers queue on the lowest key instead of holding
    /// one row each.
    async fn lock_pair_requests(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_id_a: &Uuid,
        user_id_b: &Uuid,
    ) -> Result<Vec<FriendRequestEntity>, error::SystemError> {
        let requests = sqlx::query_as::<_, FriendRequestEntity>(
            r#"
            SELECT * FROM friendship_requests
            WHERE (from_user_id, to_user_id) IN (($1, $2), ($2, $1))
            ORDER BY from_user_id, to_user_id
            FOR UPDATE
            "#,
        )
        .bind(user_id_a)
        .bind(user_id_b)
        .fetch_all(&mut **tx)
        .await?;

        Ok(requests)
    }
}

#[async_trait::async_trait]
impl FriendshipRepository for FriendshipRepositoryPg {
    async fn friendship_exists(
        &self,
        from: &Uuid,
        to: &Uuid,
    ) -> Result<bool, error::SystemError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM friendships WHERE from_user_id = $1 AND to_user_id = $2)",
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn find_friends(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendshipEntity>, error::SystemError> {
        let friends = sqlx::query_as::<_, FriendshipEntity>(
            "SELECT * FROM friendships WHERE from_user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(friends)
    }

    async fn find_friend_ids_from(&self, user_id: &Uuid) -> Result<Vec<Uuid>, error::SystemError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT to_user_id FROM friendships WHERE from_user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn find_friend_ids_to(&self, user_id: &Uuid) -> Result<Vec<Uuid>, error::SystemError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT from_user_id FROM friendships WHERE to_user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn delete_friendship_pair(
        &self,
        user_id_a: &Uuid,
        user_id_b: &Uuid,
    ) -> Result<u64, error::SystemError> {
        let rows = sqlx::query(
            r#"
            DELETE FROM friendships
            WHERE (from_user_id = $1 AND to_user_id = $2)
               OR (from_user_id = $2 AND to_user_id = $1)
            "#,
        )
        .bind(user_id_a)
        .bind(user_id_b)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows)
    }
}

#[async_trait::async_trait]
impl FriendRequestRepository for FriendshipRepositoryPg {
    async fn find_friend_request(
        &self,
        from: &Uuid,
        to: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
        let request = sqlx::query_as::<_, FriendRequestEntity>(
            "SELECT * FROM friendship_requests WHERE from_user_id = $1 AND to_user_id = $2",
        )
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn find_friend_requests_to_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendRequestEntity>, error::SystemError> {
        let requests = sqlx::query_as::<_, FriendRequestEntity>(
            "SELECT * FROM friendship_requests WHERE to_user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    async fn find_friend_requests_from_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendRequestEntity>, error::SystemError> {
        let requests = sqlx::query_as::<_, FriendRequestEntity>(
            "SELECT * FROM friendship_requests WHERE from_user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    async fn insert_friend_request(
        &self,
        from: &Uuid,
        to: &Uuid,
        message: &Option<String>,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
        let request = sqlx::query_as::<_, FriendRequestEntity>(
            r#"
            INSERT INTO friendship_requests (from_user_id, to_user_id, message)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            RETURNING *
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(message)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn delete_friend_request(
        &self,
        from: &Uuid,
        to: &Uuid,
    ) -> Result<bool, error::SystemError> {
        let rows = sqlx::query(
            "DELETE FROM friendship_requests WHERE from_user_id = $1 AND to_user_id = $2",
        )
        .bind(from)
        .bind(to)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows > 0)
    }
}

#[async_trait::async_trait]
impl BlockRepository for FriendshipRepositoryPg {
    async fn block_exists(
        &self,
        blocker: &Uuid,
        blocked: &Uuid,
    ) -> Result<bool, error::SystemError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM blocks WHERE blocker_id = $1 AND blocked_id = $2)",
        )
        .bind(blocker)
        .bind(blocked)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn find_blocks_by(&self, blocker: &Uuid) -> Result<Vec<BlockEntity>, error::SystemError> {
        let blocks = sqlx::query_as::<_, BlockEntity>(
            "SELECT * FROM blocks WHERE blocker_id = $1 ORDER BY created_at DESC",
        )
        .bind(blocker)
        .fetch_all(&self.pool)
        .await?;

        Ok(blocks)
    }

    async fn delete_block(
        &self,
        blocker: &Uuid,
        blocked: &Uuid,
    ) -> Result<bool, error::SystemError> {
        let rows = sqlx::query("DELETE FROM blocks WHERE blocker_id = $1 AND blocked_id = $2")
            .bind(blocker)
            .bind(blocked)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows > 0)
    }
}

#[async_trait::async_trait]
impl RelationshipStore for FriendshipRepositoryPg {
    async fn accept_friend_request_atomic(
        &self,
        accepter: &Uuid,
        requester: &Uuid,
    ) -> Result<Option<(FriendshipEntity, FriendshipEntity)>, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        let pending = Self::lock_pair_requests(&mut tx, requester, accepter).await?;
        let requested =
            pending.iter().any(|r| r.from_user_id == *requester && r.to_user_id == *accepter);

        if !requested {
            tx.rollback().await?;
            return Ok(None);
        }

        sqlx::query(
            r#"
            INSERT INTO friendships (from_user_id, to_user_id)
            VALUES ($1, $2), ($2, $1)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(accepter)
        .bind(requester)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            DELETE FROM friendship_requests
            WHERE (from_user_id = $1 AND to_user_id = $2)
               OR (from_user_id = $2 AND to_user_id = $1)
            "#,
        )
        .bind(requester)
        .bind(accepter)
        .execute(&mut *tx)
        .await?;

        let forward = sqlx::query_as::<_, FriendshipEntity>(
            "SELECT * FROM friendships WHERE from_user_id = $1 AND to_user_id = $2",
        )
        .bind(accepter)
        .bind(requester)
        .fetch_one(&mut *tx)
        .await?;

        let backward = sqlx::query_as::<_, FriendshipEntity>(
            "SELECT * FROM friendships WHERE from_user_id = $1 AND to_user_id = $2",
        )
        .bind(requester)
        .bind(accepter)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some((forward, backward)))
    }

    async fn block_atomic(
        &self,
        blocker: &Uuid,
        blocked: &Uuid,
    ) -> Result<BlockOutcome, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        Self::lock_pair_requests(&mut tx, blocker, blocked).await?;

        let inserted = sqlx::query_as::<_, BlockEntity>(
            r#"
            INSERT INTO blocks (blocker_id, blocked_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            RETURNING *
            "#,
        )
        .bind(blocker)
        .bind(blocked)
        .fetch_optional(&mut *tx)
        .await?;

        let created = inserted.is_some();
        let block = match inserted {
            Some(block) => block,
            None => {
                sqlx::query_as::<_, BlockEntity>(
                    "SELECT * FROM blocks WHERE blocker_id = $1 AND blocked_id = $2",
                )
                .bind(blocker)
                .bind(blocked)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        let friendships_removed = sqlx::query(
            r#"
            DELETE FROM friendships
            WHERE (from_user_id = $1 AND to_user_id = $2)
               OR (from_user_id = $2 AND to_user_id = $1)
            "#,
        )
        .bind(blocker)
        .bind(blocked)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let requests_removed = sqlx::query(
            r#"
            DELETE FROM friendship_requests
            WHERE (from_user_id = $1 AND to_user_id = $2)
               OR (from_user_id = $2 AND to_user_id = $1)
            "#,
        )
        .bind(blocker)
        .bind(blocked)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        Ok(BlockOutcome { block, created, friendships_removed, requests_removed })
    }
}
