//! Vote repository
//!
//! Casting is a single upsert-or-delete statement. Concurrent votes from the
//! same user on the same target serialize on the `(target, user_id)` primary
//! key, never on application-level locks.

use std::marker::PhantomData;
use std::time::Duration;

use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::error::DbError;
use super::query;
use super::repository::bounded;
use super::schema::Vote;
use crate::models::VoteSummary;

/// Repository over one vote table
pub struct VoteRepository<V> {
    pool: PgPool,
    timeout: Duration,
    _vote: PhantomData<fn() -> V>,
}

impl<V> Clone for VoteRepository<V> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            timeout: self.timeout,
            _vote: PhantomData,
        }
    }
}

impl<V> std::fmt::Debug for VoteRepository<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoteRepository")
            .field("vote", &std::any::type_name::<V>())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl<V: Vote> VoteRepository<V> {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self {
            pool,
            timeout,
            _vote: PhantomData,
        }
    }

    /// Set `user_id`'s vote on `target_id`. A value of 0 removes the vote.
    ///
    /// Returns the stored vote, or `None` when it was removed. Values outside
    /// -1..=1 are rejected by the store as a check constraint violation.
    pub async fn cast_vote(
        &self,
        target_id: Uuid,
        user_id: Uuid,
        vote: i16,
    ) -> Result<Option<V>, DbError> {
        let schema = V::SCHEMA;
        bounded(self.timeout, schema.table, "cast_vote", async {
            let mut qb = query::cast_vote(schema, target_id, user_id, vote);
            debug!(table = schema.table, %target_id, %user_id, vote, "cast_vote");

            let mut tx = self.pool.begin().await?;
            let row = qb.build_query_as::<V>().fetch_optional(&mut *tx).await?;
            tx.commit().await?;
            Ok::<_, DbError>(row)
        })
        .await
    }

    /// Sum of all votes on `target_id`; 0 when there are none.
    pub async fn sum_votes(&self, target_id: Uuid) -> Result<i64, DbError> {
        let schema = V::SCHEMA;
        bounded(self.timeout, schema.table, "sum_votes", async {
            let mut qb = query::sum_votes(schema, target_id);

            let mut tx = self.pool.begin().await?;
            let (sum,): (i64,) = qb.build_query_as().fetch_one(&mut *tx).await?;
            tx.commit().await?;
            Ok::<_, DbError>(sum)
        })
        .await
    }

    /// Number of stored (non-zero) votes on `target_id`.
    pub async fn count_votes(&self, target_id: Uuid) -> Result<i64, DbError> {
        let schema = V::SCHEMA;
        bounded(self.timeout, schema.table, "count_votes", async {
            let mut qb = query::count_votes(schema, target_id);

            let mut tx = self.pool.begin().await?;
            let (count,): (i64,) = qb.build_query_as().fetch_one(&mut *tx).await?;
            tx.commit().await?;
            Ok::<_, DbError>(count)
        })
        .await
    }

    /// `user_id`'s current vote on `target_id`, if any.
    pub async fn get_vote(&self, target_id: Uuid, user_id: Uuid) -> Result<Option<V>, DbError> {
        let schema = V::SCHEMA;
        bounded(self.timeout, schema.table, "get_vote", async {
            let mut qb = query::get_vote(schema, target_id, user_id);

            let mut tx = self.pool.begin().await?;
            let row = qb.build_query_as::<V>().fetch_optional(&mut *tx).await?;
            tx.commit().await?;
            Ok::<_, DbError>(row)
        })
        .await
    }

    /// Score and vote count for `target_id` in one statement.
    pub async fn summary(&self, target_id: Uuid) -> Result<VoteSummary, DbError> {
        let schema = V::SCHEMA;
        bounded(self.timeout, schema.table, "summary", async {
            let mut qb = query::vote_summary(schema, target_id);

            let mut tx = self.pool.begin().await?;
            let (score, votes): (i64, i64) = qb.build_query_as().fetch_one(&mut *tx).await?;
            tx.commit().await?;
            Ok::<_, DbError>(VoteSummary {
                target_id,
                score,
                votes,
            })
        })
        .await
    }
}
