//! Generic entity repository
//!
//! One engine serves every entity. Each call:
//! - checks out a transaction, runs one statement, commits
//! - drops the transaction on any early return, which rolls it back
//! - is bounded by the configured statement timeout

use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::DbError;
use super::query;
use super::schema::{Entity, Insertable, Patchable};
use crate::models::{Filter, Page};

/// Default bound on a single repository call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Repository over one entity table
pub struct Repository<E> {
    pool: PgPool,
    timeout: Duration,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            timeout: self.timeout,
            _entity: PhantomData,
        }
    }
}

impl<E> std::fmt::Debug for Repository<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("entity", &std::any::type_name::<E>())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl<E: Entity> Repository<E> {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self {
            pool,
            timeout,
            _entity: PhantomData,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Fetch one row by id, soft-deleted or not.
    pub async fn get(&self, id: Uuid) -> Result<E, DbError> {
        let schema = E::SCHEMA;
        self.bounded("get", async {
            let mut qb = query::select_by_id(schema, id);
            debug!(table = schema.table, %id, sql = qb.sql(), "get");

            let mut tx = self.pool.begin().await?;
            let row = qb.build_query_as::<E>().fetch_optional(&mut *tx).await?;
            tx.commit().await?;

            row.ok_or_else(|| DbError::not_found(schema.resource, id))
        })
        .await
    }

    /// One page of rows matching `filter`, after `filter.last_seen`.
    ///
    /// The cursor is always an id: the next page keeps `id > last_seen`,
    /// where `last_seen` is the id of this page's last row. A custom
    /// `order_by` sorts the rows but not the cursor, so walking pages in a
    /// custom order can permanently skip rows. With `-title` and a page
    /// size of 2, a row whose id is below the first page's last id but
    /// whose title sorts after that page is never returned. Use the
    /// default order to enumerate every row.
    pub async fn list(&self, filter: &Filter) -> Result<Page<E>, DbError> {
        let schema = E::SCHEMA;
        filter.validate(schema)?;

        self.bounded("list", async {
            let mut qb = query::select_page(schema, filter)?;
            debug!(table = schema.table, cursor = %filter.last_seen, sql = qb.sql(), "list");

            let mut tx = self.pool.begin().await?;
            let rows = qb.build_query_as::<E>().fetch_all(&mut *tx).await?;
            tx.commit().await?;

            let page = Page::from_rows(rows, filter.page_size, filter.last_seen, E::id);
            debug!(
                table = schema.table,
                rows = page.metadata.response_length,
                next = page.metadata.next,
                "listed"
            );
            Ok::<_, DbError>(page)
        })
        .await
    }

    /// Number of rows matching `filter`, ignoring cursor and page size.
    pub async fn count(&self, filter: &Filter) -> Result<i64, DbError> {
        let schema = E::SCHEMA;
        filter.validate(schema)?;

        self.bounded("count", async {
            let mut qb = query::count(schema, filter);
            debug!(table = schema.table, sql = qb.sql(), "count");

            let mut tx = self.pool.begin().await?;
            let (count,): (i64,) = qb.build_query_as().fetch_one(&mut *tx).await?;
            tx.commit().await?;
            Ok::<_, DbError>(count)
        })
        .await
    }

    /// Insert a new row and return it with its generated fields.
    pub async fn create<I>(&self, input: &I) -> Result<E, DbError>
    where
        I: Insertable<Entity = E>,
    {
        let schema = E::SCHEMA;
        input.validate()?;

        // Time-ordered ids keep default cursor order equal to insertion order.
        let id = Uuid::now_v7();
        let values = input.values();

        self.bounded("create", async {
            let mut qb = query::insert(schema, id, &values);
            debug!(table = schema.table, %id, sql = qb.sql(), "create");

            let mut tx = self.pool.begin().await?;
            let row = qb.build_query_as::<E>().fetch_one(&mut *tx).await?;
            tx.commit().await?;
            Ok::<_, DbError>(row)
        })
        .await
    }

    /// Update only the fields present in `patch`; `updated_at` always moves.
    pub async fn patch<P>(&self, patch: &P) -> Result<E, DbError>
    where
        P: Patchable<Entity = E>,
    {
        let schema = E::SCHEMA;
        patch.validate()?;

        let id = patch.id();
        let assignments = patch.assignments();

        self.bounded("patch", async {
            let mut qb = query::update(schema, id, &assignments);
            debug!(
                table = schema.table,
                %id,
                fields = assignments.len(),
                sql = qb.sql(),
                "patch"
            );
            self.fetch_by_id(&mut qb, id).await
        })
        .await
    }

    /// Mark a row deleted; it stays readable by id.
    pub async fn soft_delete(&self, id: Uuid) -> Result<E, DbError> {
        let schema = E::SCHEMA;
        self.bounded("soft_delete", async {
            let mut qb = query::soft_delete(schema, id);
            debug!(table = schema.table, %id, "soft_delete");
            self.fetch_by_id(&mut qb, id).await
        })
        .await
    }

    /// Clear the deleted flag and timestamp.
    pub async fn restore(&self, id: Uuid) -> Result<E, DbError> {
        let schema = E::SCHEMA;
        self.bounded("restore", async {
            let mut qb = query::restore(schema, id);
            debug!(table = schema.table, %id, "restore");
            self.fetch_by_id(&mut qb, id).await
        })
        .await
    }

    /// Permanently remove a row, returning its last values.
    pub async fn hard_delete(&self, id: Uuid) -> Result<E, DbError> {
        let schema = E::SCHEMA;
        self.bounded("hard_delete", async {
            let mut qb = query::hard_delete(schema, id);
            debug!(table = schema.table, %id, "hard_delete");
            self.fetch_by_id(&mut qb, id).await
        })
        .await
    }

    /// Run a `... WHERE id = $n RETURNING` statement in its own transaction.
    async fn fetch_by_id(&self, qb: &mut query::Query, id: Uuid) -> Result<E, DbError> {
        let mut tx = self.pool.begin().await?;
        let row = qb.build_query_as::<E>().fetch_optional(&mut *tx).await?;
        match row {
            Some(row) => {
                tx.commit().await?;
                Ok(row)
            }
            None => Err(DbError::not_found(E::SCHEMA.resource, id)),
        }
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, DbError>
    where
        F: Future<Output = Result<T, DbError>>,
    {
        bounded(self.timeout, E::SCHEMA.table, op, fut).await
    }
}

/// Bound `fut` by `timeout`, mapping expiry to [`DbError::Timeout`].
pub(crate) async fn bounded<T, F>(
    timeout: Duration,
    table: &'static str,
    op: &'static str,
    fut: F,
) -> Result<T, DbError>
where
    F: Future<Output = Result<T, DbError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(table, op, ?timeout, "database operation timed out");
            Err(DbError::Timeout(timeout))
        }
    }
}
