//! Entity schema descriptions
//!
//! One [`TableSchema`] per entity drives the generic repository engine:
//! the engine never needs per-entity SQL, it only reads identifiers from
//! these static descriptions. Identifiers here are compile-time constants,
//! which is what makes it safe to interpolate them.

use sqlx::postgres::PgRow;
use sqlx::FromRow;
use uuid::Uuid;

use super::value::{ColumnType, SqlValue};
use crate::models::ValidationError;

/// Filterable column with its storage type
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
}

impl Column {
    pub const fn new(name: &'static str, ty: ColumnType) -> Self {
        Self { name, ty }
    }
}

/// Static description of an entity table
#[derive(Debug)]
pub struct TableSchema {
    /// Schema-qualified table name, e.g. `forum.users`
    pub table: &'static str,
    /// Alias used in every statement; select expressions may refer to it
    pub alias: &'static str,
    /// Singular resource label for errors and logs
    pub resource: &'static str,
    /// Select list, shared by SELECT and RETURNING clauses
    pub select: &'static str,
    /// Columns a [`Filter`](crate::models::Filter) may constrain
    pub filterable: &'static [Column],
    /// Columns that may appear in ORDER BY
    pub sortable: &'static [&'static str],
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.filterable.iter().find(|c| c.name == name)
    }

    pub fn is_sortable(&self, name: &str) -> bool {
        self.sortable.contains(&name)
    }
}

/// Static description of a vote table
#[derive(Debug)]
pub struct VoteSchema {
    pub table: &'static str,
    /// Column holding the voted-on entity id (`thread_id`, `post_id`)
    pub target_column: &'static str,
    pub resource: &'static str,
}

/// A row type managed by [`Repository`](super::Repository)
pub trait Entity: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static {
    const SCHEMA: &'static TableSchema;

    fn id(&self) -> Uuid;
}

/// Payload for inserting a new entity row
pub trait Insertable: Send + Sync {
    type Entity: Entity;

    /// Column/value pairs to insert. `id` and timestamps are never listed.
    fn values(&self) -> Vec<(&'static str, SqlValue)>;

    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Partial update payload; only supplied fields are assigned
pub trait Patchable: Send + Sync {
    type Entity: Entity;

    fn id(&self) -> Uuid;

    /// Target a row, e.g. from a request path.
    fn set_id(&mut self, id: Uuid);

    /// Assignments for the fields present in the patch.
    fn assignments(&self) -> Vec<(&'static str, SqlValue)>;

    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// A vote row managed by [`VoteRepository`](super::VoteRepository)
pub trait Vote: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static {
    const SCHEMA: &'static VoteSchema;

    fn target_id(&self) -> Uuid;
}

/// `{select} FROM {table} AS {alias}`
pub(crate) fn from_clause(schema: &TableSchema) -> String {
    format!("{} FROM {} AS {}", schema.select, schema.table, schema.alias)
}
