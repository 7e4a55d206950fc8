//! Database layer - connection pool, migrations and repositories
//!
//! # Design Principles
//!
//! - One generic engine over static table schemas, not per-entity SQL
//! - Pool handle passed in explicitly; no global connection
//! - Keyset pagination on `id`, never OFFSET
//! - Rely on DB constraints, handle conflicts - no check-then-insert
//! - One transaction per call, bounded by a timeout

pub mod details;
pub mod error;
pub mod migrations;
pub mod pool;
pub(crate) mod query;
pub mod registry;
pub mod repository;
pub mod schema;
pub mod value;
pub mod votes;

pub use details::{Detailed, ForumDetails, PostDetails, ThreadDetails};
pub use error::{ConstraintKind, DbError};
pub use pool::{create_pool, create_pool_from_config};
pub use registry::{Models, RepositoryFor, VoteRepositoryFor};
pub use repository::{Repository, DEFAULT_TIMEOUT};
pub use schema::{Entity, Insertable, Patchable, TableSchema, Vote, VoteSchema};
pub use value::{ColumnType, SqlValue};
pub use votes::VoteRepository;
