//! Repository registry
//!
//! [`Models`] is built once at startup from an explicit pool and handed to
//! whoever needs data access. There is no process-wide handle.

use std::time::Duration;

use sqlx::PgPool;
use uuid::Uuid;

use super::error::DbError;
use super::repository::{Repository, DEFAULT_TIMEOUT};
use super::schema::{Entity, Vote};
use super::votes::VoteRepository;
use crate::models::{Forum, Post, PostVote, Thread, ThreadPatch, ThreadVote, User};

/// One repository per entity, all sharing a pool
#[derive(Debug, Clone)]
pub struct Models {
    pub users: Repository<User>,
    pub forums: Repository<Forum>,
    pub threads: Repository<Thread>,
    pub posts: Repository<Post>,
    pub thread_votes: VoteRepository<ThreadVote>,
    pub post_votes: VoteRepository<PostVote>,
}

impl Models {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self {
            users: Repository::new(pool.clone(), timeout),
            forums: Repository::new(pool.clone(), timeout),
            threads: Repository::new(pool.clone(), timeout),
            posts: Repository::new(pool.clone(), timeout),
            thread_votes: VoteRepository::new(pool.clone(), timeout),
            post_votes: VoteRepository::new(pool, timeout),
        }
    }

    /// Registry with the default per-call timeout.
    pub fn with_pool(pool: PgPool) -> Self {
        Self::new(pool, DEFAULT_TIMEOUT)
    }

    pub fn pool(&self) -> &PgPool {
        self.users.pool()
    }
}

/// Typed lookup of the repository for `E`
pub trait RepositoryFor<E: Entity> {
    fn repository(&self) -> &Repository<E>;
}

/// Typed lookup of the vote repository for `V`
pub trait VoteRepositoryFor<V: Vote> {
    fn votes(&self) -> &VoteRepository<V>;
}

macro_rules! repository_for {
    ($($entity:ty => $field:ident),* $(,)?) => {
        $(
            impl RepositoryFor<$entity> for Models {
                fn repository(&self) -> &Repository<$entity> {
                    &self.$field
                }
            }
        )*
    };
}

repository_for!(User => users, Forum => forums, Thread => threads, Post => posts);

impl VoteRepositoryFor<ThreadVote> for Models {
    fn votes(&self) -> &VoteRepository<ThreadVote> {
        &self.thread_votes
    }
}

impl VoteRepositoryFor<PostVote> for Models {
    fn votes(&self) -> &VoteRepository<PostVote> {
        &self.post_votes
    }
}

impl Repository<Thread> {
    /// Lock a thread against further changes.
    pub async fn lock(&self, id: Uuid) -> Result<Thread, DbError> {
        self.patch(&ThreadPatch::locked(id, true)).await
    }

    pub async fn unlock(&self, id: Uuid) -> Result<Thread, DbError> {
        self.patch(&ThreadPatch::locked(id, false)).await
    }
}
