//! Entity reads with related data included
//!
//! The primary row is fetched first and its failure fails the call. Related
//! lookups then run concurrently; a related row that no longer exists shows
//! up as `None`, any other error is returned.
//!
//! Listings with related data fetch the page first, then include each row
//! in page order. Users have nothing to include and list as plain rows.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::error::DbError;
use super::registry::Models;
use super::schema::Entity;
use crate::models::{Filter, Forum, Page, Post, Thread, User};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumDetails {
    #[serde(flatten)]
    pub forum: Forum,
    pub owner: Option<User>,
    pub thread_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadDetails {
    #[serde(flatten)]
    pub thread: Thread,
    pub author: Option<User>,
    pub forum: Option<Forum>,
    pub votes: i64,
    pub post_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetails {
    #[serde(flatten)]
    pub post: Post,
    pub author: Option<User>,
    pub votes: i64,
}

/// Turn a missing related row into `None`.
fn related<T>(result: Result<T, DbError>) -> Result<Option<T>, DbError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_not_found() => {
            warn!(error = %err, "related row missing");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Await every row's include in page order, keeping the page metadata.
async fn collect<T, F>(page: Page<F>) -> Result<Page<T>, DbError>
where
    F: Future<Output = Result<T, DbError>>,
{
    let mut data = Vec::with_capacity(page.data.len());
    for pending in page.data {
        data.push(pending.await?);
    }
    Ok(Page {
        data,
        metadata: page.metadata,
    })
}

impl Models {
    /// Forum with its owner and thread count.
    pub async fn forum_details(&self, id: Uuid) -> Result<ForumDetails, DbError> {
        let forum = self.forums.get(id).await?;
        self.include_forum(forum).await
    }

    /// Thread with its author, forum, vote sum and post count.
    pub async fn thread_details(&self, id: Uuid) -> Result<ThreadDetails, DbError> {
        let thread = self.threads.get(id).await?;
        self.include_thread(thread).await
    }

    /// Post with its author and vote sum.
    pub async fn post_details(&self, id: Uuid) -> Result<PostDetails, DbError> {
        let post = self.posts.get(id).await?;
        self.include_post(post).await
    }

    /// One page of forums, each with its owner and thread count.
    pub async fn list_forum_details(&self, filter: &Filter) -> Result<Page<ForumDetails>, DbError> {
        let page = self.forums.list(filter).await?;
        collect(page.map(|forum| self.include_forum(forum))).await
    }

    /// One page of threads, each with author, forum, votes and post count.
    pub async fn list_thread_details(
        &self,
        filter: &Filter,
    ) -> Result<Page<ThreadDetails>, DbError> {
        let page = self.threads.list(filter).await?;
        collect(page.map(|thread| self.include_thread(thread))).await
    }

    /// One page of posts, each with its author and vote sum.
    pub async fn list_post_details(&self, filter: &Filter) -> Result<Page<PostDetails>, DbError> {
        let page = self.posts.list(filter).await?;
        collect(page.map(|post| self.include_post(post))).await
    }

    async fn include_forum(&self, forum: Forum) -> Result<ForumDetails, DbError> {
        let threads_in_forum = Filter::new().eq("forum_id", forum.id);
        let (owner, thread_count) = tokio::try_join!(
            async { related(self.users.get(forum.owner_id).await) },
            self.threads.count(&threads_in_forum),
        )?;

        Ok(ForumDetails {
            forum,
            owner,
            thread_count,
        })
    }

    async fn include_thread(&self, thread: Thread) -> Result<ThreadDetails, DbError> {
        let posts_in_thread = Filter::new().eq("thread_id", thread.id);
        let (author, forum, votes, post_count) = tokio::try_join!(
            async { related(self.users.get(thread.author_id).await) },
            async { related(self.forums.get(thread.forum_id).await) },
            self.thread_votes.sum_votes(thread.id),
            self.posts.count(&posts_in_thread),
        )?;

        Ok(ThreadDetails {
            thread,
            author,
            forum,
            votes,
            post_count,
        })
    }

    async fn include_post(&self, post: Post) -> Result<PostDetails, DbError> {
        let (author, votes) = tokio::try_join!(
            async { related(self.users.get(post.author_id).await) },
            self.post_votes.sum_votes(post.id),
        )?;

        Ok(PostDetails {
            post,
            author,
            votes,
        })
    }
}

/// Entities that can be listed with related data included
pub trait Detailed: Entity {
    type Details: Serialize + Send;

    fn list_details<'a>(
        models: &'a Models,
        filter: &'a Filter,
    ) -> impl Future<Output = Result<Page<Self::Details>, DbError>> + Send + 'a;
}

impl Detailed for User {
    type Details = User;

    fn list_details<'a>(
        models: &'a Models,
        filter: &'a Filter,
    ) -> impl Future<Output = Result<Page<User>, DbError>> + Send + 'a {
        models.users.list(filter)
    }
}

impl Detailed for Forum {
    type Details = ForumDetails;

    fn list_details<'a>(
        models: &'a Models,
        filter: &'a Filter,
    ) -> impl Future<Output = Result<Page<ForumDetails>, DbError>> + Send + 'a {
        models.list_forum_details(filter)
    }
}

impl Detailed for Thread {
    type Details = ThreadDetails;

    fn list_details<'a>(
        models: &'a Models,
        filter: &'a Filter,
    ) -> impl Future<Output = Result<Page<ThreadDetails>, DbError>> + Send + 'a {
        models.list_thread_details(filter)
    }
}

impl Detailed for Post {
    type Details = PostDetails;

    fn list_details<'a>(
        models: &'a Models,
        filter: &'a Filter,
    ) -> impl Future<Output = Result<Page<PostDetails>, DbError>> + Send + 'a {
        models.list_post_details(filter)
    }
}
