//! Repository tests against a live PostgreSQL
//!
//! Run with: DATABASE_URL=postgres://... cargo test -p rosetta-server -- --ignored
//!
//! Every test creates its own users and forum, so tests can share one
//! database and run concurrently.

use std::time::Duration;

use sqlx::PgPool;
use tokio::sync::OnceCell;
use uuid::Uuid;

use rosetta_server::db::{migrations, ConstraintKind, DbError, Models};
use rosetta_server::models::{
    Filter, Forum, ForumInput, ForumPatch, Post, PostInput, PostPatch, Thread, ThreadInput,
    ThreadPatch, User, UserInput, UserPatch,
};

static MIGRATED: OnceCell<()> = OnceCell::const_new();

async fn models() -> Models {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
    let pool = PgPool::connect(&url).await.expect("pool creation failed");
    MIGRATED
        .get_or_init(|| async {
            migrations::run(&pool).await.expect("migrations failed");
        })
        .await;
    Models::with_pool(pool)
}

fn user_input() -> UserInput {
    let tag = Uuid::now_v7().simple().to_string();
    UserInput {
        name: "Test User".into(),
        username: format!("u_{tag}"),
        email: format!("{tag}@example.com"),
    }
}

async fn user(models: &Models) -> User {
    models.users.create(&user_input()).await.unwrap()
}

async fn forum(models: &Models, owner: &User) -> Forum {
    models
        .forums
        .create(&ForumInput {
            owner_id: owner.id,
            name: "general".into(),
            description: None,
        })
        .await
        .unwrap()
}

async fn thread(models: &Models, forum: &Forum, author: &User, title: &str) -> Thread {
    models
        .threads
        .create(&ThreadInput {
            forum_id: forum.id,
            author_id: author.id,
            title: title.into(),
        })
        .await
        .unwrap()
}

async fn post(models: &Models, thread: &Thread, author: &User, reply_to: Option<Uuid>) -> Post {
    models
        .posts
        .create(&PostInput {
            thread_id: thread.id,
            reply_to,
            author_id: author.id,
            content: "hello".into(),
        })
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "requires database"]
async fn create_then_get_returns_same_row() {
    let models = models().await;
    let input = user_input();
    let created = models.users.create(&input).await.unwrap();

    assert_eq!(created.username, input.username);
    assert!(!created.deleted);
    assert!(created.deleted_at.is_none());

    let fetched = models.users.get(created.id).await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
#[ignore = "requires database"]
async fn get_unknown_id_is_not_found() {
    let models = models().await;
    let err = models.forums.get(Uuid::now_v7()).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
#[ignore = "requires database"]
async fn patch_changes_only_supplied_fields() {
    let models = models().await;
    let created = user(&models).await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    let patched = models
        .users
        .patch(&UserPatch {
            id: created.id,
            name: Some("Renamed".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(patched.name, "Renamed");
    assert_eq!(patched.username, created.username);
    assert_eq!(patched.email, created.email);
    assert_eq!(patched.created_at, created.created_at);
    assert!(patched.updated_at > created.updated_at);
}

#[tokio::test]
#[ignore = "requires database"]
async fn empty_patch_still_touches_row() {
    let models = models().await;
    let owner = user(&models).await;
    let created = forum(&models, &owner).await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    let patched = models
        .forums
        .patch(&ForumPatch {
            id: created.id,
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(patched.name, created.name);
    assert!(patched.updated_at > created.updated_at);
}

#[tokio::test]
#[ignore = "requires database"]
async fn patch_unknown_id_is_not_found() {
    let models = models().await;
    let err = models
        .users
        .patch(&UserPatch {
            id: Uuid::now_v7(),
            name: Some("Ghost".into()),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
#[ignore = "requires database"]
async fn soft_delete_and_restore_are_repeatable() {
    let models = models().await;
    let created = user(&models).await;

    let deleted = models.users.soft_delete(created.id).await.unwrap();
    assert!(deleted.deleted);
    assert!(deleted.deleted_at.is_some());

    let again = models.users.soft_delete(created.id).await.unwrap();
    assert!(again.deleted);

    // Still readable by id
    assert!(models.users.get(created.id).await.unwrap().deleted);

    let restored = models.users.restore(created.id).await.unwrap();
    assert!(!restored.deleted);
    assert!(restored.deleted_at.is_none());

    let restored = models.users.restore(created.id).await.unwrap();
    assert!(!restored.deleted);
}

#[tokio::test]
#[ignore = "requires database"]
async fn hard_delete_removes_row() {
    let models = models().await;
    let created = user(&models).await;

    let removed = models.users.hard_delete(created.id).await.unwrap();
    assert_eq!(removed.id, created.id);

    assert!(models.users.get(created.id).await.unwrap_err().is_not_found());
    assert!(models
        .users
        .hard_delete(created.id)
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
#[ignore = "requires database"]
async fn pages_are_disjoint_and_increasing() {
    let models = models().await;
    let author = user(&models).await;
    let forum = forum(&models, &author).await;
    for i in 0..5 {
        thread(&models, &forum, &author, &format!("thread {i}")).await;
    }

    let mut filter = Filter::new().eq("forum_id", forum.id).page_size(2);
    let mut seen = Vec::new();
    let mut nexts = Vec::new();
    loop {
        let page = models.threads.list(&filter).await.unwrap();
        seen.extend(page.data.iter().map(|t| t.id));
        nexts.push(page.metadata.next);
        if !page.metadata.next {
            break;
        }
        filter = filter.after(page.metadata.last_seen);
    }

    assert_eq!(seen.len(), 5);
    assert!(seen.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(nexts, vec![true, true, false]);

    // Past the end: empty page, cursor unchanged
    let last = *seen.last().unwrap();
    let page = models.threads.list(&filter.after(last)).await.unwrap();
    assert!(page.data.is_empty());
    assert!(!page.metadata.next);
    assert_eq!(page.metadata.last_seen, last);
}

#[tokio::test]
#[ignore = "requires database"]
async fn list_filters_and_counts() {
    let models = models().await;
    let author = user(&models).await;
    let forum = forum(&models, &author).await;
    let kept = thread(&models, &forum, &author, "kept").await;
    let gone = thread(&models, &forum, &author, "gone").await;
    models.threads.soft_delete(gone.id).await.unwrap();

    let live = Filter::new()
        .eq("forum_id", forum.id)
        .eq("deleted", false)
        .page_size(10);
    let page = models.threads.list(&live).await.unwrap();
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].id, kept.id);

    let all = Filter::new().eq("forum_id", forum.id);
    assert_eq!(models.threads.count(&all).await.unwrap(), 2);
    assert_eq!(models.threads.count(&live).await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires database"]
async fn custom_order_sorts_within_page() {
    let models = models().await;
    let author = user(&models).await;
    let forum = forum(&models, &author).await;
    for title in ["b", "c", "a"] {
        thread(&models, &forum, &author, title).await;
    }

    let filter = Filter::new()
        .eq("forum_id", forum.id)
        .order_by(["-title"])
        .page_size(10);
    let page = models.threads.list(&filter).await.unwrap();
    let titles: Vec<_> = page.data.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["c", "b", "a"]);
}

#[tokio::test]
#[ignore = "requires database"]
async fn invalid_filter_never_reaches_database() {
    let models = models().await;
    let err = models
        .users
        .list(&Filter::new().eq("password", "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidFilter(_)));
}

#[tokio::test]
#[ignore = "requires database"]
async fn missing_owner_is_foreign_key_violation() {
    let models = models().await;
    let err = models
        .forums
        .create(&ForumInput {
            owner_id: Uuid::now_v7(),
            name: "orphan".into(),
            description: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.constraint_kind(), Some(ConstraintKind::ForeignKey));
}

#[tokio::test]
#[ignore = "requires database"]
async fn duplicate_username_is_unique_violation() {
    let models = models().await;
    let input = user_input();
    models.users.create(&input).await.unwrap();

    let dup = UserInput {
        email: format!("{}@example.com", Uuid::now_v7().simple()),
        ..input
    };
    let err = models.users.create(&dup).await.unwrap_err();
    assert_eq!(err.constraint_kind(), Some(ConstraintKind::Unique));
}

#[tokio::test]
#[ignore = "requires database"]
async fn votes_sum_and_zero_removes() {
    let models = models().await;
    let author = user(&models).await;
    let forum = forum(&models, &author).await;
    let thread = thread(&models, &forum, &author, "vote on me").await;

    let voters = [user(&models).await, user(&models).await, user(&models).await];
    for (voter, vote) in voters.iter().zip([1, 1, -1]) {
        let stored = models
            .thread_votes
            .cast_vote(thread.id, voter.id, vote)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.vote, vote);
    }

    assert_eq!(models.thread_votes.sum_votes(thread.id).await.unwrap(), 1);
    assert_eq!(models.threads.get(thread.id).await.unwrap().likes, 1);

    // Re-voting replaces rather than adds
    models
        .thread_votes
        .cast_vote(thread.id, voters[2].id, 1)
        .await
        .unwrap();
    assert_eq!(models.thread_votes.sum_votes(thread.id).await.unwrap(), 3);

    let removed = models
        .thread_votes
        .cast_vote(thread.id, voters[0].id, 0)
        .await
        .unwrap();
    assert!(removed.is_none());
    assert!(models
        .thread_votes
        .get_vote(thread.id, voters[0].id)
        .await
        .unwrap()
        .is_none());

    let summary = models.thread_votes.summary(thread.id).await.unwrap();
    assert_eq!(summary.score, 2);
    assert_eq!(summary.votes, 2);
}

#[tokio::test]
#[ignore = "requires database"]
async fn vote_outside_range_is_check_violation() {
    let models = models().await;
    let author = user(&models).await;
    let forum = forum(&models, &author).await;
    let thread = thread(&models, &forum, &author, "t").await;
    let post = post(&models, &thread, &author, None).await;

    let err = models
        .post_votes
        .cast_vote(post.id, author.id, 5)
        .await
        .unwrap_err();
    assert_eq!(err.constraint_kind(), Some(ConstraintKind::Check));
}

#[tokio::test]
#[ignore = "requires database"]
async fn sum_without_votes_is_zero() {
    let models = models().await;
    assert_eq!(models.post_votes.sum_votes(Uuid::now_v7()).await.unwrap(), 0);
    assert_eq!(models.post_votes.count_votes(Uuid::now_v7()).await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires database"]
async fn details_collect_related_rows() {
    let models = models().await;
    let owner = user(&models).await;
    let forum = forum(&models, &owner).await;
    let thread = thread(&models, &forum, &owner, "details").await;
    let first = post(&models, &thread, &owner, None).await;
    let reply = post(&models, &thread, &owner, Some(first.id)).await;
    models
        .post_votes
        .cast_vote(reply.id, owner.id, 1)
        .await
        .unwrap();

    let forum_details = models.forum_details(forum.id).await.unwrap();
    assert_eq!(forum_details.owner.map(|u| u.id), Some(owner.id));
    assert_eq!(forum_details.thread_count, 1);

    let thread_details = models.thread_details(thread.id).await.unwrap();
    assert_eq!(thread_details.post_count, 2);
    assert_eq!(thread_details.forum.map(|f| f.id), Some(forum.id));

    let post_details = models.post_details(reply.id).await.unwrap();
    assert_eq!(post_details.post.reply_to, Some(first.id));
    assert_eq!(post_details.votes, 1);

    assert!(models
        .post_details(Uuid::now_v7())
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
#[ignore = "requires database"]
async fn listed_details_follow_the_page() {
    let models = models().await;
    let owner = user(&models).await;
    let forum = forum(&models, &owner).await;
    let first = thread(&models, &forum, &owner, "one").await;
    let second = thread(&models, &forum, &owner, "two").await;
    let third = thread(&models, &forum, &owner, "three").await;
    post(&models, &first, &owner, None).await;
    models
        .thread_votes
        .cast_vote(second.id, owner.id, -1)
        .await
        .unwrap();

    let filter = Filter::new().eq("forum_id", forum.id).page_size(2);
    let plain = models.threads.list(&filter).await.unwrap();
    let page = models.list_thread_details(&filter).await.unwrap();

    assert_eq!(page.metadata, plain.metadata);
    assert!(page.metadata.next);
    let mut expected = vec![first.id, second.id, third.id];
    expected.sort();
    let ids: Vec<_> = page.data.iter().map(|d| d.thread.id).collect();
    assert_eq!(ids, expected[..2]);

    for details in &page.data {
        let (posts, votes) = match details.thread.id {
            id if id == first.id => (1, 0),
            id if id == second.id => (0, -1),
            _ => (0, 0),
        };
        assert_eq!(details.post_count, posts);
        assert_eq!(details.votes, votes);
        assert_eq!(details.author.as_ref().map(|u| u.id), Some(owner.id));
        assert_eq!(details.forum.as_ref().map(|f| f.id), Some(forum.id));
    }

    let forums = models
        .list_forum_details(&Filter::new().eq("id", forum.id))
        .await
        .unwrap();
    assert_eq!(forums.data.len(), 1);
    assert_eq!(forums.data[0].thread_count, 3);
    assert!(!forums.metadata.next);
}

#[tokio::test]
#[ignore = "requires database"]
async fn forum_round_trips_and_patches_one_field() {
    let models = models().await;
    let owner = user(&models).await;
    let created = forum(&models, &owner).await;
    assert_eq!(models.forums.get(created.id).await.unwrap(), created);
    tokio::time::sleep(Duration::from_millis(10)).await;

    let patched = models
        .forums
        .patch(&ForumPatch {
            id: created.id,
            name: Some("renamed".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(patched.name, "renamed");
    assert_eq!(patched.owner_id, created.owner_id);
    assert_eq!(patched.description, created.description);
    assert_eq!(patched.created_at, created.created_at);
    assert!(patched.updated_at > created.updated_at);
    assert_eq!(models.forums.get(created.id).await.unwrap(), patched);
}

#[tokio::test]
#[ignore = "requires database"]
async fn thread_round_trips_and_patches_one_field() {
    let models = models().await;
    let author = user(&models).await;
    let forum = forum(&models, &author).await;
    let created = thread(&models, &forum, &author, "before").await;
    assert_eq!(models.threads.get(created.id).await.unwrap(), created);
    tokio::time::sleep(Duration::from_millis(10)).await;

    let patched = models
        .threads
        .patch(&ThreadPatch {
            id: created.id,
            title: Some("after".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(patched.title, "after");
    assert_eq!(patched.forum_id, created.forum_id);
    assert_eq!(patched.author_id, created.author_id);
    assert_eq!(patched.is_locked, created.is_locked);
    assert_eq!(patched.likes, created.likes);
    assert_eq!(patched.created_at, created.created_at);
    assert!(patched.updated_at > created.updated_at);
    assert_eq!(models.threads.get(created.id).await.unwrap(), patched);
}

#[tokio::test]
#[ignore = "requires database"]
async fn post_round_trips_and_patches_one_field() {
    let models = models().await;
    let author = user(&models).await;
    let forum = forum(&models, &author).await;
    let thread = thread(&models, &forum, &author, "t").await;
    let created = post(&models, &thread, &author, None).await;
    assert_eq!(models.posts.get(created.id).await.unwrap(), created);
    tokio::time::sleep(Duration::from_millis(10)).await;

    let patched = models
        .posts
        .patch(&PostPatch {
            id: created.id,
            content: Some("edited".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(patched.content, "edited");
    assert_eq!(patched.thread_id, created.thread_id);
    assert_eq!(patched.author_id, created.author_id);
    assert_eq!(patched.reply_to, created.reply_to);
    assert_eq!(patched.created_at, created.created_at);
    assert!(patched.updated_at > created.updated_at);
    assert_eq!(models.posts.get(created.id).await.unwrap(), patched);
}

#[tokio::test]
#[ignore = "requires database"]
async fn forum_lifecycle_end_to_end() {
    let models = models().await;
    let owner = user(&models).await;
    let member = user(&models).await;
    let forum = forum(&models, &owner).await;

    let thread = thread(&models, &forum, &owner, "welcome").await;
    let opening = post(&models, &thread, &owner, None).await;
    assert_eq!(models.posts.get(opening.id).await.unwrap().content, "hello");

    let edited = models
        .posts
        .patch(&PostPatch {
            id: opening.id,
            content: Some("x".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(edited.content, "x");
    let fetched = models.posts.get(opening.id).await.unwrap();
    assert_eq!(fetched.content, "x");
    assert_eq!(fetched.thread_id, thread.id);

    post(&models, &thread, &member, Some(opening.id)).await;

    models
        .thread_votes
        .cast_vote(thread.id, member.id, 1)
        .await
        .unwrap();

    let locked = models.threads.lock(thread.id).await.unwrap();
    assert!(locked.is_locked);
    assert_eq!(locked.likes, 1);

    let posts = models
        .posts
        .list(&Filter::new().eq("thread_id", thread.id).page_size(10))
        .await
        .unwrap();
    assert_eq!(posts.metadata.response_length, 2);
    assert!(!posts.metadata.next);

    let unlocked = models.threads.unlock(thread.id).await.unwrap();
    assert!(!unlocked.is_locked);

    // Posts still reference the thread
    let err = models.threads.hard_delete(thread.id).await.unwrap_err();
    assert_eq!(err.constraint_kind(), Some(ConstraintKind::ForeignKey));

    // Replies first, then the thread; its votes cascade
    for p in posts.data.iter().rev() {
        models.posts.hard_delete(p.id).await.unwrap();
    }
    models.threads.hard_delete(thread.id).await.unwrap();
    assert_eq!(models.thread_votes.count_votes(thread.id).await.unwrap(), 0);
}
