//! Schema migrations
//!
//! Every statement is idempotent so `run` is safe on every startup.

use sqlx::PgPool;
use tracing::{debug, info};

/// (name, statement) pairs, applied in order
const MIGRATIONS: &[(&str, &str)] = &[
    ("schema", "CREATE SCHEMA IF NOT EXISTS forum"),
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS forum.users (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name VARCHAR(256) NOT NULL,
            username VARCHAR(64) NOT NULL UNIQUE
                CHECK (username ~ '^[a-zA-Z0-9_.-]{1,64}$'),
            email VARCHAR(256) NOT NULL UNIQUE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            deleted BOOLEAN NOT NULL DEFAULT FALSE,
            deleted_at TIMESTAMPTZ
        )
        "#,
    ),
    (
        "forums",
        r#"
        CREATE TABLE IF NOT EXISTS forum.forums (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            owner_id UUID NOT NULL REFERENCES forum.users(id),
            name VARCHAR(256) NOT NULL,
            description TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            deleted BOOLEAN NOT NULL DEFAULT FALSE,
            deleted_at TIMESTAMPTZ
        )
        "#,
    ),
    (
        "threads",
        r#"
        CREATE TABLE IF NOT EXISTS forum.threads (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            forum_id UUID NOT NULL REFERENCES forum.forums(id),
            author_id UUID NOT NULL REFERENCES forum.users(id),
            title VARCHAR(256) NOT NULL,
            is_locked BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            deleted BOOLEAN NOT NULL DEFAULT FALSE,
            deleted_at TIMESTAMPTZ
        )
        "#,
    ),
    (
        "posts",
        r#"
        CREATE TABLE IF NOT EXISTS forum.posts (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            thread_id UUID NOT NULL REFERENCES forum.threads(id),
            reply_to UUID REFERENCES forum.posts(id),
            author_id UUID NOT NULL REFERENCES forum.users(id),
            content TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            deleted BOOLEAN NOT NULL DEFAULT FALSE,
            deleted_at TIMESTAMPTZ
        )
        "#,
    ),
    (
        "thread_votes",
        r#"
        CREATE TABLE IF NOT EXISTS forum.thread_votes (
            thread_id UUID NOT NULL REFERENCES forum.threads(id) ON DELETE CASCADE,
            user_id UUID NOT NULL REFERENCES forum.users(id) ON DELETE CASCADE,
            vote SMALLINT NOT NULL CHECK (vote BETWEEN -1 AND 1),
            PRIMARY KEY (thread_id, user_id)
        )
        "#,
    ),
    (
        "post_votes",
        r#"
        CREATE TABLE IF NOT EXISTS forum.post_votes (
            post_id UUID NOT NULL REFERENCES forum.posts(id) ON DELETE CASCADE,
            user_id UUID NOT NULL REFERENCES forum.users(id) ON DELETE CASCADE,
            vote SMALLINT NOT NULL CHECK (vote BETWEEN -1 AND 1),
            PRIMARY KEY (post_id, user_id)
        )
        "#,
    ),
    (
        "indexes",
        r#"
        CREATE INDEX IF NOT EXISTS forums_owner_id_idx ON forum.forums (owner_id);
        CREATE INDEX IF NOT EXISTS threads_forum_id_idx ON forum.threads (forum_id);
        CREATE INDEX IF NOT EXISTS threads_author_id_idx ON forum.threads (author_id);
        CREATE INDEX IF NOT EXISTS posts_thread_id_idx ON forum.posts (thread_id);
        CREATE INDEX IF NOT EXISTS posts_author_id_idx ON forum.posts (author_id);
        CREATE INDEX IF NOT EXISTS posts_reply_to_idx ON forum.posts (reply_to);
        CREATE INDEX IF NOT EXISTS thread_votes_user_id_idx ON forum.thread_votes (user_id);
        CREATE INDEX IF NOT EXISTS post_votes_user_id_idx ON forum.post_votes (user_id)
        "#,
    ),
];

/// Create the `forum` schema and all tables.
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for (name, statement) in MIGRATIONS {
        debug!(migration = name, "applying");
        sqlx::raw_sql(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    info!(count = MIGRATIONS.len(), "database migrations complete");
    Ok(())
}
