//! Snippet storage: insert with expiry, fetch by id, fetch latest.
//!
//! Snippets are never mutated after insert. Expiry is enforced at query time:
//! every read filters on `expires > NOW()`, so expired rows are simply
//! invisible and no active deletion happens here.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Row};
use tracing::Instrument;

use super::StoreError;

/// Number of snippets returned by [`latest`].
const LATEST_LIMIT: i64 = 10;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

/// Insert a snippet expiring `expires_days` from now (UTC) and return its id.
///
/// The caller has already validated `expires_days` against the permitted set;
/// the expiry arithmetic happens in the database so `created` and `expires`
/// come from the same clock reading.
pub async fn insert(
    pool: &PgPool,
    title: &str,
    content: &str,
    expires_days: i32,
) -> Result<i64, StoreError> {
    let query = r"
        INSERT INTO snippets (title, content, created, expires)
        VALUES ($1, $2, NOW(), NOW() + make_interval(days => $3))
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(title)
        .bind(content)
        .bind(expires_days)
        .fetch_one(pool)
        .instrument(span)
        .await
        .map_err(StoreError::Unavailable)?;

    Ok(row.get("id"))
}

/// Fetch a live snippet by id. An expired row is [`StoreError::NotFound`],
/// same as a missing one.
pub async fn get(pool: &PgPool, id: i64) -> Result<Snippet, StoreError> {
    let query = r"
        SELECT id, title, content, created, expires
        FROM snippets
        WHERE expires > NOW() AND id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    sqlx::query_as::<_, Snippet>(query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .map_err(StoreError::Unavailable)?
        .ok_or(StoreError::NotFound)
}

/// Fetch the ten most recently created live snippets, newest first. An empty
/// store yields an empty vec, not an error.
pub async fn latest(pool: &PgPool) -> Result<Vec<Snippet>, StoreError> {
    let query = r"
        SELECT id, title, content, created, expires
        FROM snippets
        WHERE expires > NOW()
        ORDER BY id DESC
        LIMIT $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    sqlx::query_as::<_, Snippet>(query)
        .bind(LATEST_LIMIT)
        .fetch_all(pool)
        .instrument(span)
        .await
        .map_err(StoreError::Unavailable)
}
