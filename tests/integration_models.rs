use anyhow::{Context, Result};
use snipbin::models::{snippets, users, RegisterError, StoreError};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::env;

/// Connect to the database named by `SNIPBIN_TEST_DSN` and apply the schema
/// into a private search path. Returns `None` when the variable is unset so
/// the suite passes without a database.
async fn test_pool(schema: &str) -> Result<Option<PgPool>> {
    let Ok(dsn) = env::var("SNIPBIN_TEST_DSN") else {
        eprintln!("Skipping integration test: SNIPBIN_TEST_DSN is not set");
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&dsn)
        .await
        .context("Failed to connect to Postgres")?;

    sqlx::raw_sql(&format!(
        "DROP SCHEMA IF EXISTS {schema} CASCADE; \
         CREATE SCHEMA {schema}; \
         SET search_path TO {schema};"
    ))
    .execute(&pool)
    .await
    .context("Failed to create test schema")?;

    sqlx::raw_sql(include_str!("../migrations/0001_snippets.sql"))
        .execute(&pool)
        .await
        .context("Failed to create snippets table")?;

    sqlx::raw_sql(include_str!("../migrations/0002_users.sql"))
        .execute(&pool)
        .await
        .context("Failed to create users table")?;

    Ok(Some(pool))
}

async fn drop_schema(pool: &PgPool, schema: &str) -> Result<()> {
    sqlx::raw_sql(&format!("DROP SCHEMA {schema} CASCADE"))
        .execute(pool)
        .await
        .context("Failed to drop test schema")?;
    Ok(())
}

#[tokio::test]
async fn expired_snippets_are_not_served() -> Result<()> {
    let schema = "snipbin_it_expiry";
    let Some(pool) = test_pool(schema).await? else {
        return Ok(());
    };

    let live = snippets::insert(&pool, "O snail", "Climb Mount Fuji", 7).await?;

    sqlx::raw_sql(
        "INSERT INTO snippets (title, content, created, expires) \
         VALUES ('stale', 'gone', NOW() - INTERVAL '2 days', NOW() - INTERVAL '1 day')",
    )
    .execute(&pool)
    .await?;

    let found = snippets::get(&pool, live).await?;
    assert_eq!(found.id, live);
    assert_eq!(found.title, "O snail");
    assert!(found.expires > found.created);

    let stale_id = live + 1;
    assert!(matches!(
        snippets::get(&pool, stale_id).await,
        Err(StoreError::NotFound)
    ));
    assert!(matches!(
        snippets::get(&pool, 999_999).await,
        Err(StoreError::NotFound)
    ));

    drop_schema(&pool, schema).await
}

#[tokio::test]
async fn latest_returns_the_ten_newest_live_snippets() -> Result<()> {
    let schema = "snipbin_it_latest";
    let Some(pool) = test_pool(schema).await? else {
        return Ok(());
    };

    sqlx::raw_sql(
        "INSERT INTO snippets (title, content, created, expires) \
         VALUES ('stale', 'gone', NOW() - INTERVAL '2 days', NOW() - INTERVAL '1 day')",
    )
    .execute(&pool)
    .await?;

    let mut ids = Vec::new();
    for n in 0..15 {
        let id = snippets::insert(&pool, &format!("snippet {n}"), "body", 365).await?;
        ids.push(id);
    }

    let latest = snippets::latest(&pool).await?;
    assert_eq!(latest.len(), 10);

    let expected: Vec<i64> = ids.iter().rev().take(10).copied().collect();
    let got: Vec<i64> = latest.iter().map(|s| s.id).collect();
    assert_eq!(got, expected);

    drop_schema(&pool, schema).await
}

#[tokio::test]
async fn duplicate_email_is_rejected_and_credentials_verify() -> Result<()> {
    let schema = "snipbin_it_users";
    let Some(pool) = test_pool(schema).await? else {
        return Ok(());
    };

    users::insert(&pool, "Alice", "alice@example.com", "pa55word123").await?;

    assert!(matches!(
        users::insert(&pool, "Alice Again", "alice@example.com", "pa55word123").await,
        Err(RegisterError::DuplicateEmail)
    ));

    let user_id = users::authenticate(&pool, "alice@example.com", "pa55word123").await?;
    assert!(users::exists(&pool, user_id).await?);

    drop_schema(&pool, schema).await
}
