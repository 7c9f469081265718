//! User storage: registration, credential verification, existence checks.
//!
//! Passwords are hashed with Argon2id and stored as PHC strings; the hash
//! never leaves this module. Duplicate emails are detected at insert time via
//! the storage layer's conflict code, never a pre-check, so concurrent
//! signups cannot race past the uniqueness constraint.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use sqlx::{PgPool, Row};
use tracing::Instrument;

use super::{is_unique_violation, AuthError, RegisterError, StoreError};

/// Argon2 memory cost in KiB (19 MiB).
const ARGON2_M_COST: u32 = 19 * 1024;
/// Argon2 time cost (iterations).
const ARGON2_T_COST: u32 = 2;
/// Argon2 parallelism.
const ARGON2_P_COST: u32 = 1;

fn hasher() -> Result<Argon2<'static>, argon2::password_hash::Error> {
    let params = Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, None)
        .map_err(argon2::password_hash::Error::from)?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    Ok(hasher()?
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Register a new user. A unique-constraint conflict on the email column
/// becomes [`RegisterError::DuplicateEmail`].
pub async fn insert(
    pool: &PgPool,
    name: &str,
    email: &str,
    password: &str,
) -> Result<(), RegisterError> {
    let hashed_password = hash_password(password).map_err(RegisterError::Hash)?;

    let query = r"
        INSERT INTO users (name, email, hashed_password, created)
        VALUES ($1, $2, $3, NOW())
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    match sqlx::query(query)
        .bind(name)
        .bind(email)
        .bind(&hashed_password)
        .execute(pool)
        .instrument(span)
        .await
    {
        Ok(_) => Ok(()),
        Err(err) if is_unique_violation(&err) => Err(RegisterError::DuplicateEmail),
        Err(err) => Err(RegisterError::Unavailable(err)),
    }
}

/// Verify credentials and return the user's id.
///
/// An unknown email and a wrong password both yield
/// [`AuthError::InvalidCredentials`]; callers cannot tell the cases apart.
/// Verification goes through argon2's constant-time comparison, never string
/// equality.
pub async fn authenticate(pool: &PgPool, email: &str, password: &str) -> Result<i64, AuthError> {
    let query = "SELECT id, hashed_password FROM users WHERE email = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .map_err(AuthError::Unavailable)?
        .ok_or(AuthError::InvalidCredentials)?;

    let id: i64 = row.get("id");
    let hashed_password: String = row.get("hashed_password");

    let parsed = PasswordHash::new(&hashed_password).map_err(|_| AuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)?;

    Ok(id)
}

/// True when a user with `id` exists. Used by the auth gate to ignore stale
/// session ids.
pub async fn exists(pool: &PgPool, id: i64) -> Result<bool, StoreError> {
    let query = "SELECT EXISTS(SELECT TRUE FROM users WHERE id = $1)";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(id)
        .fetch_one(pool)
        .instrument(span)
        .await
        .map_err(StoreError::Unavailable)?;

    Ok(row.get(0))
}
