//! In-process session store and session cookie plumbing.
//!
//! Sessions map an opaque token to a small typed payload (authenticated user
//! id, one-shot flash message, CSRF token) with an absolute TTL. The raw
//! token travels only in the cookie; the store holds it as the map key.
//! Concurrent requests sharing a token are last-write-wins, which is
//! acceptable for the flash message.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{header::COOKIE, HeaderMap, HeaderValue};
use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use tokio::sync::RwLock;

pub const SESSION_COOKIE_NAME: &str = "snipbin_session";

/// Typed per-session payload.
#[derive(Debug, Default, Clone)]
pub struct SessionData {
    pub user_id: Option<i64>,
    pub flash: Option<String>,
    pub csrf_token: String,
}

#[derive(Debug)]
struct SessionEntry {
    data: SessionData,
    expires_at: DateTime<Utc>,
}

/// Process-wide token-keyed session map. Cheap to clone; all clones share
/// the same state.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, SessionEntry>>>,
    ttl: Duration,
}

impl SessionStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Create a fresh session with a new CSRF token and return its token.
    /// Expired entries are swept here: every cookie-less request lands in
    /// this path, so abandoned sessions cannot pile up waiting for their
    /// exact token to be presented again.
    pub async fn create(&self) -> String {
        let token = generate_token();
        let data = SessionData {
            csrf_token: generate_token(),
            ..SessionData::default()
        };
        let now = Utc::now();
        let mut sessions = self.inner.write().await;
        sessions.retain(|_, entry| entry.expires_at > now);
        sessions.insert(
            token.clone(),
            SessionEntry {
                data,
                expires_at: now + self.ttl,
            },
        );
        token
    }

    /// Load the payload for `token`; expired or unknown tokens read as
    /// absent, and expired entries are dropped on the way.
    pub async fn load(&self, token: &str) -> Option<SessionData> {
        {
            let sessions = self.inner.read().await;
            match sessions.get(token) {
                Some(entry) if entry.expires_at > Utc::now() => return Some(entry.data.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        // Entry exists but has expired; evict it.
        self.inner.write().await.remove(token);
        None
    }

    /// Store `data` under `token`, resetting the TTL deadline.
    pub async fn put(&self, token: &str, data: SessionData) {
        let entry = SessionEntry {
            data,
            expires_at: Utc::now() + self.ttl,
        };
        self.inner.write().await.insert(token.to_string(), entry);
    }

    /// True when `token` names a live session.
    pub async fn exists(&self, token: &str) -> bool {
        self.load(token).await.is_some()
    }

    /// Read and clear the flash message in one step.
    pub async fn pop_flash(&self, token: &str) -> Option<String> {
        let mut sessions = self.inner.write().await;
        let entry = sessions.get_mut(token)?;
        if entry.expires_at <= Utc::now() {
            sessions.remove(token);
            return None;
        }
        entry.data.flash.take()
    }

    /// Move the session under a fresh token, invalidating the old one.
    /// Performed on login so an attacker-fixated token never gains
    /// privileges.
    pub async fn rotate(&self, old_token: &str) -> String {
        let new_token = generate_token();
        let mut sessions = self.inner.write().await;
        let data = match sessions.remove(old_token) {
            Some(entry) if entry.expires_at > Utc::now() => entry.data,
            _ => SessionData {
                csrf_token: generate_token(),
                ..SessionData::default()
            },
        };
        sessions.insert(
            new_token.clone(),
            SessionEntry {
                data,
                expires_at: Utc::now() + self.ttl,
            },
        );
        new_token
    }

    /// Drop the session outright.
    pub async fn destroy(&self, token: &str) {
        self.inner.write().await.remove(token);
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// 32 random bytes, URL-safe base64 without padding. Used for both session
/// and CSRF tokens.
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    Base64UrlUnpadded::encode_string(&bytes)
}

/// Pull the session token out of the Cookie header, if any.
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        // A pair without '=' (a nameless cookie) must not end the scan.
        let Some((key, val)) = pair.trim().split_once('=') else {
            continue;
        };
        if key.trim() == SESSION_COOKIE_NAME {
            return Some(val.trim().to_string());
        }
    }
    None
}

/// Build the `Set-Cookie` value for a session token.
pub fn session_cookie(
    token: &str,
    ttl: Duration,
) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
    let max_age = ttl.num_seconds();
    let cookie =
        format!("{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    HeaderValue::from_str(&cookie)
}
