//! Request middleware: session loading and authentication gating.

use axum::{
    extract::Request,
    http::{
        header::{CACHE_CONTROL, SET_COOKIE},
        HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use sqlx::PgPool;
use tracing::error;

use crate::models::users;
use crate::snipbin::session::{extract_session_token, session_cookie, SessionStore};

/// Authentication state resolved once per request and carried as a request
/// extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    Anonymous,
    Authenticated(i64),
}

impl Auth {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    #[must_use]
    pub const fn user_id(&self) -> Option<i64> {
        match self {
            Self::Authenticated(id) => Some(*id),
            Self::Anonymous => None,
        }
    }
}

/// The session token backing the current request.
#[derive(Debug, Clone)]
pub struct RequestSession {
    pub token: String,
}

/// Resolve the session cookie into [`Auth`] and [`RequestSession`]
/// extensions, creating a session when the request has none. A user id in
/// the session only counts when that user still exists.
pub async fn load_session(
    Extension(pool): Extension<PgPool>,
    Extension(sessions): Extension<SessionStore>,
    mut request: Request,
    next: Next,
) -> Response {
    let (token, created) = match extract_session_token(request.headers()) {
        Some(token) if sessions.exists(&token).await => (token, false),
        _ => (sessions.create().await, true),
    };

    let data = sessions.load(&token).await.unwrap_or_default();

    let auth = match data.user_id {
        Some(id) if id > 0 => match users::exists(&pool, id).await {
            Ok(true) => Auth::Authenticated(id),
            Ok(false) => Auth::Anonymous,
            Err(error) => {
                error!("could not verify session user: {error}");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        },
        _ => Auth::Anonymous,
    };

    request.extensions_mut().insert(auth);
    request.extensions_mut().insert(RequestSession {
        token: token.clone(),
    });

    let mut response = next.run(request).await;

    // Handlers that rotate the token set their own cookie; the old token is
    // gone from the store by then, so skip ours.
    if created && sessions.exists(&token).await {
        if let Ok(cookie) = session_cookie(&token, sessions.ttl()) {
            response.headers_mut().append(SET_COOKIE, cookie);
        }
    }

    response
}

/// Redirect anonymous requests to the login page; authenticated responses
/// must not land in shared caches.
pub async fn require_authentication(
    Extension(auth): Extension<Auth>,
    request: Request,
    next: Next,
) -> Response {
    if !auth.is_authenticated() {
        return Redirect::to("/user/login").into_response();
    }

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
