//! HTTP handlers and shared response helpers.

pub mod health;
pub mod snippets;
pub mod users;

pub use self::health::health;
pub use self::snippets::{home, snippet_create, snippet_create_post, snippet_view};
pub use self::users::{login, login_post, logout, signup, signup_post};

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono::{Datelike, Utc};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::forms::{decode, DecodeError};
use crate::snipbin::middleware::{Auth, RequestSession};
use crate::snipbin::session::{SessionData, SessionStore};
use crate::snipbin::templates::TemplateEngine;

pub(crate) fn server_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

pub(crate) fn client_error(status: StatusCode) -> Response {
    (status, status.canonical_reason().unwrap_or("")).into_response()
}

pub(crate) fn not_found() -> Response {
    client_error(StatusCode::NOT_FOUND)
}

/// Base template context shared by every page: current year, one-shot flash
/// message, authentication flag and the CSRF token for forms.
pub(crate) async fn page_context(
    sessions: &SessionStore,
    session: &RequestSession,
    auth: Auth,
) -> tera::Context {
    let flash = sessions.pop_flash(&session.token).await;
    let csrf_token = sessions
        .load(&session.token)
        .await
        .map(|data| data.csrf_token)
        .unwrap_or_default();

    let mut context = tera::Context::new();
    context.insert("current_year", &Utc::now().year());
    context.insert("flash", &flash);
    context.insert("is_authenticated", &auth.is_authenticated());
    context.insert("csrf_token", &csrf_token);
    context
}

pub(crate) fn render_page(
    engine: &TemplateEngine,
    status: StatusCode,
    page: &str,
    context: &tera::Context,
) -> Response {
    match engine.render(page, context) {
        Ok(body) => (status, Html(body)).into_response(),
        Err(error) => {
            error!("{error:#}");
            server_error()
        }
    }
}

/// Decode a submitted form into `T`. Malformed values are the client's
/// fault and get a 400; an undeserializable target type is a programming
/// error at the call site.
pub(crate) fn decode_form<T: DeserializeOwned>(raw: &HashMap<String, String>) -> Result<T, Response> {
    match decode(raw) {
        Ok(form) => Ok(form),
        Err(err @ DecodeError::InvalidTarget(_)) => {
            panic!("form decode target is invalid: {err}")
        }
        Err(error) => {
            debug!("rejecting form submission: {error}");
            Err(client_error(StatusCode::BAD_REQUEST))
        }
    }
}

/// A POST is acceptable only when it carries the session's CSRF token.
pub(crate) fn csrf_ok(data: &SessionData, raw: &HashMap<String, String>) -> bool {
    !data.csrf_token.is_empty()
        && raw
            .get("csrf_token")
            .is_some_and(|token| token == &data.csrf_token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::SnippetCreateForm;

    #[test]
    fn decode_form_populates_a_typed_form() {
        let mut raw = HashMap::new();
        raw.insert("title".to_string(), "O snail".to_string());
        raw.insert("content".to_string(), "Climb Mount Fuji".to_string());
        raw.insert("expires".to_string(), "7".to_string());

        let form: SnippetCreateForm = decode_form(&raw).unwrap();
        assert_eq!(form.title, "O snail");
        assert_eq!(form.expires, 7);
    }

    #[test]
    fn decode_form_rejects_malformed_values() {
        let mut raw = HashMap::new();
        raw.insert("expires".to_string(), "soon".to_string());

        let result = decode_form::<SnippetCreateForm>(&raw);
        let response = result.err().unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn csrf_token_must_match_the_session() {
        let data = SessionData {
            csrf_token: "abc".to_string(),
            ..SessionData::default()
        };

        let mut raw = HashMap::new();
        raw.insert("csrf_token".to_string(), "abc".to_string());
        assert!(csrf_ok(&data, &raw));

        raw.insert("csrf_token".to_string(), "wrong".to_string());
        assert!(!csrf_ok(&data, &raw));

        raw.remove("csrf_token");
        assert!(!csrf_ok(&data, &raw));
    }

    #[test]
    fn empty_session_token_never_passes() {
        let data = SessionData::default();
        let mut raw = HashMap::new();
        raw.insert("csrf_token".to_string(), String::new());
        assert!(!csrf_ok(&data, &raw));
    }

    #[test]
    fn client_error_uses_canonical_reason() {
        let response = client_error(StatusCode::BAD_REQUEST);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
