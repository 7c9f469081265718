//! Snippet pages: home listing, single view, create form and submission.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use sqlx::PgPool;
use tracing::error;

use crate::forms::SnippetCreateForm;
use crate::models::{snippets, StoreError};
use crate::snipbin::handlers::{
    client_error, csrf_ok, decode_form, not_found, page_context, render_page, server_error,
};
use crate::snipbin::middleware::{Auth, RequestSession};
use crate::snipbin::session::SessionStore;
use crate::snipbin::templates::TemplateEngine;

pub async fn home(
    Extension(pool): Extension<PgPool>,
    Extension(engine): Extension<Arc<TemplateEngine>>,
    Extension(sessions): Extension<SessionStore>,
    Extension(session): Extension<RequestSession>,
    Extension(auth): Extension<Auth>,
) -> Response {
    let latest = match snippets::latest(&pool).await {
        Ok(latest) => latest,
        Err(error) => {
            error!("could not load latest snippets: {error}");
            return server_error();
        }
    };

    let mut context = page_context(&sessions, &session, auth).await;
    context.insert("snippets", &latest);
    render_page(&engine, StatusCode::OK, "pages/home.html", &context)
}

pub async fn snippet_view(
    Extension(pool): Extension<PgPool>,
    Extension(engine): Extension<Arc<TemplateEngine>>,
    Extension(sessions): Extension<SessionStore>,
    Extension(session): Extension<RequestSession>,
    Extension(auth): Extension<Auth>,
    Path(id): Path<String>,
) -> Response {
    // Negative or non-numeric ids are indistinguishable from missing rows.
    let id = match id.parse::<i64>() {
        Ok(id) if id >= 1 => id,
        _ => return not_found(),
    };

    let snippet = match snippets::get(&pool, id).await {
        Ok(snippet) => snippet,
        Err(StoreError::NotFound) => return not_found(),
        Err(error) => {
            error!("could not load snippet {id}: {error}");
            return server_error();
        }
    };

    let mut context = page_context(&sessions, &session, auth).await;
    context.insert("snippet", &snippet);
    render_page(&engine, StatusCode::OK, "pages/view.html", &context)
}

pub async fn snippet_create(
    Extension(engine): Extension<Arc<TemplateEngine>>,
    Extension(sessions): Extension<SessionStore>,
    Extension(session): Extension<RequestSession>,
    Extension(auth): Extension<Auth>,
) -> Response {
    let mut context = page_context(&sessions, &session, auth).await;
    context.insert("form", &SnippetCreateForm::initial());
    render_page(&engine, StatusCode::OK, "pages/create.html", &context)
}

pub async fn snippet_create_post(
    Extension(pool): Extension<PgPool>,
    Extension(engine): Extension<Arc<TemplateEngine>>,
    Extension(sessions): Extension<SessionStore>,
    Extension(session): Extension<RequestSession>,
    Extension(auth): Extension<Auth>,
    Form(raw): Form<HashMap<String, String>>,
) -> Response {
    let data = sessions.load(&session.token).await.unwrap_or_default();
    if !csrf_ok(&data, &raw) {
        return client_error(StatusCode::BAD_REQUEST);
    }

    let mut form: SnippetCreateForm = match decode_form(&raw) {
        Ok(form) => form,
        Err(response) => return response,
    };

    form.validate();
    if !form.is_valid() {
        let mut context = page_context(&sessions, &session, auth).await;
        context.insert("form", &form);
        return render_page(
            &engine,
            StatusCode::UNPROCESSABLE_ENTITY,
            "pages/create.html",
            &context,
        );
    }

    let id = match snippets::insert(&pool, &form.title, &form.content, form.expires).await {
        Ok(id) => id,
        Err(error) => {
            error!("could not insert snippet: {error}");
            return server_error();
        }
    };

    let mut data = sessions.load(&session.token).await.unwrap_or_default();
    data.flash = Some("Snippet successfully created!".to_string());
    sessions.put(&session.token, data).await;

    Redirect::to(&format!("/snippet/view/{id}")).into_response()
}
