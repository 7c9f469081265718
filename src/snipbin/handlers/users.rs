//! Account pages: signup, login, logout.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    http::{header::SET_COOKIE, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use sqlx::PgPool;
use tracing::{error, info};

use crate::forms::{UserLoginForm, UserSignupForm};
use crate::models::{users, AuthError, RegisterError};
use crate::snipbin::handlers::{
    client_error, csrf_ok, decode_form, page_context, render_page, server_error,
};
use crate::snipbin::middleware::{Auth, RequestSession};
use crate::snipbin::session::{session_cookie, SessionStore};
use crate::snipbin::templates::TemplateEngine;

pub async fn signup(
    Extension(engine): Extension<Arc<TemplateEngine>>,
    Extension(sessions): Extension<SessionStore>,
    Extension(session): Extension<RequestSession>,
    Extension(auth): Extension<Auth>,
) -> Response {
    let mut context = page_context(&sessions, &session, auth).await;
    context.insert("form", &UserSignupForm::default());
    render_page(&engine, StatusCode::OK, "pages/signup.html", &context)
}

pub async fn signup_post(
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

    let mut form: UserSignupForm = match decode_form(&raw) {
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
            "pages/signup.html",
            &context,
        );
    }

    match users::insert(&pool, &form.name, &form.email, &form.password).await {
        Ok(()) => {}
        Err(RegisterError::DuplicateEmail) => {
            form.validator
                .add_field_error("email", "Email address is already in use");
            let mut context = page_context(&sessions, &session, auth).await;
            context.insert("form", &form);
            return render_page(
                &engine,
                StatusCode::UNPROCESSABLE_ENTITY,
                "pages/signup.html",
                &context,
            );
        }
        Err(error) => {
            error!("could not register user: {error}");
            return server_error();
        }
    }

    let mut data = sessions.load(&session.token).await.unwrap_or_default();
    data.flash = Some("Your signup was successful. Please log in.".to_string());
    sessions.put(&session.token, data).await;

    Redirect::to("/user/login").into_response()
}

pub async fn login(
    Extension(engine): Extension<Arc<TemplateEngine>>,
    Extension(sessions): Extension<SessionStore>,
    Extension(session): Extension<RequestSession>,
    Extension(auth): Extension<Auth>,
) -> Response {
    let mut context = page_context(&sessions, &session, auth).await;
    context.insert("form", &UserLoginForm::default());
    render_page(&engine, StatusCode::OK, "pages/login.html", &context)
}

pub async fn login_post(
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

    let mut form: UserLoginForm = match decode_form(&raw) {
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
            "pages/login.html",
            &context,
        );
    }

    let user_id = match users::authenticate(&pool, &form.email, &form.password).await {
        Ok(id) => id,
        Err(AuthError::InvalidCredentials) => {
            form.validator
                .add_non_field_error("Email or password is incorrect");
            let mut context = page_context(&sessions, &session, auth).await;
            context.insert("form", &form);
            return render_page(
                &engine,
                StatusCode::UNPROCESSABLE_ENTITY,
                "pages/login.html",
                &context,
            );
        }
        Err(error) => {
            error!("could not authenticate user: {error}");
            return server_error();
        }
    };

    // Fresh token on privilege change.
    let new_token = sessions.rotate(&session.token).await;
    let mut data = sessions.load(&new_token).await.unwrap_or_default();
    data.user_id = Some(user_id);
    sessions.put(&new_token, data).await;

    info!("user {user_id} logged in");

    let mut response = Redirect::to("/snippet/create").into_response();
    match session_cookie(&new_token, sessions.ttl()) {
        Ok(cookie) => {
            response.headers_mut().append(SET_COOKIE, cookie);
        }
        Err(error) => {
            error!("could not build session cookie: {error}");
            return server_error();
        }
    }
    response
}

pub async fn logout(
    Extension(sessions): Extension<SessionStore>,
    Extension(session): Extension<RequestSession>,
    Form(raw): Form<HashMap<String, String>>,
) -> Response {
    let data = sessions.load(&session.token).await.unwrap_or_default();
    if !csrf_ok(&data, &raw) {
        return client_error(StatusCode::BAD_REQUEST);
    }

    let new_token = sessions.rotate(&session.token).await;
    let mut data = sessions.load(&new_token).await.unwrap_or_default();
    data.user_id = None;
    data.flash = Some("You've been logged out successfully!".to_string());
    sessions.put(&new_token, data).await;

    let mut response = Redirect::to("/").into_response();
    if let Ok(cookie) = session_cookie(&new_token, sessions.ttl()) {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}
