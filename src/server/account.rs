//! Registration, login and logout.

use std::sync::Arc;

use axum::{
    Form,
    extract::State,
    http::header::SET_COOKIE,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Duration, Utc};
use tracing::info;

use super::flash::{Flash, redirect_with_flash};
use super::response::{AppError, PageContext, StoreResultExt};
use super::validation::{
    EMAIL_TAKEN, INVALID_CREDENTIALS, LoginForm, RegistrationForm, USERNAME_TAKEN,
    ValidationResult,
};
use super::views;
use crate::auth::{
    CurrentUser, clear_session_cookie, generate_session_token, hash_session_token,
    session_cookie,
};
use crate::error::Error;
use crate::server::AppState;
use crate::types::{NewUser, SessionRecord};

pub const REGISTERED: &str = "You have successfully registered and can now log in.";
pub const LOGGED_IN: &str = "You have logged in successfully.";
pub const LOGGED_OUT: &str = "Logged out successfully";

pub async fn register_form(page: PageContext) -> Response {
    page.render(
        "Register",
        &views::register_page(&RegistrationForm::default(), &ValidationResult::default()),
    )
}

pub async fn register(
    page: PageContext,
    State(state): State<Arc<AppState>>,
    Form(form): Form<RegistrationForm>,
) -> Result<Response, AppError> {
    let mut result = form.validate();

    if result.is_valid() {
        if state
            .store
            .find_user_by_username(&form.username)
            .page_err("Failed to check username")?
            .is_some()
        {
            result.add("username", USERNAME_TAKEN);
        }
        if state
            .store
            .find_user_by_email(&form.email)
            .page_err("Failed to check email")?
            .is_some()
        {
            result.add("email", EMAIL_TAKEN);
        }
    }

    if !result.is_valid() {
        return Ok(page.render("Register", &views::register_page(&form, &result)));
    }

    let new_user = NewUser::new(&state.hasher, &form.username, &form.email, &form.password)
        .page_err("Failed to hash password")?;

    // A concurrent registration can pass the pre-checks above; the unique
    // index decides.
    match state.store.create_user(&new_user) {
        Ok(user) => {
            info!("Registered user {} (id {})", user.username, user.id);
            Ok(redirect_with_flash("/login", Flash::success(REGISTERED)))
        }
        Err(Error::UsernameTaken) => {
            result.add("username", USERNAME_TAKEN);
            Ok(page.render("Register", &views::register_page(&form, &result)))
        }
        Err(Error::EmailTaken) => {
            result.add("email", EMAIL_TAKEN);
            Ok(page.render("Register", &views::register_page(&form, &result)))
        }
        Err(e) => Err(e).page_err("Failed to create user"),
    }
}

pub async fn login_form(page: PageContext) -> Response {
    page.render(
        "Log In",
        &views::login_page(&LoginForm::default(), &ValidationResult::default(), None),
    )
}

pub async fn login(
    current: CurrentUser,
    page: PageContext,
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let result = form.validate();
    if !result.is_valid() {
        return Ok(page.render("Log In", &views::login_page(&form, &result, None)));
    }

    let user = state
        .store
        .find_user_by_username(&form.username)
        .page_err("Failed to look up user")?;

    // Unknown user and wrong password get the same message and hashing cost.
    let verified = match &user {
        Some(user) => state
            .hasher
            .verify(&form.password, &user.password_hash)
            .page_err("Failed to verify password")?,
        None => state
            .hasher
            .verify_absent(&form.password)
            .page_err("Failed to verify password")?,
    };

    let Some(user) = user.filter(|_| verified) else {
        info!("Failed login attempt for '{}'", form.username);
        return Ok(page.render(
            "Log In",
            &views::login_page(&form, &result, Some(INVALID_CREDENTIALS)),
        ));
    };

    if let Some(previous) = &current.token_hash {
        state
            .store
            .delete_session(previous)
            .page_err("Failed to rotate session")?;
    }

    let token = generate_session_token();
    let now = Utc::now();
    state
        .store
        .create_session(&SessionRecord {
            token_hash: hash_session_token(&token),
            user_id: user.id,
            created_at: now,
            expires_at: now + Duration::seconds(state.session_ttl_seconds),
        })
        .page_err("Failed to create session")?;

    let cookie = session_cookie(&token, state.session_ttl_seconds, state.secure_cookies)
        .map_err(|e| {
            tracing::error!("Failed to build session cookie: {e}");
            AppError::internal("Internal server error")
        })?;

    info!("User {} logged in", user.username);

    let mut response = redirect_with_flash("/dashboard", Flash::success(LOGGED_IN));
    response.headers_mut().append(SET_COOKIE, cookie);
    Ok(response)
}

pub async fn logout(
    current: CurrentUser,
    State(state): State<Arc<AppState>>,
) -> Result<Response, AppError> {
    if let Some(token_hash) = &current.token_hash {
        state
            .store
            .delete_session(token_hash)
            .page_err("Failed to delete session")?;
    }

    let mut response = match &current.user {
        Some(user) => {
            info!("User {} logged out", user.username);
            redirect_with_flash("/", Flash::success(LOGGED_OUT))
        }
        None => Redirect::to("/").into_response(),
    };

    if current.token_hash.is_some() {
        match clear_session_cookie(state.secure_cookies) {
            Ok(cookie) => {
                response.headers_mut().append(SET_COOKIE, cookie);
            }
            Err(e) => tracing::warn!("Failed to build session cookie: {e}"),
        }
    }

    Ok(response)
}
