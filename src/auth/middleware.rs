use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use super::session::{SESSION_COOKIE_NAME, Session, hash_session_token, read_cookie};
use crate::server::AppState;
use crate::server::flash::{Flash, redirect_with_flash};
use crate::server::response::{AppError, StoreResultExt};
use crate::types::User;

pub const LOGIN_REQUIRED: &str = "You must log in first";

/// The session resolved from the request cookie.
///
/// Unknown, expired and orphaned tokens all resolve to an anonymous session;
/// `token_hash` is still set so logout can clean up the row.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser {
    pub session: Session,
    pub user: Option<User>,
    pub token_hash: Option<String>,
}

/// Extractor that requires a logged-in user. Anonymous requests are
/// redirected to the login page with a notice.
pub struct RequireLogin(pub User);

pub enum LoginRejection {
    Anonymous,
    Failed(AppError),
}

impl IntoResponse for LoginRejection {
    fn into_response(self) -> Response {
        match self {
            LoginRejection::Anonymous => {
                redirect_with_flash("/login", Flash::info(LOGIN_REQUIRED))
            }
            LoginRejection::Failed(err) => err.into_response(),
        }
    }
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(current) = parts.extensions.get::<CurrentUser>() {
            return Ok(current.clone());
        }

        let current = resolve_session(parts, state)?;
        parts.extensions.insert(current.clone());
        Ok(current)
    }
}

impl FromRequestParts<Arc<AppState>> for RequireLogin {
    type Rejection = LoginRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let current = CurrentUser::from_request_parts(parts, state)
            .await
            .map_err(LoginRejection::Failed)?;

        current
            .user
            .map(RequireLogin)
            .ok_or(LoginRejection::Anonymous)
    }
}

fn resolve_session(parts: &Parts, state: &AppState) -> Result<CurrentUser, AppError> {
    let Some(token) = read_cookie(&parts.headers, SESSION_COOKIE_NAME) else {
        return Ok(CurrentUser::default());
    };
    let token_hash = hash_session_token(&token);

    let Some(record) = state
        .store
        .get_session(&token_hash)
        .page_err("Failed to look up session")?
    else {
        return Ok(CurrentUser {
            token_hash: Some(token_hash),
            ..CurrentUser::default()
        });
    };

    if record.expires_at <= Utc::now() {
        if let Err(e) = state.store.delete_session(&token_hash) {
            tracing::warn!("Failed to delete expired session: {e}");
        }
        return Ok(CurrentUser {
            token_hash: Some(token_hash),
            ..CurrentUser::default()
        });
    }

    let user = state
        .store
        .get_user(record.user_id)
        .page_err("Failed to load session user")?;

    Ok(CurrentUser {
        session: match &user {
            Some(user) => Session::authenticated(user.id),
            None => Session::anonymous(),
        },
        user,
        token_hash: Some(token_hash),
    })
}
