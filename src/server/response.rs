use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header::SET_COOKIE, request::Parts},
    response::{Html, IntoResponse, Response},
};

use super::flash::Flash;
use super::views;
use crate::auth::CurrentUser;
use crate::error::{Error, Result as StoreResult};
use crate::server::AppState;
use crate::types::User;

/// Page-level error that converts to a rendered error page.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = views::layout(
            &self.status.to_string(),
            None,
            None,
            &views::error_page(self.status, &self.message),
        );
        (self.status, Html(body)).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound => AppError::not_found("Page not found"),
            other => {
                tracing::error!("Request failed: {other}");
                AppError::internal("Internal server error")
            }
        }
    }
}

/// Extension trait for converting store results to page errors. Storage
/// failures are logged with `context` and surface as a generic 500.
pub trait StoreResultExt<T> {
    fn page_err(self, context: &'static str) -> Result<T, AppError>;
}

impl<T> StoreResultExt<T> for StoreResult<T> {
    fn page_err(self, context: &'static str) -> Result<T, AppError> {
        self.map_err(|e| match e {
            Error::NotFound => AppError::not_found("Page not found"),
            e => {
                tracing::error!("{context}: {e}");
                AppError::internal("Internal server error")
            }
        })
    }
}

/// Extension for Option types from store operations.
pub trait StoreOptionExt<T> {
    fn or_not_found(self, message: &'static str) -> Result<T, AppError>;
}

impl<T> StoreOptionExt<T> for Option<T> {
    fn or_not_found(self, message: &'static str) -> Result<T, AppError> {
        self.ok_or_else(|| AppError::not_found(message))
    }
}

/// What every rendered page needs: the logged-in user for the navigation
/// bar and the pending flash notice, which rendering consumes.
pub struct PageContext {
    pub user: Option<User>,
    pub flash: Option<Flash>,
    /// Set whenever the flash cookie was sent, even if it did not parse.
    flash_cookie: bool,
}

impl PageContext {
    #[must_use]
    pub fn render(self, title: &str, body: &str) -> Response {
        self.render_with_status(StatusCode::OK, title, body)
    }

    #[must_use]
    pub fn render_with_status(self, status: StatusCode, title: &str, body: &str) -> Response {
        let html = views::layout(title, self.user.as_ref(), self.flash.as_ref(), body);
        let mut response = (status, Html(html)).into_response();
        if self.flash_cookie {
            response
                .headers_mut()
                .append(SET_COOKIE, Flash::clear_cookie());
        }
        response
    }
}

impl FromRequestParts<Arc<AppState>> for PageContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let current = CurrentUser::from_request_parts(parts, state).await?;
        Ok(PageContext {
            user: current.user,
            flash: Flash::from_headers(&parts.headers),
            flash_cookie: Flash::is_pending(&parts.headers),
        })
    }
}
