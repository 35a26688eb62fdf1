use std::sync::Arc;

use axum::{
    extract::State,
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};

use super::response::{AppError, PageContext};
use super::views;
use crate::server::AppState;

pub async fn about(page: PageContext) -> Response {
    page.render("About", &views::about_page())
}

pub async fn health() -> &'static str {
    "OK"
}

pub async fn stylesheet(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/css; charset=utf-8")],
        state.highlighter.stylesheet().to_string(),
    )
}

pub async fn not_found() -> AppError {
    AppError::not_found("Page not found")
}
