//! Snippet listing, creation and display.

use std::sync::Arc;

use axum::{
    Form,
    extract::{Path, State},
    response::Response,
};
use tracing::info;

use super::flash::{Flash, redirect_with_flash};
use super::response::{AppError, PageContext, StoreOptionExt, StoreResultExt};
use super::validation::{SnippetForm, ValidationResult};
use super::views;
use crate::auth::RequireLogin;
use crate::server::AppState;
use crate::types::NewSnippet;

pub const RECENT_LIMIT: i64 = 20;
pub const DASHBOARD_PAGE_SIZE: i64 = 10;

pub const SNIPPET_CREATED: &str = "The new snippet has been successfully created.";

pub async fn index(
    page: PageContext,
    State(state): State<Arc<AppState>>,
) -> Result<Response, AppError> {
    let recent = state
        .store
        .list_recent_snippets(RECENT_LIMIT)
        .page_err("Failed to list recent snippets")?;

    let logged_in = page.user.is_some();
    Ok(page.render("Home", &views::index_page(&recent, logged_in)))
}

pub async fn dashboard(
    login: RequireLogin,
    page: PageContext,
    state: State<Arc<AppState>>,
) -> Result<Response, AppError> {
    render_dashboard(login, page, state, 1)
}

pub async fn dashboard_page(
    login: RequireLogin,
    page: PageContext,
    state: State<Arc<AppState>>,
    Path(number): Path<String>,
) -> Result<Response, AppError> {
    let number = parse_id(&number).or_not_found("Page not found")?;
    render_dashboard(login, page, state, number)
}

/// Number of pages needed for `total` items; an empty listing still has one.
fn page_count(total: i64) -> i64 {
    ((total + DASHBOARD_PAGE_SIZE - 1) / DASHBOARD_PAGE_SIZE).max(1)
}

fn render_dashboard(
    RequireLogin(user): RequireLogin,
    page: PageContext,
    State(state): State<Arc<AppState>>,
    number: i64,
) -> Result<Response, AppError> {
    let total = state
        .store
        .count_snippets_by_author(user.id)
        .page_err("Failed to count snippets")?;

    let pages = page_count(total);
    if number > pages {
        return Err(AppError::not_found("Page not found"));
    }

    let snippets = state
        .store
        .list_snippets_by_author(user.id, DASHBOARD_PAGE_SIZE, (number - 1) * DASHBOARD_PAGE_SIZE)
        .page_err("Failed to list snippets")?;

    Ok(page.render(
        "Dashboard",
        &views::dashboard_page(&user, &snippets, number, pages, total),
    ))
}

pub async fn new_snippet_form(_login: RequireLogin, page: PageContext) -> Response {
    page.render(
        "New Snippet",
        &views::snippet_form_page(&SnippetForm::default(), &ValidationResult::default()),
    )
}

pub async fn create_snippet(
    RequireLogin(user): RequireLogin,
    page: PageContext,
    State(state): State<Arc<AppState>>,
    Form(form): Form<SnippetForm>,
) -> Result<Response, AppError> {
    let result = form.validate();
    if !result.is_valid() {
        return Ok(page.render("New Snippet", &views::snippet_form_page(&form, &result)));
    }

    let new_snippet = NewSnippet::new(
        &state.highlighter,
        form.title.as_str(),
        form.language_tag(),
        user.id,
        form.raw_content.as_str(),
    )
    .page_err("Failed to highlight snippet")?;

    let snippet = state
        .store
        .create_snippet(&new_snippet)
        .page_err("Failed to create snippet")?;

    info!(
        "User {} created snippet {} ({})",
        user.username, snippet.id, snippet.language_tag
    );

    Ok(redirect_with_flash(
        &format!("/snippet/view/{}", snippet.id),
        Flash::success(SNIPPET_CREATED),
    ))
}

pub async fn view_snippet(
    page: PageContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id).or_not_found("Snippet not found")?;

    let snippet = state
        .store
        .get_snippet(id)
        .page_err("Failed to get snippet")?
        .or_not_found("Snippet not found")?;

    let author = state
        .store
        .get_user(snippet.author_id)
        .page_err("Failed to get snippet author")?;

    Ok(page.render(&snippet.title, &views::snippet_page(&snippet, author.as_ref())))
}

/// Positive integer path segment; anything else is treated as a missing page.
fn parse_id(segment: &str) -> Option<i64> {
    segment.parse::<i64>().ok().filter(|n| *n >= 1)
}
