use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Router, routing::get};

use super::{account, pages, snippets};
use crate::auth::PasswordHasher;
use crate::config::ServerConfig;
use crate::error::Result;
use crate::highlight::Highlighter;
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub hasher: PasswordHasher,
    pub highlighter: Arc<Highlighter>,
    /// Lifetime of a login session, in seconds.
    pub session_ttl_seconds: i64,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        highlighter: Arc<Highlighter>,
        config: &ServerConfig,
    ) -> Result<Self> {
        Ok(Self {
            store,
            hasher: PasswordHasher::new(config.password_hash)?,
            highlighter,
            session_ttl_seconds: config.session_ttl_seconds(),
            secure_cookies: config.secure_cookies,
        })
    }
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(snippets::index).post(snippets::index))
        .route("/about", get(pages::about))
        .route("/health", get(pages::health))
        .route("/static/highlight.css", get(pages::stylesheet))
        // Account routes
        .route(
            "/register",
            get(account::register_form).post(account::register),
        )
        .route("/login", get(account::login_form).post(account::login))
        .route("/logout", get(account::logout))
        // Snippet routes
        .route("/dashboard", get(snippets::dashboard))
        .route("/dashboard/{page}", get(snippets::dashboard_page))
        .route(
            "/snippet/new",
            get(snippets::new_snippet_form).post(snippets::create_snippet),
        )
        .route("/snippet/view/{id}", get(snippets::view_snippet))
        .fallback(pages::not_found)
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
