use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use axum::Router;
use axum::body::Body;
use axum::http::{
    Method, Request, StatusCode,
    header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
};
use tempfile::TempDir;
use tower::ServiceExt;

use pastebin::auth::PasswordHashConfig;
use pastebin::config::ServerConfig;
use pastebin::highlight::Highlighter;
use pastebin::server::{AppState, create_router};
use pastebin::store::{SqliteStore, Store};
use pastebin::types::{NewSnippet, NewUser, Snippet, User};

pub const TEST_USERNAME: &str = "test_user";
pub const TEST_EMAIL: &str = "test_user@example.com";
pub const TEST_PASSWORD: &str = "password";

const MAX_REDIRECTS: usize = 10;

static HIGHLIGHTER: LazyLock<Arc<Highlighter>> =
    LazyLock::new(|| Arc::new(Highlighter::new().expect("load highlighter")));

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

/// Drives the real router in-process, with a cookie jar and optional
/// redirect following, the way a browser would.
pub struct TestApp {
    temp_dir: TempDir,
    pub state: Arc<AppState>,
    router: Router,
    cookies: HashMap<String, String>,
}

impl TestApp {
    /// Fresh database with the default `test_user` account.
    pub fn new() -> Self {
        let app = Self::empty();
        app.seed_user(TEST_USERNAME, TEST_EMAIL, TEST_PASSWORD);
        app
    }

    pub fn empty() -> Self {
        Self::build(|store| store)
    }

    /// Like `new`, but the router sees the store through `wrap`.
    pub fn with_store(wrap: impl FnOnce(Arc<dyn Store>) -> Arc<dyn Store>) -> Self {
        let app = Self::build(wrap);
        app.seed_user(TEST_USERNAME, TEST_EMAIL, TEST_PASSWORD);
        app
    }

    fn build(wrap: impl FnOnce(Arc<dyn Store>) -> Arc<dyn Store>) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let config = ServerConfig {
            database: temp_dir.path().join("pastebin.db"),
            password_hash: PasswordHashConfig {
                memory_kib: 64,
                iterations: 1,
                parallelism: 1,
            },
            ..ServerConfig::default()
        };

        let store = SqliteStore::new(&config.database).expect("open store");
        store.initialize().expect("initialize schema");

        let state = Arc::new(
            AppState::new(wrap(Arc::new(store)), Arc::clone(&HIGHLIGHTER), &config)
                .expect("build app state"),
        );
        let router = create_router(Arc::clone(&state));

        Self {
            temp_dir,
            state,
            router,
            cookies: HashMap::new(),
        }
    }

    pub fn seed_user(&self, username: &str, email: &str, password: &str) -> User {
        let new_user =
            NewUser::new(&self.state.hasher, username, email, password).expect("hash password");
        self.state.store.create_user(&new_user).expect("create user")
    }

    pub fn seed_snippet(&self, author_id: i64, title: &str) -> Snippet {
        let new_snippet = NewSnippet::new(
            &self.state.highlighter,
            title,
            "python",
            author_id,
            "print('hello world')",
        )
        .expect("render snippet");
        self.state
            .store
            .create_snippet(&new_snippet)
            .expect("create snippet")
    }

    pub fn test_user(&self) -> User {
        self.state
            .store
            .find_user_by_username(TEST_USERNAME)
            .expect("query user")
            .expect("test user exists")
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        let response = self.send(Method::GET, path, None).await;
        self.follow(response).await
    }

    pub async fn get_no_follow(&mut self, path: &str) -> TestResponse {
        self.send(Method::GET, path, None).await
    }

    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let response = self.post_form_no_follow(path, fields).await;
        self.follow(response).await
    }

    pub async fn post_form_no_follow(
        &mut self,
        path: &str,
        fields: &[(&str, &str)],
    ) -> TestResponse {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
        confirm: &str,
    ) -> TestResponse {
        self.post_form(
            "/register",
            &[
                ("username", username),
                ("email", email),
                ("password", password),
                ("confirm_password", confirm),
            ],
        )
        .await
    }

    pub async fn login(&mut self, username: &str, password: &str) -> TestResponse {
        self.post_form("/login", &[("username", username), ("password", password)])
            .await
    }

    pub async fn logout(&mut self) -> TestResponse {
        self.get("/logout").await
    }

    pub async fn create_snippet(
        &mut self,
        title: &str,
        language: &str,
        raw_content: &str,
    ) -> TestResponse {
        self.post_form(
            "/snippet/new",
            &[
                ("title", title),
                ("language", language),
                ("raw_content", raw_content),
            ],
        )
        .await
    }

    async fn follow(&mut self, mut response: TestResponse) -> TestResponse {
        for _ in 0..MAX_REDIRECTS {
            if !response.status.is_redirection() {
                return response;
            }
            let location = response.location.clone().expect("redirect without location");
            response = self.send(Method::GET, &location, None).await;
        }
        panic!("too many redirects");
    }

    async fn send(&mut self, method: Method, path: &str, form: Option<String>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);

        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(COOKIE, cookie);
        }

        let body = match form {
            Some(form) => {
                builder = builder.header(CONTENT_TYPE, "application/x-www-form-urlencoded");
                Body::from(form)
            }
            None => Body::empty(),
        };

        let request = builder.body(body).expect("build request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        for header in response.headers().get_all(SET_COOKIE) {
            self.store_cookie(header.to_str().expect("ascii cookie"));
        }

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .map(|v| v.to_str().expect("ascii location").to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");

        TestResponse {
            status,
            location,
            body: String::from_utf8(bytes.to_vec()).expect("utf-8 body"),
        }
    }

    fn store_cookie(&mut self, set_cookie: &str) {
        let mut parts = set_cookie.split(';').map(str::trim);
        let Some((name, value)) = parts.next().and_then(|p| p.split_once('=')) else {
            return;
        };
        let expired = parts.any(|attr| attr.eq_ignore_ascii_case("Max-Age=0"));
        if expired || value.is_empty() {
            self.cookies.remove(name);
        } else {
            self.cookies.insert(name.to_string(), value.to_string());
        }
    }

    pub fn data_dir(&self) -> &std::path::Path {
        self.temp_dir.path()
    }
}
