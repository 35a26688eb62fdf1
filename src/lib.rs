//! # Pastebin
//!
//! A small multi-user pastebin: accounts, syntax-highlighted snippets and a
//! paginated dashboard, usable both as a standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pastebin::config::ServerConfig;
//! use pastebin::highlight::Highlighter;
//! use pastebin::server::{AppState, create_router};
//! use pastebin::store::{SqliteStore, Store};
//!
//! let config = ServerConfig::default();
//! let store = SqliteStore::new(&config.database).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(
//!     Arc::new(store),
//!     Arc::new(Highlighter::new().unwrap()),
//!     &config,
//! ).unwrap());
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `pastebin` binary. Disable with `default-features = false`.

pub mod auth;
pub mod config;
pub mod error;
pub mod highlight;
pub mod server;
pub mod store;
pub mod types;
