mod account;
pub mod flash;
mod pages;
pub mod response;
mod router;
mod snippets;
pub mod validation;
pub mod views;

pub use account::{LOGGED_IN, LOGGED_OUT, REGISTERED};
pub use router::{AppState, create_router};
pub use snippets::{DASHBOARD_PAGE_SIZE, RECENT_LIMIT, SNIPPET_CREATED};
