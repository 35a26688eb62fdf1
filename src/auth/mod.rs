mod middleware;
mod password;
mod session;

pub use middleware::{CurrentUser, LOGIN_REQUIRED, LoginRejection, RequireLogin};
pub use password::{PasswordHashConfig, PasswordHasher};
pub use session::{
    SESSION_COOKIE_NAME, Session, clear_session_cookie, generate_session_token,
    hash_session_token, read_cookie, session_cookie,
};
