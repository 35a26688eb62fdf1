//! One-shot notices carried to the next rendered page in a cookie.

use axum::http::{HeaderMap, HeaderValue, header::InvalidHeaderValue, header::SET_COOKIE};
use axum::response::{IntoResponse, Redirect, Response};

use crate::auth::read_cookie;

pub const FLASH_COOKIE_NAME: &str = "pastebin_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Info,
    Error,
}

impl FlashKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FlashKind::Success => "success",
            FlashKind::Info => "info",
            FlashKind::Error => "error",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(FlashKind::Success),
            "info" => Some(FlashKind::Info),
            "error" => Some(FlashKind::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    /// Reads the pending flash from the request cookies, if any.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let value = read_cookie(headers, FLASH_COOKIE_NAME)?;
        let (kind, message) = value.split_once(':')?;
        let message = urlencoding::decode(message).ok()?;
        Some(Self {
            kind: FlashKind::parse(kind)?,
            message: message.into_owned(),
        })
    }

    /// Whether the request carries a flash cookie, readable or not.
    #[must_use]
    pub fn is_pending(headers: &HeaderMap) -> bool {
        read_cookie(headers, FLASH_COOKIE_NAME).is_some()
    }

    pub fn set_cookie(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        HeaderValue::from_str(&format!(
            "{FLASH_COOKIE_NAME}={}:{}; Path=/; HttpOnly; SameSite=Lax",
            self.kind.as_str(),
            urlencoding::encode(&self.message)
        ))
    }

    #[must_use]
    pub fn clear_cookie() -> HeaderValue {
        HeaderValue::from_static("pastebin_flash=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
    }
}

/// See-other redirect that leaves a notice for the target page.
pub fn redirect_with_flash(to: &str, flash: Flash) -> Response {
    let mut response = Redirect::to(to).into_response();
    match flash.set_cookie() {
        Ok(cookie) => {
            response.headers_mut().append(SET_COOKIE, cookie);
        }
        Err(e) => tracing::warn!("Failed to encode flash cookie: {e}"),
    }
    response
}

#[cfg(test)]
mod tests {
    use axum::http::header::COOKIE;

    use super::*;

    fn request_with_cookie(cookie: &HeaderValue) -> HeaderMap {
        let pair = cookie.to_str().unwrap().split(';').next().unwrap().to_string();
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(&pair).unwrap());
        headers
    }

    #[test]
    fn test_flash_survives_cookie_trip() {
        let flash = Flash::success("You have logged in successfully.");
        let headers = request_with_cookie(&flash.set_cookie().unwrap());

        assert_eq!(Flash::from_headers(&headers), Some(flash));
    }

    #[test]
    fn test_message_with_separators_is_encoded() {
        let flash = Flash::error("a; b=c: d");
        let cookie = flash.set_cookie().unwrap();
        assert!(!cookie.to_str().unwrap().contains("a; b"));

        let headers = request_with_cookie(&cookie);
        assert_eq!(Flash::from_headers(&headers).unwrap().message, "a; b=c: d");
    }

    #[test]
    fn test_garbage_cookie_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("pastebin_flash=bogus"));
        assert_eq!(Flash::from_headers(&headers), None);

        headers.insert(COOKIE, HeaderValue::from_static("pastebin_flash=loud:hi"));
        assert_eq!(Flash::from_headers(&headers), None);
        assert!(Flash::is_pending(&headers));
    }

    #[test]
    fn test_no_cookie_is_not_pending() {
        let mut headers = HeaderMap::new();
        assert!(!Flash::is_pending(&headers));

        headers.insert(COOKIE, HeaderValue::from_static("pastebin_session=abc"));
        assert!(!Flash::is_pending(&headers));
    }

    #[test]
    fn test_redirect_sets_cookie() {
        let response = redirect_with_flash("/login", Flash::info("You must log in first"));

        assert_eq!(response.status(), axum::http::StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/login");
        assert!(
            response.headers()[SET_COOKIE]
                .to_str()
                .unwrap()
                .starts_with("pastebin_flash=info:")
        );
    }
}
