use chrono::{DateTime, Utc};

use crate::auth::PasswordHasher;
use crate::error::Result;
use crate::highlight::Highlighter;

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    pub language_tag: String,
    pub author_id: i64,
    pub raw_content: String,
    pub formatted_content: String,
}

/// A snippet row joined with its author's username, for listings.
#[derive(Debug, Clone)]
pub struct SnippetSummary {
    pub id: i64,
    pub title: String,
    pub language_tag: String,
    pub author_id: i64,
    pub author_username: String,
}

/// A user that has not been persisted yet. The plaintext password never
/// leaves the constructor.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

impl NewUser {
    pub fn new(
        hasher: &PasswordHasher,
        username: impl Into<String>,
        email: impl Into<String>,
        plaintext: &str,
    ) -> Result<Self> {
        Ok(Self {
            username: username.into(),
            email: email.into(),
            password_hash: hasher.hash(plaintext)?,
        })
    }
}

/// A snippet that has not been persisted yet. `formatted_content` is
/// rendered once here and stored alongside the raw text.
#[derive(Debug, Clone)]
pub struct NewSnippet {
    pub title: String,
    pub language_tag: String,
    pub author_id: i64,
    pub raw_content: String,
    pub formatted_content: String,
}

impl NewSnippet {
    pub fn new(
        highlighter: &Highlighter,
        title: impl Into<String>,
        language_tag: impl Into<String>,
        author_id: i64,
        raw_content: impl Into<String>,
    ) -> Result<Self> {
        let language_tag = language_tag.into();
        let raw_content = raw_content.into();
        let formatted_content = highlighter.render(&raw_content, &language_tag)?;
        Ok(Self {
            title: title.into(),
            language_tag,
            author_id,
            raw_content,
            formatted_content,
        })
    }
}

/// Server-side session record. Only the SHA-256 of the client token is kept.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub token_hash: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
