mod schema;
mod sqlite;
mod unit_of_work;

pub use sqlite::SqliteStore;
pub use unit_of_work::UnitOfWork;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
///
/// Relationships are plain foreign keys: a snippet's author is loaded with
/// `get_user(snippet.author_id)`, an author's snippets with the `*_by_author`
/// queries.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;
    fn drop_schema(&self) -> Result<()>;

    /// Starts a unit of work. Writes issued through it are committed
    /// atomically by `UnitOfWork::commit`. While it is open, query through
    /// the unit rather than the store.
    fn begin(&self) -> Result<UnitOfWork<'_>>;

    // User operations
    fn create_user(&self, user: &NewUser) -> Result<User>;
    fn get_user(&self, id: i64) -> Result<Option<User>>;
    fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    // Snippet operations
    fn create_snippet(&self, snippet: &NewSnippet) -> Result<Snippet>;
    fn get_snippet(&self, id: i64) -> Result<Option<Snippet>>;
    fn list_recent_snippets(&self, limit: i64) -> Result<Vec<SnippetSummary>>;
    fn list_snippets_by_author(
        &self,
        author_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SnippetSummary>>;
    fn count_snippets_by_author(&self, author_id: i64) -> Result<i64>;

    // Session operations
    fn create_session(&self, session: &SessionRecord) -> Result<()>;
    fn get_session(&self, token_hash: &str) -> Result<Option<SessionRecord>>;
    fn delete_session(&self, token_hash: &str) -> Result<bool>;
    fn delete_expired_sessions(&self) -> Result<usize>;
}
