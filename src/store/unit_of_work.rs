use std::sync::MutexGuard;

use rusqlite::{Connection, ErrorCode, OptionalExtension, params};

use super::sqlite::user_from_row;
use crate::error::{Error, Result};
use crate::types::{NewSnippet, NewUser, Snippet, User};

/// A group of pending writes that become visible together on `commit`.
///
/// Holds the store's connection for its whole lifetime, so concurrent
/// requests never interleave inside one unit. The same thread must not call
/// `Store` methods while a unit is open: they wait on the connection this
/// unit holds. Use the unit's own lookups instead. Dropping without
/// `commit` rolls back.
pub struct UnitOfWork<'a> {
    conn: MutexGuard<'a, Connection>,
    finished: bool,
}

impl<'a> UnitOfWork<'a> {
    pub(super) fn begin(conn: MutexGuard<'a, Connection>) -> Result<Self> {
        conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(Self {
            conn,
            finished: false,
        })
    }

    /// Sees the unit's own uncommitted writes.
    pub fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.find_user("username", username)
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_user("email", email)
    }

    fn find_user(&self, column: &'static str, value: &str) -> Result<Option<User>> {
        self.conn
            .query_row(
                &format!("SELECT id, username, email, password_hash FROM users WHERE {column} = ?1"),
                params![value],
                user_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    pub fn add_user(&self, user: &NewUser) -> Result<User> {
        self.conn
            .execute(
                "INSERT INTO users (username, email, password_hash) VALUES (?1, ?2, ?3)",
                params![user.username, user.email, user.password_hash],
            )
            .map_err(map_user_conflict)?;

        Ok(User {
            id: self.conn.last_insert_rowid(),
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
        })
    }

    pub fn add_snippet(&self, snippet: &NewSnippet) -> Result<Snippet> {
        self.conn
            .execute(
                "INSERT INTO snippets (title, language_tag, author_id, raw_content, formatted_content)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    snippet.title,
                    snippet.language_tag,
                    snippet.author_id,
                    snippet.raw_content,
                    snippet.formatted_content,
                ],
            )
            .map_err(map_missing_author)?;

        Ok(Snippet {
            id: self.conn.last_insert_rowid(),
            title: snippet.title.clone(),
            language_tag: snippet.language_tag.clone(),
            author_id: snippet.author_id,
            raw_content: snippet.raw_content.clone(),
            formatted_content: snippet.formatted_content.clone(),
        })
    }

    /// A failed `COMMIT` leaves the transaction open; dropping `self` on
    /// the error path rolls it back.
    pub fn commit(mut self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        self.finished = true;
        Ok(())
    }

    pub fn rollback(mut self) -> Result<()> {
        self.conn.execute_batch("ROLLBACK")?;
        self.finished = true;
        Ok(())
    }
}

impl Drop for UnitOfWork<'_> {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                tracing::warn!("Failed to roll back unit of work: {e}");
            }
        }
    }
}

fn constraint_message(err: &rusqlite::Error) -> Option<&str> {
    match err {
        rusqlite::Error::SqliteFailure(code, Some(message))
            if code.code == ErrorCode::ConstraintViolation =>
        {
            Some(message.as_str())
        }
        _ => None,
    }
}

/// The unique index is the authoritative uniqueness check; handler
/// pre-checks only exist to report both fields at once.
fn map_user_conflict(err: rusqlite::Error) -> Error {
    match constraint_message(&err) {
        Some(message) if message.contains("users.username") => Error::UsernameTaken,
        Some(message) if message.contains("users.email") => Error::EmailTaken,
        _ => Error::Database(err),
    }
}

fn map_missing_author(err: rusqlite::Error) -> Error {
    match constraint_message(&err) {
        Some(message) if message.contains("FOREIGN KEY") => Error::NotFound,
        _ => Error::Database(err),
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use crate::auth::{PasswordHashConfig, PasswordHasher};
    use crate::store::{SqliteStore, Store};
    use crate::types::NewUser;

    fn setup() -> (TempDir, SqliteStore) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        (temp, store)
    }

    fn new_user(username: &str, email: &str) -> NewUser {
        let hasher = PasswordHasher::new(PasswordHashConfig {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap();
        NewUser::new(&hasher, username, email, "password").unwrap()
    }

    #[test]
    fn test_lookups_inside_unit_see_pending_writes() {
        let (_temp, store) = setup();

        let uow = store.begin().unwrap();
        assert!(uow.find_user_by_username("alice").unwrap().is_none());

        let alice = uow.add_user(&new_user("alice", "alice@example.com")).unwrap();
        let by_name = uow.find_user_by_username("alice").unwrap().unwrap();
        let by_email = uow.find_user_by_email("alice@example.com").unwrap().unwrap();
        assert_eq!(by_name.id, alice.id);
        assert_eq!(by_email.id, alice.id);
        uow.commit().unwrap();

        assert!(store.find_user_by_username("alice").unwrap().is_some());
    }

    #[test]
    fn test_uniqueness_decided_inside_unit() {
        let (_temp, store) = setup();
        store.create_user(&new_user("alice", "alice@example.com")).unwrap();

        let uow = store.begin().unwrap();
        assert!(uow.find_user_by_username("alice").unwrap().is_some());
        assert!(uow.find_user_by_email("bob@example.com").unwrap().is_none());
        uow.rollback().unwrap();
    }

    #[test]
    fn test_failed_commit_rolls_back() {
        let (_temp, store) = setup();

        let uow = store.begin().unwrap();
        uow.conn
            .execute_batch("PRAGMA defer_foreign_keys = ON")
            .unwrap();
        uow.conn
            .execute(
                "INSERT INTO snippets (title, language_tag, author_id, raw_content, formatted_content)
                 VALUES ('orphan', 'text', 999, 'x', 'x')",
                [],
            )
            .unwrap();
        assert!(uow.commit().is_err());

        // The connection is out of the failed transaction and usable again.
        let uow = store.begin().unwrap();
        uow.add_user(&new_user("alice", "alice@example.com")).unwrap();
        uow.commit().unwrap();
        assert!(store.find_user_by_username("alice").unwrap().is_some());
        assert_eq!(store.list_recent_snippets(10).unwrap().len(), 0);
    }
}
