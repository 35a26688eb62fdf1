use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::schema::{DROP_SCHEMA, SCHEMA};
use super::{Store, UnitOfWork};
use crate::error::{Error, Result};
use crate::types::*;

const SNIPPET_SUMMARY_COLUMNS: &str =
    "s.id, s.title, s.language_tag, s.author_id, u.username";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

pub(super) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
    })
}

fn snippet_from_row(row: &Row<'_>) -> rusqlite::Result<Snippet> {
    Ok(Snippet {
        id: row.get(0)?,
        title: row.get(1)?,
        language_tag: row.get(2)?,
        author_id: row.get(3)?,
        raw_content: row.get(4)?,
        formatted_content: row.get(5)?,
    })
}

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<SnippetSummary> {
    Ok(SnippetSummary {
        id: row.get(0)?,
        title: row.get(1)?,
        language_tag: row.get(2)?,
        author_id: row.get(3)?,
        author_username: row.get(4)?,
    })
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<SessionRecord> {
    Ok(SessionRecord {
        token_hash: row.get(0)?,
        user_id: row.get(1)?,
        created_at: parse_datetime(&row.get::<_, String>(2)?),
        expires_at: parse_datetime(&row.get::<_, String>(3)?),
    })
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    fn drop_schema(&self) -> Result<()> {
        self.conn().execute_batch(DROP_SCHEMA)?;
        Ok(())
    }

    fn begin(&self) -> Result<UnitOfWork<'_>> {
        UnitOfWork::begin(self.conn())
    }

    // User operations

    fn create_user(&self, user: &NewUser) -> Result<User> {
        let uow = self.begin()?;
        let created = uow.add_user(user)?;
        uow.commit()?;
        Ok(created)
    }

    fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, username, email, password_hash FROM users WHERE id = ?1",
            params![id],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, username, email, password_hash FROM users WHERE username = ?1",
            params![username],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, username, email, password_hash FROM users WHERE email = ?1",
            params![email],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    // Snippet operations

    fn create_snippet(&self, snippet: &NewSnippet) -> Result<Snippet> {
        let uow = self.begin()?;
        let created = uow.add_snippet(snippet)?;
        uow.commit()?;
        Ok(created)
    }

    fn get_snippet(&self, id: i64) -> Result<Option<Snippet>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, title, language_tag, author_id, raw_content, formatted_content
             FROM snippets WHERE id = ?1",
            params![id],
            snippet_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_recent_snippets(&self, limit: i64) -> Result<Vec<SnippetSummary>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SNIPPET_SUMMARY_COLUMNS}
             FROM snippets s JOIN users u ON u.id = s.author_id
             ORDER BY s.id DESC LIMIT ?1"
        ))?;

        let rows = stmt.query_map(params![limit], summary_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_snippets_by_author(
        &self,
        author_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SnippetSummary>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SNIPPET_SUMMARY_COLUMNS}
             FROM snippets s JOIN users u ON u.id = s.author_id
             WHERE s.author_id = ?1
             ORDER BY s.id DESC LIMIT ?2 OFFSET ?3"
        ))?;

        let rows = stmt.query_map(params![author_id, limit, offset], summary_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn count_snippets_by_author(&self, author_id: i64) -> Result<i64> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM snippets WHERE author_id = ?1",
            params![author_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // Session operations

    fn create_session(&self, session: &SessionRecord) -> Result<()> {
        self.conn().execute(
            "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                session.token_hash,
                session.user_id,
                format_datetime(&session.created_at),
                format_datetime(&session.expires_at),
            ],
        )?;
        Ok(())
    }

    fn get_session(&self, token_hash: &str) -> Result<Option<SessionRecord>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT token_hash, user_id, created_at, expires_at
             FROM sessions WHERE token_hash = ?1",
            params![token_hash],
            session_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn delete_session(&self, token_hash: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM sessions WHERE token_hash = ?1",
            params![token_hash],
        )?;
        Ok(rows > 0)
    }

    fn delete_expired_sessions(&self) -> Result<usize> {
        let conn = self.conn();
        let expired: Vec<String> = {
            let mut stmt = conn.prepare("SELECT token_hash, expires_at FROM sessions")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            let now = Utc::now();
            rows.collect::<std::result::Result<Vec<_>, _>>()?
                .into_iter()
                .filter(|(_, expires_at)| parse_datetime(expires_at) <= now)
                .map(|(token_hash, _)| token_hash)
                .collect()
        };

        let mut removed = 0;
        for token_hash in &expired {
            removed += conn.execute(
                "DELETE FROM sessions WHERE token_hash = ?1",
                params![token_hash],
            )?;
        }
        Ok(removed)
    }
}
