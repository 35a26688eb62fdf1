pub const SCHEMA: &str = r#"
-- Registered accounts; immutable after creation
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,       -- argon2id PHC string with embedded salt
    created_at TEXT DEFAULT (datetime('now'))
);

-- Snippets keep the highlighted rendering next to the raw text
CREATE TABLE IF NOT EXISTS snippets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    language_tag TEXT NOT NULL,
    author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    raw_content TEXT NOT NULL,
    formatted_content TEXT NOT NULL,   -- rendered once at creation, never recomputed
    created_at TEXT DEFAULT (datetime('now'))
);

-- Server-side login sessions, keyed by SHA-256 of the cookie token
CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_snippets_author ON snippets(author_id);
CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
"#;

pub const DROP_SCHEMA: &str = r#"
DROP TABLE IF EXISTS sessions;
DROP TABLE IF EXISTS snippets;
DROP TABLE IF EXISTS users;
"#;
