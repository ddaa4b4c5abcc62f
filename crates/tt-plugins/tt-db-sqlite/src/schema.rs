//! Tables created at startup. Every statement is idempotent.

pub(crate) const STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id            BLOB PRIMARY KEY,
        email         TEXT NOT NULL UNIQUE,
        display_name  TEXT NOT NULL,
        bio           TEXT,
        role          TEXT NOT NULL DEFAULT 'editor',
        password_hash TEXT NOT NULL,
        created_at    TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS sessions (
        token_hash TEXT PRIMARY KEY,
        user_id    BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at TEXT NOT NULL,
        expires_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS documents (
        id           BLOB PRIMARY KEY,
        title        TEXT NOT NULL,
        slug         TEXT NOT NULL UNIQUE,
        kind         TEXT NOT NULL,
        hero_image   TEXT,
        content      TEXT NOT NULL DEFAULT '',
        status       TEXT NOT NULL DEFAULT 'draft',
        author_id    BLOB NOT NULL REFERENCES users(id),
        created_at   TEXT NOT NULL,
        updated_at   TEXT NOT NULL,
        published_at TEXT,
        reviewed_at  TEXT
    )",
    "CREATE INDEX IF NOT EXISTS documents_status_kind ON documents (status, kind)",
    "CREATE TABLE IF NOT EXISTS submissions (
        id         BLOB PRIMARY KEY,
        name       TEXT NOT NULL,
        email      TEXT,
        message    TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
];
