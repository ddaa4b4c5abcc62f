//! # tt-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `tt-core` domain models.

mod schema;

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tt_core::error::{AppError, Result};
use tt_core::models::{ContentDocument, DocumentFilter, Session, Submission, User};
use tt_core::traits::{ContentRepo, SubmissionRepo, UserRepo};
use uuid::Uuid;

/// One pool serving every repository port.
#[derive(Clone)]
pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    /// Connects and creates missing tables.
    ///
    /// An in-memory database lives only as long as its connection, so
    /// `:memory:` URLs get a single connection that is never recycled.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let mut pool_options = SqlitePoolOptions::new();
        if url.contains(":memory:") {
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = pool_options.connect_with(options).await?;

        for statement in schema::STATEMENTS {
            sqlx::query(statement).execute(&pool).await?;
        }
        log::info!("sqlite store ready at {url}");
        Ok(Self { pool })
    }
}

// Helper for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> std::result::Result<Uuid, sqlx::Error> {
    Uuid::from_slice(blob).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

fn parse_column<T>(row: &SqliteRow, column: &str) -> std::result::Result<T, sqlx::Error>
where
    T: FromStr<Err = AppError>,
{
    row.try_get::<String, _>(column)?
        .parse()
        .map_err(|e: AppError| sqlx::Error::Decode(Box::new(e)))
}

/// Unique violations become `Conflict`; everything else is internal.
fn db_err(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(db.message().to_string())
        }
        _ => {
            log::error!("database error: {err}");
            AppError::Internal(err.to_string())
        }
    }
}

fn document_from_row(row: &SqliteRow) -> std::result::Result<ContentDocument, sqlx::Error> {
    Ok(ContentDocument {
        id: blob_to_uuid(&row.try_get::<Vec<u8>, _>("id")?)?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        kind: parse_column(row, "kind")?,
        hero_image: row.try_get("hero_image")?,
        content: row.try_get("content")?,
        status: parse_column(row, "status")?,
        author_id: blob_to_uuid(&row.try_get::<Vec<u8>, _>("author_id")?)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        published_at: row.try_get("published_at")?,
        reviewed_at: row.try_get("reviewed_at")?,
    })
}

fn user_from_row(row: &SqliteRow) -> std::result::Result<User, sqlx::Error> {
    Ok(User {
        id: blob_to_uuid(&row.try_get::<Vec<u8>, _>("id")?)?,
        email: row.try_get("email")?,
        display_name: row.try_get("display_name")?,
        bio: row.try_get("bio")?,
        role: parse_column(row, "role")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
    })
}

fn session_from_row(row: &SqliteRow) -> std::result::Result<Session, sqlx::Error> {
    Ok(Session {
        token_hash: row.try_get("token_hash")?,
        user_id: blob_to_uuid(&row.try_get::<Vec<u8>, _>("user_id")?)?,
        created_at: row.try_get("created_at")?,
        expires_at: row.try_get("expires_at")?,
    })
}

const DOCUMENT_COLUMNS: &str = "id, title, slug, kind, hero_image, content, status, author_id, \
     created_at, updated_at, published_at, reviewed_at";

#[async_trait]
impl ContentRepo for SqliteRepo {
    async fn insert_document(&self, doc: &ContentDocument) -> Result<()> {
        sqlx::query(
            "INSERT INTO documents (id, title, slug, kind, hero_image, content, status, author_id, \
             created_at, updated_at, published_at, reviewed_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(doc.id))
        .bind(&doc.title)
        .bind(&doc.slug)
        .bind(doc.kind.as_str())
        .bind(&doc.hero_image)
        .bind(&doc.content)
        .bind(doc.status.as_str())
        .bind(uuid_to_blob(doc.author_id))
        .bind(doc.created_at)
        .bind(doc.updated_at)
        .bind(doc.published_at)
        .bind(doc.reviewed_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn update_document(&self, doc: &ContentDocument) -> Result<()> {
        let result = sqlx::query(
            "UPDATE documents SET title = ?, slug = ?, hero_image = ?, content = ?, status = ?, \
             updated_at = ?, published_at = ?, reviewed_at = ? WHERE id = ?",
        )
        .bind(&doc.title)
        .bind(&doc.slug)
        .bind(&doc.hero_image)
        .bind(&doc.content)
        .bind(doc.status.as_str())
        .bind(doc.updated_at)
        .bind(doc.published_at)
        .bind(doc.reviewed_at)
        .bind(uuid_to_blob(doc.id))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Document".into(), doc.id.to_string()));
        }
        Ok(())
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<ContentDocument>> {
        let row = sqlx::query(&format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?"))
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(document_from_row).transpose().map_err(db_err)
    }

    async fn get_document_by_slug(&self, slug: &str) -> Result<Option<ContentDocument>> {
        let row = sqlx::query(&format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE slug = ?"))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(document_from_row).transpose().map_err(db_err)
    }

    async fn list_documents(&self, filter: &DocumentFilter) -> Result<Vec<ContentDocument>> {
        let status = filter.status.map(|s| s.as_str());
        let kind = filter.kind.map(|k| k.as_str());

        let rows = sqlx::query(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents \
             WHERE (? IS NULL OR status = ?) AND (? IS NULL OR kind = ?) \
             ORDER BY COALESCE(published_at, created_at) DESC LIMIT ? OFFSET ?"
        ))
        .bind(status)
        .bind(status)
        .bind(kind)
        .bind(kind)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(document_from_row)
            .collect::<std::result::Result<_, _>>()
            .map_err(db_err)
    }

    async fn delete_document(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserRepo for SqliteRepo {
    async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, email, display_name, bio, role, password_hash, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(user.id))
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.bio)
        .bind(user.role.as_str())
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(user_from_row).transpose().map_err(db_err)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ? COLLATE NOCASE")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(user_from_row).transpose().map_err(db_err)
    }

    async fn update_profile(&self, id: Uuid, display_name: &str, bio: Option<String>) -> Result<()> {
        let result = sqlx::query("UPDATE users SET display_name = ?, bio = ? WHERE id = ?")
            .bind(display_name)
            .bind(bio)
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User".into(), id.to_string()));
        }
        Ok(())
    }

    async fn insert_session(&self, session: &Session) -> Result<()> {
        sqlx::query("INSERT INTO sessions (token_hash, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)")
            .bind(&session.token_hash)
            .bind(uuid_to_blob(session.user_id))
            .bind(session.created_at)
            .bind(session.expires_at)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn find_session(&self, token_hash: &str) -> Result<Option<Session>> {
        let row = sqlx::query("SELECT * FROM sessions WHERE token_hash = ?")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(session_from_row).transpose().map_err(db_err)
    }

    async fn delete_session(&self, token_hash: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

#[async_trait]
impl SubmissionRepo for SqliteRepo {
    async fn insert_submission(&self, submission: &Submission) -> Result<()> {
        sqlx::query("INSERT INTO submissions (id, name, email, message, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(uuid_to_blob(submission.id))
            .bind(&submission.name)
            .bind(&submission.email)
            .bind(&submission.message)
            .bind(submission.created_at)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn list_submissions(&self, limit: i64, offset: i64) -> Result<Vec<Submission>> {
        let rows = sqlx::query("SELECT * FROM submissions ORDER BY created_at DESC LIMIT ? OFFSET ?")
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                Ok(Submission {
                    id: blob_to_uuid(&row.try_get::<Vec<u8>, _>("id")?)?,
                    name: row.try_get("name")?,
                    email: row.try_get("email")?,
                    message: row.try_get("message")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect::<std::result::Result<_, sqlx::Error>>()
            .map_err(db_err)
    }
}
