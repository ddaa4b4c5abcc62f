//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{ContentDocument, DocumentFilter, Session, Submission, User};

/// Data persistence contract for content documents.
///
/// Implementations must enforce slug uniqueness themselves and report a
/// clash as `AppError::Conflict`; the service retries with the next slug.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ContentRepo: Send + Sync {
    async fn insert_document(&self, doc: &ContentDocument) -> Result<()>;
    /// Overwrites every column of an existing row.
    async fn update_document(&self, doc: &ContentDocument) -> Result<()>;
    async fn get_document(&self, id: Uuid) -> Result<Option<ContentDocument>>;
    async fn get_document_by_slug(&self, slug: &str) -> Result<Option<ContentDocument>>;
    /// Newest first.
    async fn list_documents(&self, filter: &DocumentFilter) -> Result<Vec<ContentDocument>>;
    /// Returns false when no row matched.
    async fn delete_document(&self, id: Uuid) -> Result<bool>;
}

/// Accounts, profiles and sessions.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn insert_user(&self, user: &User) -> Result<()>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn update_profile(&self, id: Uuid, display_name: &str, bio: Option<String>) -> Result<()>;

    async fn insert_session(&self, session: &Session) -> Result<()>;
    async fn find_session(&self, token_hash: &str) -> Result<Option<Session>>;
    async fn delete_session(&self, token_hash: &str) -> Result<()>;
}

/// Reader submissions.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SubmissionRepo: Send + Sync {
    async fn insert_submission(&self, submission: &Submission) -> Result<()>;
    /// Newest first.
    async fn list_submissions(&self, limit: i64, offset: i64) -> Result<Vec<Submission>>;
}

/// Credential hashing and session token contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Produces a PHC string for storage.
    fn hash_password(&self, password: &str) -> Result<String>;

    /// Verifies a password against a stored PHC string.
    async fn verify_password(&self, password: &str, hash: &str) -> bool;

    /// A fresh, unguessable bearer token.
    fn generate_session_token(&self) -> Result<String>;

    /// The digest stored server-side in place of the token.
    fn digest_token(&self, token: &str) -> String;
}
