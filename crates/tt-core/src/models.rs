//! # Domain Models
//!
//! These structs represent the persisted entities of Trace of the Tides.
//! We use UUID v7 for time-ordered, globally unique identification.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// The format of a content document. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Standard,
    Video,
    Audio,
    Gallery,
    Thread,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Gallery => "gallery",
            Self::Thread => "thread",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "video" => Ok(Self::Video),
            "audio" => Ok(Self::Audio),
            "gallery" => Ok(Self::Gallery),
            "thread" => Ok(Self::Thread),
            other => Err(AppError::ValidationError(format!("unknown content type '{other}'"))),
        }
    }
}

/// Governs visibility on public routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    #[default]
    Draft,
    Published,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }
}

impl FromStr for ContentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            other => Err(AppError::ValidationError(format!("unknown status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Editor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Editor => "editor",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "editor" => Ok(Self::Editor),
            "admin" => Ok(Self::Admin),
            other => Err(AppError::ValidationError(format!("unknown role '{other}'"))),
        }
    }
}

/// A published or draft piece of content.
///
/// `content` and `hero_image` hold the stored text verbatim; decoding goes
/// through [`crate::content::ContentBody`] and [`crate::content::HeroMedia`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentDocument {
    pub id: Uuid,
    pub title: String,
    /// Globally unique URL slug derived from the title
    pub slug: String,
    pub kind: ContentKind,
    pub hero_image: Option<String>,
    /// JSON envelope `{"blocks": [...]}`
    pub content: String,
    pub status: ContentStatus,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl ContentDocument {
    pub fn is_published(&self) -> bool {
        self.status == ContentStatus::Published
    }
}

/// Listing filter for documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFilter {
    pub status: Option<ContentStatus>,
    pub kind: Option<ContentKind>,
    pub limit: i64,
    pub offset: i64,
}

/// Editorial staff account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub role: Role,
    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Server-side session record. Only the digest of the bearer token is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token_hash: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// The caller identity resolved from a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl SessionUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Owners and admins may edit or delete a document.
    pub fn can_manage(&self, doc: &ContentDocument) -> bool {
        self.is_admin() || doc.author_id == self.user_id
    }
}

/// A reader-submitted story or tip awaiting editorial review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Submission {
    /// Builds a submission from reader input, trimming and validating fields.
    pub fn new(name: &str, email: Option<&str>, message: &str) -> Result<Self, AppError> {
        let name = name.trim();
        let message = message.trim();
        if name.is_empty() {
            return Err(AppError::ValidationError("name is required".into()));
        }
        if message.is_empty() {
            return Err(AppError::ValidationError("message is required".into()));
        }
        let email = match email.map(str::trim).filter(|e| !e.is_empty()) {
            Some(e) if !e.contains('@') => {
                return Err(AppError::ValidationError(format!("invalid email '{e}'")));
            }
            other => other.map(str::to_string),
        };

        Ok(Self {
            id: Uuid::now_v7(),
            name: name.to_string(),
            email,
            message: message.to_string(),
            created_at: Utc::now(),
        })
    }
}
