//! Request and response bodies of the JSON API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tt_core::content::{ContentBody, HeroMedia};
use tt_core::models::{ContentDocument, ContentKind, ContentStatus, Role, User};
use tt_core::render::{self, RenderNode};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRequest {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub hero_image: Option<Value>,
    /// Blocks, or posts for threads, without the storage envelope
    #[serde(default)]
    pub blocks: Option<Value>,
    #[serde(default)]
    pub status: Option<ContentStatus>,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: Uuid,
    pub slug: String,
}

/// A stored document with its blocks lifted out of the envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub title: String,
    pub slug: String,
    pub hero_image: Value,
    pub status: ContentStatus,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub blocks: Value,
    pub reading_time: usize,
}

impl From<&ContentDocument> for DocumentResponse {
    fn from(doc: &ContentDocument) -> Self {
        let body = ContentBody::decode_or_empty(doc.kind, &doc.content);
        let hero = HeroMedia::decode_or_empty(doc.kind, doc.hero_image.as_deref());
        Self {
            id: doc.id,
            kind: doc.kind,
            title: doc.title.clone(),
            slug: doc.slug.clone(),
            hero_image: hero.to_value(),
            status: doc.status,
            author_id: doc.author_id,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
            published_at: doc.published_at,
            reviewed_at: doc.reviewed_at,
            blocks: body.blocks_value(),
            reading_time: render::reading_time_minutes(&body),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub title: String,
    pub slug: String,
    pub hero_image: Value,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<&ContentDocument> for DocumentSummary {
    fn from(doc: &ContentDocument) -> Self {
        Self {
            id: doc.id,
            kind: doc.kind,
            title: doc.title.clone(),
            slug: doc.slug.clone(),
            hero_image: HeroMedia::decode_or_empty(doc.kind, doc.hero_image.as_deref()).to_value(),
            published_at: doc.published_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "type")]
    pub kind: Option<ContentKind>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResponse {
    pub hero: Option<RenderNode>,
    pub nodes: Vec<RenderNode>,
    pub reading_time: usize,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub role: Role,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            bio: user.bio,
            role: user.role,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub display_name: String,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmissionRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
