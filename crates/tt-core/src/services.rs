//! # Services
//!
//! Orchestration over the ports: authorization, slug assignment, status
//! transitions, sessions. Handlers stay thin and call into here.

use chrono::{Duration, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::content::{ContentBody, HeroMedia};
use crate::error::{AppError, Result};
use crate::models::{
    ContentDocument, ContentKind, ContentStatus, DocumentFilter, Role, Session, SessionUser, User,
};
use crate::slug::{slug_candidate, slugify};
use crate::traits::{AuthProvider, ContentRepo, UserRepo};

/// A validated create/update request.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentDraft {
    pub kind: ContentKind,
    pub title: String,
    pub hero: HeroMedia,
    pub body: ContentBody,
    pub status: ContentStatus,
}

impl DocumentDraft {
    /// Validates raw client fields against the document kind.
    pub fn parse(
        kind: ContentKind,
        title: &str,
        hero: Option<Value>,
        blocks: Option<Value>,
        status: Option<ContentStatus>,
    ) -> Result<Self> {
        Ok(Self {
            kind,
            title: title.trim().to_string(),
            hero: HeroMedia::from_value(kind, hero)?,
            body: ContentBody::from_value(kind, blocks.unwrap_or(Value::Null))?,
            status: status.unwrap_or_default(),
        })
    }
}

/// Moves `doc` to `requested`, stamping timestamps on publication.
/// Only admins may publish; anyone who can manage the document may unpublish.
fn transition(doc: &mut ContentDocument, actor: &SessionUser, requested: ContentStatus) -> Result<()> {
    if requested == ContentStatus::Published && doc.status != ContentStatus::Published {
        if !actor.is_admin() {
            return Err(AppError::Forbidden("only admins may publish".into()));
        }
        let now = Utc::now();
        doc.published_at = Some(now);
        doc.reviewed_at = Some(now);
    }
    doc.status = requested;
    Ok(())
}

pub struct ContentService<'a> {
    repo: &'a dyn ContentRepo,
    slug_max_attempts: u32,
}

impl<'a> ContentService<'a> {
    pub fn new(repo: &'a dyn ContentRepo, slug_max_attempts: u32) -> Self {
        Self { repo, slug_max_attempts: slug_max_attempts.max(1) }
    }

    pub async fn create(&self, actor: &SessionUser, draft: DocumentDraft) -> Result<ContentDocument> {
        let now = Utc::now();
        let mut doc = ContentDocument {
            id: Uuid::now_v7(),
            slug: String::new(),
            kind: draft.kind,
            hero_image: draft.hero.to_stored(),
            content: draft.body.to_json(),
            status: ContentStatus::Draft,
            author_id: actor.user_id,
            created_at: now,
            updated_at: now,
            published_at: None,
            reviewed_at: None,
            title: draft.title,
        };
        transition(&mut doc, actor, draft.status)?;

        let base = slugify(&doc.title);
        self.write_with_unique_slug(&mut doc, &base, true).await?;
        log::info!("created {} document {} as '{}'", doc.kind, doc.id, doc.slug);
        Ok(doc)
    }

    /// Full overwrite. The document type cannot change; the slug is
    /// re-derived only when the title changed.
    pub async fn update(&self, actor: &SessionUser, id: Uuid, draft: DocumentDraft) -> Result<ContentDocument> {
        let mut doc = self.require(id).await?;
        if !actor.can_manage(&doc) {
            return Err(AppError::Forbidden("not the owner of this document".into()));
        }
        if draft.kind != doc.kind {
            return Err(AppError::ValidationError(format!(
                "document type is {} and cannot become {}",
                doc.kind, draft.kind
            )));
        }
        transition(&mut doc, actor, draft.status)?;

        let retitled = draft.title != doc.title;
        doc.title = draft.title;
        doc.hero_image = draft.hero.to_stored();
        doc.content = draft.body.to_json();
        doc.updated_at = Utc::now();

        if retitled {
            let base = slugify(&doc.title);
            self.write_with_unique_slug(&mut doc, &base, false).await?;
        } else {
            self.repo.update_document(&doc).await?;
        }
        Ok(doc)
    }

    pub async fn delete(&self, actor: &SessionUser, id: Uuid) -> Result<()> {
        let doc = self.require(id).await?;
        if !actor.can_manage(&doc) {
            return Err(AppError::Forbidden("not the owner of this document".into()));
        }
        if !self.repo.delete_document(id).await? {
            return Err(AppError::NotFound("Document".into(), id.to_string()));
        }
        log::info!("deleted document {id}");
        Ok(())
    }

    /// Published documents are public; drafts only reach their owner or an admin.
    pub async fn get_for(&self, actor: Option<&SessionUser>, id: Uuid) -> Result<ContentDocument> {
        let doc = self.require(id).await?;
        let visible = doc.is_published() || actor.is_some_and(|a| a.can_manage(&doc));
        if !visible {
            return Err(AppError::NotFound("Document".into(), id.to_string()));
        }
        Ok(doc)
    }

    pub async fn get_published_by_slug(&self, slug: &str) -> Result<ContentDocument> {
        match self.repo.get_document_by_slug(slug).await? {
            Some(doc) if doc.is_published() => Ok(doc),
            _ => Err(AppError::NotFound("Document".into(), slug.to_string())),
        }
    }

    pub async fn list_published(&self, kind: Option<ContentKind>, limit: i64, offset: i64) -> Result<Vec<ContentDocument>> {
        let filter = DocumentFilter {
            status: Some(ContentStatus::Published),
            kind,
            limit: limit.clamp(1, 100),
            offset: offset.max(0),
        };
        self.repo.list_documents(&filter).await
    }

    async fn require(&self, id: Uuid) -> Result<ContentDocument> {
        self.repo
            .get_document(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Document".into(), id.to_string()))
    }

    /// Writes `doc`, retrying with `base-1`, `base-2`, ... while the store
    /// reports a slug conflict.
    async fn write_with_unique_slug(&self, doc: &mut ContentDocument, base: &str, insert: bool) -> Result<()> {
        for attempt in 0..self.slug_max_attempts {
            doc.slug = slug_candidate(base, attempt);
            let written = if insert {
                self.repo.insert_document(doc).await
            } else {
                self.repo.update_document(doc).await
            };
            match written {
                Ok(()) => return Ok(()),
                Err(AppError::Conflict(_)) => {
                    log::debug!("slug '{}' taken, retrying", doc.slug);
                }
                Err(e) => return Err(e),
            }
        }
        Err(AppError::Conflict(format!(
            "no free slug for '{base}' after {} attempts",
            self.slug_max_attempts
        )))
    }
}

pub struct SessionService<'a> {
    users: &'a dyn UserRepo,
    auth: &'a dyn AuthProvider,
    ttl: Duration,
}

impl<'a> SessionService<'a> {
    pub fn new(users: &'a dyn UserRepo, auth: &'a dyn AuthProvider, ttl: Duration) -> Self {
        Self { users, auth, ttl }
    }

    /// Verifies credentials and opens a session. Returns the bearer token.
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, Session)> {
        let invalid = || AppError::Unauthorized("invalid credentials".into());
        let user = self.users.find_user_by_email(email.trim()).await?.ok_or_else(invalid)?;
        if !self.auth.verify_password(password, &user.password_hash).await {
            return Err(invalid());
        }

        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Internal(format!("session ttl {} is out of range", self.ttl)))?;
        let token = self.auth.generate_session_token()?;
        let session = Session {
            token_hash: self.auth.digest_token(&token),
            user_id: user.id,
            created_at: now,
            expires_at,
        };
        self.users.insert_session(&session).await?;
        log::info!("user {} signed in", user.id);
        Ok((token, session))
    }

    /// Resolves a bearer token to its caller. Expired sessions are removed.
    pub async fn authenticate(&self, token: &str) -> Result<SessionUser> {
        let digest = self.auth.digest_token(token);
        let session = self
            .users
            .find_session(&digest)
            .await?
            .ok_or_else(|| AppError::Unauthorized("unknown session".into()))?;

        if session.expires_at <= Utc::now() {
            self.users.delete_session(&digest).await?;
            return Err(AppError::Unauthorized("session expired".into()));
        }

        let user = self
            .users
            .get_user(session.user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("account no longer exists".into()))?;
        Ok(SessionUser { user_id: user.id, role: user.role })
    }

    pub async fn logout(&self, token: &str) -> Result<()> {
        self.users.delete_session(&self.auth.digest_token(token)).await
    }

    /// Creates the bootstrap admin account unless the email is already taken.
    /// Returns whether an account was created.
    pub async fn ensure_admin(&self, email: &str, password: &str) -> Result<bool> {
        if self.users.find_user_by_email(email).await?.is_some() {
            return Ok(false);
        }
        let user = User {
            id: Uuid::now_v7(),
            email: email.to_string(),
            display_name: "Administrator".to_string(),
            bio: None,
            role: Role::Admin,
            password_hash: self.auth.hash_password(password)?,
            created_at: Utc::now(),
        };
        self.users.insert_user(&user).await?;
        Ok(true)
    }

    pub async fn profile(&self, actor: &SessionUser) -> Result<User> {
        self.users
            .get_user(actor.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User".into(), actor.user_id.to_string()))
    }

    pub async fn update_profile(&self, actor: &SessionUser, display_name: &str, bio: Option<String>) -> Result<User> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(AppError::ValidationError("display name is required".into()));
        }
        let bio = bio.map(|b| b.trim().to_string()).filter(|b| !b.is_empty());
        self.users.update_profile(actor.user_id, display_name, bio).await?;
        self.profile(actor).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{MockAuthProvider, MockContentRepo, MockUserRepo};
    use mockall::predicate::eq;
    use mockall::Sequence;
    use serde_json::json;

    fn editor() -> SessionUser {
        SessionUser { user_id: Uuid::now_v7(), role: Role::Editor }
    }

    fn admin() -> SessionUser {
        SessionUser { user_id: Uuid::now_v7(), role: Role::Admin }
    }

    fn draft(title: &str, status: ContentStatus) -> DocumentDraft {
        DocumentDraft::parse(
            ContentKind::Standard,
            title,
            Some(json!("hero.jpg")),
            Some(json!([{ "id": "t", "type": "text", "content": { "text": "Hello" }, "order": 0 }])),
            Some(status),
        )
        .unwrap()
    }

    fn stored(author: Uuid, status: ContentStatus) -> ContentDocument {
        let now = Utc::now();
        ContentDocument {
            id: Uuid::now_v7(),
            title: "Jaffa".into(),
            slug: "jaffa".into(),
            kind: ContentKind::Standard,
            hero_image: None,
            content: String::new(),
            status,
            author_id: author,
            created_at: now,
            updated_at: now,
            published_at: None,
            reviewed_at: None,
        }
    }

    #[tokio::test]
    async fn create_retries_slug_on_conflict() {
        let mut repo = MockContentRepo::new();
        let mut seq = Sequence::new();
        for taken in ["jaffa", "jaffa-1"] {
            repo.expect_insert_document()
                .withf(move |doc| doc.slug == taken)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Err(AppError::Conflict("slug".into())));
        }
        repo.expect_insert_document()
            .withf(|doc| doc.slug == "jaffa-2")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let service = ContentService::new(&repo, 10);
        let doc = service.create(&editor(), draft("Jaffa", ContentStatus::Draft)).await.unwrap();

        assert_eq!(doc.slug, "jaffa-2");
        assert_eq!(doc.hero_image.as_deref(), Some("hero.jpg"));
        assert!(doc.content.contains("Hello"));
    }

    #[tokio::test]
    async fn create_gives_up_after_max_attempts() {
        let mut repo = MockContentRepo::new();
        repo.expect_insert_document()
            .times(3)
            .returning(|_| Err(AppError::Conflict("slug".into())));

        let service = ContentService::new(&repo, 3);
        let err = service.create(&editor(), draft("Jaffa", ContentStatus::Draft)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn only_admins_publish() {
        let repo = MockContentRepo::new();
        let service = ContentService::new(&repo, 3);
        let err = service
            .create(&editor(), draft("Haifa", ContentStatus::Published))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let mut repo = MockContentRepo::new();
        repo.expect_insert_document().times(1).returning(|_| Ok(()));
        let service = ContentService::new(&repo, 3);
        let doc = service.create(&admin(), draft("Haifa", ContentStatus::Published)).await.unwrap();
        assert!(doc.is_published());
        assert!(doc.published_at.is_some());
        assert!(doc.reviewed_at.is_some());
    }

    #[tokio::test]
    async fn update_by_stranger_is_forbidden() {
        let doc = stored(Uuid::now_v7(), ContentStatus::Draft);
        let id = doc.id;
        let mut repo = MockContentRepo::new();
        repo.expect_get_document()
            .with(eq(id))
            .returning(move |_| Ok(Some(doc.clone())));

        let service = ContentService::new(&repo, 3);
        let err = service
            .update(&editor(), id, draft("Jaffa", ContentStatus::Draft))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn update_keeps_slug_when_title_unchanged() {
        let owner = editor();
        let doc = stored(owner.user_id, ContentStatus::Draft);
        let id = doc.id;
        let mut repo = MockContentRepo::new();
        repo.expect_get_document().returning(move |_| Ok(Some(doc.clone())));
        repo.expect_update_document()
            .withf(|doc| doc.slug == "jaffa")
            .times(1)
            .returning(|_| Ok(()));

        let service = ContentService::new(&repo, 3);
        let updated = service.update(&owner, id, draft("Jaffa", ContentStatus::Draft)).await.unwrap();
        assert_eq!(updated.slug, "jaffa");
    }

    #[tokio::test]
    async fn update_rederives_slug_on_retitle() {
        let owner = editor();
        let doc = stored(owner.user_id, ContentStatus::Draft);
        let id = doc.id;
        let mut repo = MockContentRepo::new();
        repo.expect_get_document().returning(move |_| Ok(Some(doc.clone())));
        repo.expect_update_document()
            .withf(|doc| doc.slug == "the-orange-groves")
            .times(1)
            .returning(|_| Ok(()));

        let service = ContentService::new(&repo, 3);
        let updated = service
            .update(&owner, id, draft("The Orange Groves", ContentStatus::Draft))
            .await
            .unwrap();
        assert_eq!(updated.slug, "the-orange-groves");
    }

    #[tokio::test]
    async fn update_cannot_change_type() {
        let owner = editor();
        let doc = stored(owner.user_id, ContentStatus::Draft);
        let id = doc.id;
        let mut repo = MockContentRepo::new();
        repo.expect_get_document().returning(move |_| Ok(Some(doc.clone())));

        let service = ContentService::new(&repo, 3);
        let thread = DocumentDraft::parse(ContentKind::Thread, "Jaffa", None, None, None).unwrap();
        let err = service.update(&owner, id, thread).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn republishing_restamps_publication() {
        use std::sync::{Arc, Mutex};

        let owner = editor();
        let approver = admin();
        let doc = stored(owner.user_id, ContentStatus::Draft);
        let id = doc.id;
        let row = Arc::new(Mutex::new(doc));

        let mut repo = MockContentRepo::new();
        let read = Arc::clone(&row);
        repo.expect_get_document()
            .returning(move |_| Ok(Some(read.lock().unwrap().clone())));
        let write = Arc::clone(&row);
        repo.expect_update_document().times(3).returning(move |doc| {
            *write.lock().unwrap() = doc.clone();
            Ok(())
        });
        let service = ContentService::new(&repo, 3);

        let first = service.update(&approver, id, draft("Jaffa", ContentStatus::Published)).await.unwrap();
        let first_published = first.published_at.unwrap();
        assert_eq!(first.reviewed_at, Some(first_published));

        let unpublished = service.update(&owner, id, draft("Jaffa", ContentStatus::Draft)).await.unwrap();
        assert_eq!(unpublished.status, ContentStatus::Draft);

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let again = service.update(&approver, id, draft("Jaffa", ContentStatus::Published)).await.unwrap();
        assert!(again.is_published());
        assert!(again.published_at.unwrap() > first_published);
        assert_eq!(again.reviewed_at, again.published_at);
    }

    #[tokio::test]
    async fn drafts_are_hidden_from_the_public() {
        let owner = editor();
        let doc = stored(owner.user_id, ContentStatus::Draft);
        let id = doc.id;
        let mut repo = MockContentRepo::new();
        repo.expect_get_document().returning(move |_| Ok(Some(doc.clone())));

        let service = ContentService::new(&repo, 3);
        assert!(matches!(service.get_for(None, id).await, Err(AppError::NotFound(..))));
        assert!(service.get_for(Some(&owner), id).await.is_ok());
        assert!(service.get_for(Some(&admin()), id).await.is_ok());
    }

    #[tokio::test]
    async fn draft_rejects_mismatched_payload() {
        let err = DocumentDraft::parse(
            ContentKind::Standard,
            "x",
            None,
            Some(json!([{ "id": "a", "type": "image", "content": { "text": "no url" }, "order": 0 }])),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn expired_sessions_are_rejected_and_removed() {
        let mut auth = MockAuthProvider::new();
        auth.expect_digest_token().returning(|t| format!("digest-{t}"));

        let mut users = MockUserRepo::new();
        users.expect_find_session().withf(|hash| hash == "digest-tok").returning(|hash| {
            Ok(Some(Session {
                token_hash: hash.to_string(),
                user_id: Uuid::now_v7(),
                created_at: Utc::now() - Duration::hours(5),
                expires_at: Utc::now() - Duration::hours(1),
            }))
        });
        users.expect_delete_session().withf(|hash| hash == "digest-tok").times(1).returning(|_| Ok(()));

        let sessions = SessionService::new(&users, &auth, Duration::hours(1));
        let err = sessions.authenticate("tok").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn login_with_unrepresentable_ttl_fails_cleanly() {
        let mut auth = MockAuthProvider::new();
        auth.expect_verify_password().returning(|_, _| true);
        auth.expect_generate_session_token().returning(|| Ok("tok".into()));
        auth.expect_digest_token().returning(|t| format!("digest-{t}"));

        let mut users = MockUserRepo::new();
        users.expect_find_user_by_email().returning(|email| {
            Ok(Some(User {
                id: Uuid::now_v7(),
                email: email.to_string(),
                display_name: "Editor".into(),
                bio: None,
                role: Role::Editor,
                password_hash: "$argon2id$stub".into(),
                created_at: Utc::now(),
            }))
        });
        users.expect_insert_session().never();

        let sessions = SessionService::new(&users, &auth, Duration::hours(10_000_000_000));
        let err = sessions.login("e@tides.org", "right").await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn login_rejects_bad_password() {
        let mut auth = MockAuthProvider::new();
        auth.expect_verify_password().returning(|_, _| false);

        let mut users = MockUserRepo::new();
        users.expect_find_user_by_email().returning(|email| {
            Ok(Some(User {
                id: Uuid::now_v7(),
                email: email.to_string(),
                display_name: "Editor".into(),
                bio: None,
                role: Role::Editor,
                password_hash: "$argon2id$stub".into(),
                created_at: Utc::now(),
            }))
        });

        let sessions = SessionService::new(&users, &auth, Duration::hours(1));
        let err = sessions.login("e@tides.org", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
