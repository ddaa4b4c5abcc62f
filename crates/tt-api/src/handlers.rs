//! # tt-api Handlers
//!
//! Each handler resolves the caller, delegates to a core service and shapes
//! the response. Authorization and slug rules live in `tt_core::services`.

use actix_web::http::header::ContentType;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::de::DeserializeOwned;
use serde_json::json;
use tt_core::content::{ContentBody, HeroMedia};
use tt_core::error::AppError;
use tt_core::models::Submission;
use tt_core::render::{self, PageContext};
use tt_core::services::{ContentService, DocumentDraft, SessionService};
use tt_core::traits::{AuthProvider, ContentRepo, SubmissionRepo, UserRepo};
use uuid::Uuid;

use crate::dto::{
    CreatedResponse, DocumentRequest, DocumentResponse, DocumentSummary, ListQuery, LoginRequest,
    LoginResponse, PageQuery, ProfileResponse, ProfileUpdate, RenderResponse, SubmissionRequest,
};
use crate::error::ApiResult;
use crate::session::{bearer_token, optional_session, Caller};

/// Tunables handed down from the loaded settings.
#[derive(Debug, Clone)]
pub struct ApiOptions {
    pub slug_max_attempts: u32,
    pub session_ttl: chrono::Duration,
    pub page_size: i64,
}

impl Default for ApiOptions {
    fn default() -> Self {
        Self { slug_max_attempts: 50, session_ttl: chrono::Duration::hours(72), page_size: 20 }
    }
}

/// State shared across all Actix-web workers.
pub struct AppState {
    pub content: Box<dyn ContentRepo>,
    pub users: Box<dyn UserRepo>,
    pub submissions: Box<dyn SubmissionRepo>,
    pub auth: Box<dyn AuthProvider>,
    pub options: ApiOptions,
}

impl AppState {
    pub fn documents(&self) -> ContentService<'_> {
        ContentService::new(&*self.content, self.options.slug_max_attempts)
    }

    pub fn sessions(&self) -> SessionService<'_> {
        SessionService::new(&*self.users, &*self.auth, self.options.session_ttl)
    }

    fn page(&self, limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
        (limit.unwrap_or(self.options.page_size).clamp(1, 100), offset.unwrap_or(0).max(0))
    }
}

/// Decodes a JSON body once the caller is known, so a bad session is
/// reported before a bad body.
fn json_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| AppError::ValidationError(format!("invalid request body: {e}")))
}

/// Ids of mutating routes are parsed after authentication for the same reason.
fn document_id(raw: &str) -> Result<Uuid, AppError> {
    raw.parse().map_err(|e| AppError::ValidationError(format!("invalid path: {e}")))
}

fn html(page: askama::Result<String>) -> ApiResult<HttpResponse> {
    let body = page.map_err(|e| AppError::Internal(format!("template: {e}")))?;
    Ok(HttpResponse::Ok().content_type(ContentType::html()).body(body))
}

// --- public pages ---

pub async fn index(data: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let docs = data.documents().list_published(None, data.options.page_size, 0).await?;
    html(tt_ui::render_index_page("From the archive", &docs))
}

pub async fn read_document(data: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let doc = data.documents().get_published_by_slug(&path.into_inner()).await?;
    html(tt_ui::render_document_page(&doc))
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

// --- sessions ---

pub async fn login(data: web::Data<AppState>, body: web::Json<LoginRequest>) -> ApiResult<HttpResponse> {
    let (token, session) = data.sessions().login(&body.email, &body.password).await?;
    Ok(HttpResponse::Ok().json(LoginResponse { token, expires_at: session.expires_at }))
}

pub async fn logout(data: web::Data<AppState>, req: HttpRequest, _caller: Caller) -> ApiResult<HttpResponse> {
    let token = bearer_token(&req).ok_or_else(|| AppError::Unauthorized("sign in required".into()))?;
    data.sessions().logout(token).await?;
    Ok(HttpResponse::NoContent().finish())
}

// --- content ---

pub async fn list_documents(data: web::Data<AppState>, query: web::Query<ListQuery>) -> ApiResult<HttpResponse> {
    let (limit, offset) = data.page(query.limit, query.offset);
    let docs = data.documents().list_published(query.kind, limit, offset).await?;
    let summaries: Vec<DocumentSummary> = docs.iter().map(DocumentSummary::from).collect();
    Ok(HttpResponse::Ok().json(summaries))
}

pub async fn create_document(
    data: web::Data<AppState>,
    Caller(actor): Caller,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let body: DocumentRequest = json_body(&body)?;
    let draft = DocumentDraft::parse(body.kind, &body.title, body.hero_image, body.blocks, body.status)?;

    let doc = data.documents().create(&actor, draft).await?;
    Ok(HttpResponse::Created().json(CreatedResponse { id: doc.id, slug: doc.slug }))
}

pub async fn get_document(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let actor = optional_session(&req, &data).await?;
    let doc = data.documents().get_for(actor.as_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(DocumentResponse::from(&doc)))
}

pub async fn update_document(
    data: web::Data<AppState>,
    Caller(actor): Caller,
    path: web::Path<String>,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let id = document_id(&path)?;
    let body: DocumentRequest = json_body(&body)?;
    let draft = DocumentDraft::parse(body.kind, &body.title, body.hero_image, body.blocks, body.status)?;

    let doc = data.documents().update(&actor, id, draft).await?;
    Ok(HttpResponse::Ok().json(DocumentResponse::from(&doc)))
}

pub async fn delete_document(
    data: web::Data<AppState>,
    Caller(actor): Caller,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    data.documents().delete(&actor, document_id(&path)?).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn render_document(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let actor = optional_session(&req, &data).await?;
    let doc = data.documents().get_for(actor.as_ref(), path.into_inner()).await?;

    let body = ContentBody::decode_or_empty(doc.kind, &doc.content);
    let hero = HeroMedia::decode_or_empty(doc.kind, doc.hero_image.as_deref());
    Ok(HttpResponse::Ok().json(RenderResponse {
        hero: render::render_hero(doc.kind, &hero),
        nodes: render::render(&body, &PageContext::for_kind(doc.kind)),
        reading_time: render::reading_time_minutes(&body),
    }))
}

// --- profile ---

pub async fn get_profile(data: web::Data<AppState>, Caller(actor): Caller) -> ApiResult<HttpResponse> {
    let user = data.sessions().profile(&actor).await?;
    Ok(HttpResponse::Ok().json(ProfileResponse::from(user)))
}

pub async fn update_profile(
    data: web::Data<AppState>,
    Caller(actor): Caller,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let body: ProfileUpdate = json_body(&body)?;
    let user = data.sessions().update_profile(&actor, &body.display_name, body.bio).await?;
    Ok(HttpResponse::Ok().json(ProfileResponse::from(user)))
}

// --- submissions ---

pub async fn create_submission(
    data: web::Data<AppState>,
    body: web::Json<SubmissionRequest>,
) -> ApiResult<HttpResponse> {
    let submission = Submission::new(&body.name, body.email.as_deref(), &body.message)?;
    data.submissions.insert_submission(&submission).await?;
    log::info!("received submission {}", submission.id);
    Ok(HttpResponse::Created().json(json!({ "id": submission.id })))
}

pub async fn list_submissions(
    data: web::Data<AppState>,
    Caller(actor): Caller,
    query: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    if !actor.is_admin() {
        return Err(AppError::Forbidden("only admins may read submissions".into()).into());
    }
    let (limit, offset) = data.page(query.limit, query.offset);
    let submissions = data.submissions.list_submissions(limit, offset).await?;
    Ok(HttpResponse::Ok().json(submissions))
}
