//! Bearer-token session lookup for handlers.

use std::future::Future;
use std::pin::Pin;

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use tt_core::error::{AppError, Result};
use tt_core::models::SessionUser;

use crate::error::ApiError;
use crate::handlers::AppState;

/// Extracts the token from `Authorization: Bearer <token>`.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub async fn require_session(req: &HttpRequest, state: &AppState) -> Result<SessionUser> {
    let token = bearer_token(req).ok_or_else(|| AppError::Unauthorized("sign in required".into()))?;
    state.sessions().authenticate(token).await
}

/// Public routes treat a missing or stale token as an anonymous reader.
pub async fn optional_session(req: &HttpRequest, state: &AppState) -> Result<Option<SessionUser>> {
    let Some(token) = bearer_token(req) else {
        return Ok(None);
    };
    match state.sessions().authenticate(token).await {
        Ok(user) => Ok(Some(user)),
        Err(AppError::Unauthorized(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// The signed-in caller. Rejects the request with 401 before the handler runs.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub SessionUser);

impl FromRequest for Caller {
    type Error = ApiError;
    type Future = Pin<Box<dyn Future<Output = std::result::Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let state = req
                .app_data::<web::Data<AppState>>()
                .ok_or_else(|| AppError::Internal("application state is not registered".into()))?;
            Ok(Caller(require_session(&req, state).await?))
        })
    }
}
