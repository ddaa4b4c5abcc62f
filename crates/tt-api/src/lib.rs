//! # tt-api
//!
//! The web routing and orchestration layer for Trace of the Tides.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod session;

use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::{web, HttpRequest};
use tt_core::error::AppError;

use crate::error::ApiError;

pub use handlers::{ApiOptions, AppState};

/// Largest accepted request body; documents are written whole.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

fn rejected(message: String) -> actix_web::Error {
    ApiError(AppError::ValidationError(message)).into()
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    rejected(format!("invalid request body: {err}"))
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    rejected(format!("invalid query: {err}"))
}

fn path_error(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    rejected(format!("invalid path: {err}"))
}

/// Mounts the public pages and the JSON API under `/api`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().limit(MAX_BODY_BYTES).error_handler(json_error))
        .app_data(web::PayloadConfig::new(MAX_BODY_BYTES))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .app_data(web::PathConfig::default().error_handler(path_error))
        .route("/", web::get().to(handlers::index))
        .route("/read/{slug}", web::get().to(handlers::read_document))
        .route("/healthz", web::get().to(handlers::health))
        .service(
            web::scope("/api")
                .service(
                    web::resource("/session")
                        .route(web::post().to(handlers::login))
                        .route(web::delete().to(handlers::logout)),
                )
                .service(
                    web::resource("/content")
                        .route(web::get().to(handlers::list_documents))
                        .route(web::post().to(handlers::create_document)),
                )
                .service(
                    web::resource("/content/{id}")
                        .route(web::get().to(handlers::get_document))
                        .route(web::put().to(handlers::update_document))
                        .route(web::delete().to(handlers::delete_document)),
                )
                .route("/content/{id}/render", web::get().to(handlers::render_document))
                .service(
                    web::resource("/profile")
                        .route(web::get().to(handlers::get_profile))
                        .route(web::put().to(handlers::update_profile)),
                )
                .service(
                    web::resource("/submissions")
                        .route(web::get().to(handlers::list_submissions))
                        .route(web::post().to(handlers::create_submission)),
                ),
        );
}
