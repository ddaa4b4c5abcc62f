//! # Trace of the Tides
//!
//! The entry point that assembles the archive from compile-time plugins and
//! runtime settings.

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use secrecy::ExposeSecret;
use tt_api::middleware::{cors_policy, security_headers, standard_middleware};
use tt_api::{configure_routes, ApiOptions, AppState};
use tt_config::Settings;

#[cfg(feature = "db-sqlite")]
use tt_db_sqlite::SqliteRepo;

#[cfg(feature = "auth-simple")]
use tt_auth_simple::SimpleAuthProvider;

#[cfg(not(all(feature = "db-sqlite", feature = "auth-simple")))]
compile_error!("a storage plugin (db-sqlite) and an auth plugin (auth-simple) are required");

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::load().context("loading settings")?;

    #[cfg(feature = "db-sqlite")]
    let repo = SqliteRepo::new(&settings.database.url)
        .await
        .with_context(|| format!("opening database {}", settings.database.url))?;

    #[cfg(feature = "auth-simple")]
    let auth = SimpleAuthProvider::new();

    let state = AppState {
        content: Box::new(repo.clone()),
        users: Box::new(repo.clone()),
        submissions: Box::new(repo),
        auth: Box::new(auth),
        options: ApiOptions {
            slug_max_attempts: settings.content.slug_max_attempts,
            session_ttl: chrono::Duration::hours(settings.auth.session_ttl_hours),
            page_size: settings.content.page_size,
        },
    };

    match (&settings.auth.admin_email, &settings.auth.admin_password) {
        (Some(email), Some(password)) => {
            if state.sessions().ensure_admin(email, password.expose_secret()).await? {
                log::info!("created admin account {email}");
            }
        }
        (Some(_), None) | (None, Some(_)) => {
            log::warn!("auth.admin_email and auth.admin_password must both be set; skipping admin bootstrap");
        }
        (None, None) => {}
    }

    let state = web::Data::new(state);
    let (host, port) = settings.bind_address();
    log::info!("Trace of the Tides listening on http://{host}:{port}");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors_policy())
            .wrap(security_headers())
            .wrap(standard_middleware())
            .configure(configure_routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;
    Ok(())
}
