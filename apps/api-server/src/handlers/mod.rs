//! HTTP handlers and route configuration.

mod categories;
mod chat;
mod comments;
mod diagnostics;
mod health;
mod posts;

#[cfg(test)]
mod tests;

use actix_web::{HttpMessage, HttpRequest, error, web};

use globe_core::domain::id::is_document_id;
use globe_core::error::{DomainError, RepoError};

use crate::middleware::error::{AppError, AppResult};
use crate::middleware::functions::RoutePrefix;

const CATEGORY: &str = "Category";
const POST: &str = "Blog post";
const COMMENT: &str = "Comment";

/// Configure all application routes.
///
/// Paths carry no prefix here; under the Functions host the prefix is
/// stripped by middleware before routing.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        // Diagnostics
        .route("/health", web::get().to(health::health_check))
        .route("/db-status", web::get().to(diagnostics::db_status))
        .route("/db-check", web::get().to(diagnostics::db_check))
        // Chat
        .route("/chat", web::post().to(chat::chat))
        // Blog
        .service(
            web::scope("/categories")
                .route("", web::get().to(categories::list))
                .route("", web::post().to(categories::create))
                .route("/{id}", web::get().to(categories::get))
                .route("/{id}", web::put().to(categories::update))
                .route("/{id}", web::delete().to(categories::delete)),
        )
        .service(
            web::scope("/posts")
                .route("", web::get().to(posts::list))
                .route("", web::post().to(posts::create))
                .route("/{id}", web::get().to(posts::get))
                .route("/{id}", web::put().to(posts::update))
                .route("/{id}", web::delete().to(posts::delete))
                .route("/{id}/comments", web::get().to(comments::list))
                .route("/{id}/comments", web::post().to(comments::create))
                .route("/{id}/comments/{comment_id}", web::get().to(comments::get))
                .route("/{id}/comments/{comment_id}", web::put().to(comments::update))
                .route("/{id}/comments/{comment_id}", web::delete().to(comments::delete)),
        );
}

/// Malformed bodies are validation failures (422), like malformed ids.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let detail = match &err {
            error::JsonPayloadError::Deserialize(e) => e.to_string(),
            other => other.to_string(),
        };
        AppError::Validation(vec![detail]).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| AppError::Validation(vec![err.to_string()]).into())
}

/// Reject a path id that is not a 24-character hex document id.
fn document_id(raw: &str) -> AppResult<&str> {
    if is_document_id(raw) {
        Ok(raw)
    } else {
        Err(AppError::Validation(vec![format!(
            "'{raw}' is not a valid id; expected 24 hex characters"
        )]))
    }
}

/// Map a repository miss to the entity's typed not-found error.
fn missing_as(entity: &'static str, id: &str) -> impl FnOnce(RepoError) -> AppError {
    move |err| match err {
        RepoError::NotFound => DomainError::not_found(entity, id).into(),
        other => other.into(),
    }
}

/// Absolute URL of a resource, including any stripped route prefix.
fn location(req: &HttpRequest, path: &str) -> String {
    let info = req.connection_info();
    let prefix = req
        .extensions()
        .get::<RoutePrefix>()
        .map(|p| p.0.clone())
        .unwrap_or_default();
    format!("{}://{}{prefix}/{path}", info.scheme(), info.host())
}
