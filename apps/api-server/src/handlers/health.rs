//! Health check endpoint.

use actix_web::HttpResponse;
use globe_shared::dto::HealthResponse;

/// Health check endpoint - no storage dependency.
///
/// GET /health
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        message: "API is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}
