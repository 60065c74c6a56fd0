//! Storage diagnostics. Both endpoints answer 200 and report failures in
//! the body.

use actix_web::{HttpResponse, web};

use globe_core::error::RepoError;
use globe_core::ports::InitState;
use globe_shared::dto::{DbCheckResponse, DbStatusResponse, InitializationStatus};

use crate::state::AppState;

fn initialization(state: InitState) -> InitializationStatus {
    let (state, error) = match state {
        InitState::Uninitialized => ("uninitialized", None),
        InitState::Initializing => ("initializing", None),
        InitState::Ready => ("ready", None),
        InitState::Failed(error) => ("failed", Some(error)),
    };
    InitializationStatus {
        state: state.to_string(),
        error,
    }
}

fn error_type(err: &RepoError) -> &'static str {
    match err {
        RepoError::Connection(_) => "Connection",
        RepoError::Query(_) => "Query",
        RepoError::NotFound => "NotFound",
    }
}

/// Live connectivity probe plus the initializer state.
///
/// GET /db-status
pub async fn db_status(state: web::Data<AppState>) -> HttpResponse {
    let init = initialization(state.storage.state());

    let body = match state.storage.probe().await {
        Ok(probe) => DbStatusResponse::Connected {
            backend: probe.backend.to_string(),
            ping: true,
            databases: probe.databases,
            collections: probe.collections,
            initialization: init,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Storage probe failed");
            DbStatusResponse::Error {
                error: e.to_string(),
                error_type: error_type(&e).to_string(),
                initialization: init,
            }
        }
    };

    HttpResponse::Ok().json(body)
}

/// Bring storage up and count posts.
///
/// GET /db-check
pub async fn db_check(state: web::Data<AppState>) -> HttpResponse {
    let counted = async {
        state.storage.ensure_ready().await?;
        state.posts.count().await
    }
    .await;

    let body = match counted {
        Ok(blog_posts_count) => DbCheckResponse::Success { blog_posts_count },
        Err(e) => {
            tracing::warn!(error = %e, "Storage check failed");
            DbCheckResponse::Error {
                error: e.to_string(),
            }
        }
    };

    HttpResponse::Ok().json(body)
}
