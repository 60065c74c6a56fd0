//! Comment routes, nested under their post.

use actix_web::{HttpRequest, HttpResponse, http::header, web};
use chrono::Utc;

use globe_core::domain::{Comment, CommentFilter, CommentPatch, NewComment, Page};
use globe_core::error::DomainError;
use globe_shared::dto::CommentListQuery;

use super::{COMMENT, document_id, location, missing_as};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /posts/{id}/comments?approved=&skip=&top=
pub async fn list(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<CommentListQuery>,
) -> AppResult<HttpResponse> {
    let post_id = document_id(&path)?;
    let filter = CommentFilter {
        approved: query.approved,
    };
    let comments = state
        .comments
        .list_for_post(post_id, &filter, Page::new(query.skip, query.top))
        .await?;
    Ok(HttpResponse::Ok().json(comments))
}

/// POST /posts/{id}/comments
pub async fn create(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<NewComment>,
) -> AppResult<HttpResponse> {
    let post_id = document_id(&path)?;
    let comment = Comment::create(post_id, body.into_inner(), Utc::now());
    let comment = state.comments.insert(comment).await?;
    tracing::info!(post_id = %post_id, comment_id = %comment.id, "Comment created");

    Ok(HttpResponse::Created()
        .insert_header((
            header::LOCATION,
            location(&req, &format!("posts/{post_id}/comments/{}", comment.id)),
        ))
        .json(comment))
}

/// GET /posts/{id}/comments/{comment_id}
pub async fn get(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let post_id = document_id(&post_id)?;
    let comment_id = document_id(&comment_id)?;

    let comment = state
        .comments
        .find_for_post(post_id, comment_id)
        .await?
        .ok_or_else(|| DomainError::not_found(COMMENT, comment_id))?;
    Ok(HttpResponse::Ok().json(comment))
}

/// PUT /posts/{id}/comments/{comment_id}
pub async fn update(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<CommentPatch>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let post_id = document_id(&post_id)?;
    let comment_id = document_id(&comment_id)?;

    let mut comment = state
        .comments
        .find_for_post(post_id, comment_id)
        .await?
        .ok_or_else(|| DomainError::not_found(COMMENT, comment_id))?;

    comment.apply(body.into_inner(), Utc::now());
    let comment = state
        .comments
        .update(comment)
        .await
        .map_err(missing_as(COMMENT, comment_id))?;
    Ok(HttpResponse::Ok().json(comment))
}

/// DELETE /posts/{id}/comments/{comment_id}
pub async fn delete(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let post_id = document_id(&post_id)?;
    let comment_id = document_id(&comment_id)?;

    // A comment filed under another post is not addressable from here.
    state
        .comments
        .find_for_post(post_id, comment_id)
        .await?
        .ok_or_else(|| DomainError::not_found(COMMENT, comment_id))?;
    state
        .comments
        .delete(comment_id)
        .await
        .map_err(missing_as(COMMENT, comment_id))?;

    tracing::info!(post_id = %post_id, comment_id = %comment_id, "Comment deleted");
    Ok(HttpResponse::NoContent().finish())
}
