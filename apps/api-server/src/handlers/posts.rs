//! Blog post routes.

use actix_web::{HttpRequest, HttpResponse, http::header, web};
use chrono::Utc;

use globe_core::domain::{NewPost, Page, Post, PostFilter, PostPatch};
use globe_core::error::DomainError;
use globe_shared::dto::PostListQuery;

use super::{POST, document_id, location, missing_as};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /posts?published=&categoryId=&skip=&top=
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<PostListQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let filter = PostFilter {
        published: query.published,
        category_id: query.category_id,
    };
    let posts = state
        .posts
        .list(&filter, Page::new(query.skip, query.top))
        .await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// POST /posts
pub async fn create(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<NewPost>,
) -> AppResult<HttpResponse> {
    let new = body.into_inner();
    new.validate()?;

    let post = state.posts.insert(Post::create(new, Utc::now())).await?;
    tracing::info!(post_id = %post.id, slug = %post.slug, "Blog post created");

    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, location(&req, &format!("posts/{}", post.id))))
        .json(post))
}

/// GET /posts/{id}
pub async fn get(state: web::Data<AppState>, path: web::Path<String>) -> AppResult<HttpResponse> {
    let id = document_id(&path)?;
    let post = state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found(POST, id))?;
    Ok(HttpResponse::Ok().json(post))
}

/// PUT /posts/{id}
pub async fn update(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<PostPatch>,
) -> AppResult<HttpResponse> {
    let id = document_id(&path)?;
    let patch = body.into_inner();
    patch.validate()?;

    let mut post = state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found(POST, id))?;

    post.apply(patch, Utc::now());
    let post = state.posts.update(post).await.map_err(missing_as(POST, id))?;
    Ok(HttpResponse::Ok().json(post))
}

/// DELETE /posts/{id}
///
/// The post's comments are left in place.
pub async fn delete(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = document_id(&path)?;
    state.posts.delete(id).await.map_err(missing_as(POST, id))?;
    tracing::info!(post_id = %id, "Blog post deleted");
    Ok(HttpResponse::NoContent().finish())
}
