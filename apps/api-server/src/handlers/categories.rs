//! Category routes.

use actix_web::{HttpRequest, HttpResponse, http::header, web};
use chrono::Utc;

use globe_core::domain::{Category, CategoryPatch, NewCategory, Page};
use globe_core::error::DomainError;
use globe_shared::dto::ListQuery;

use super::{CATEGORY, document_id, location, missing_as};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /categories
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> AppResult<HttpResponse> {
    let categories = state
        .categories
        .list(Page::new(query.skip, query.top))
        .await?;
    Ok(HttpResponse::Ok().json(categories))
}

/// POST /categories
pub async fn create(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<NewCategory>,
) -> AppResult<HttpResponse> {
    let category = Category::create(body.into_inner(), Utc::now());
    let category = state.categories.insert(category).await?;
    tracing::info!(category_id = %category.id, "Category created");

    Ok(HttpResponse::Created()
        .insert_header((
            header::LOCATION,
            location(&req, &format!("categories/{}", category.id)),
        ))
        .json(category))
}

/// GET /categories/{id}
pub async fn get(state: web::Data<AppState>, path: web::Path<String>) -> AppResult<HttpResponse> {
    let id = document_id(&path)?;
    let category = state
        .categories
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found(CATEGORY, id))?;
    Ok(HttpResponse::Ok().json(category))
}

/// PUT /categories/{id}
pub async fn update(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<CategoryPatch>,
) -> AppResult<HttpResponse> {
    let id = document_id(&path)?;
    let mut category = state
        .categories
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::not_found(CATEGORY, id))?;

    category.apply(body.into_inner(), Utc::now());
    let category = state
        .categories
        .update(category)
        .await
        .map_err(missing_as(CATEGORY, id))?;
    Ok(HttpResponse::Ok().json(category))
}

/// DELETE /categories/{id}
///
/// Posts filed under the category keep their `categoryId`.
pub async fn delete(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = document_id(&path)?;
    state
        .categories
        .delete(id)
        .await
        .map_err(missing_as(CATEGORY, id))?;
    tracing::info!(category_id = %id, "Category deleted");
    Ok(HttpResponse::NoContent().finish())
}
