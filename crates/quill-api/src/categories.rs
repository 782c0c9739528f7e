use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use quill_db::models::CategoryRow;
use quill_types::api::CategoryRequest;

use crate::auth::require;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::AdminCtx;
use crate::slug::slugify;
use crate::state::AppState;

/// Name checked, trimmed and turned into its slug.
fn name_and_slug(req: &CategoryRequest) -> Result<(String, String), ApiError> {
    require(&req.name, "Name")?;
    let name = req.name.trim().to_string();
    let slug = slugify(&name);
    if slug.is_empty() {
        return Err(ApiError::Validation(
            "Name must contain at least one letter or digit".into(),
        ));
    }
    Ok((name, slug))
}

/// GET /categories
pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = state.query(|db| db.list_categories()).await?;
    let categories: Vec<_> = rows.into_iter().map(|r| r.into_category()).collect();

    Ok(Json(json!({
        "success": true,
        "data": categories,
    })))
}

/// GET /categories/{slug}
pub async fn get_category(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state
        .query(move |db| db.get_category_by_slug(&slug))
        .await?
        .ok_or_else(|| ApiError::NotFound("Category not found".into()))?;

    Ok(Json(json!({
        "success": true,
        "category": category.into_category(),
    })))
}

/// POST /categories (admin)
///
/// Uniqueness is a lookup before the insert; two concurrent creates with the
/// same name can both succeed.
pub async fn create_category(
    State(state): State<AppState>,
    AdminCtx(admin): AdminCtx,
    ApiJson(req): ApiJson<CategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (name, slug) = name_and_slug(&req)?;

    let lookup = name.clone();
    if state
        .query(move |db| db.get_category_by_name(&lookup))
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Category already exists".into()));
    }

    let row = CategoryRow::new(&name, &slug);
    let insert = row.clone();
    state.query(move |db| db.insert_category(&insert)).await?;

    info!("Admin {} created category '{}'", admin.user_id(), name);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Category created successfully",
            "category": row.into_category(),
        })),
    ))
}

/// PUT /categories/{id} (admin) — rename; posts keep their reference.
pub async fn update_category(
    State(state): State<AppState>,
    AdminCtx(admin): AdminCtx,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (name, slug) = name_and_slug(&req)?;
    let category_id = id.to_string();

    let lookup = name.clone();
    if let Some(existing) = state
        .query(move |db| db.get_category_by_name(&lookup))
        .await?
    {
        if existing.id != category_id {
            return Err(ApiError::Conflict("Category already exists".into()));
        }
    }

    let updated = state
        .query(move |db| db.update_category(&category_id, &name, &slug))
        .await?
        .ok_or_else(|| ApiError::NotFound("Category not found".into()))?;

    info!("Admin {} updated category {}", admin.user_id(), id);

    Ok(Json(json!({
        "success": true,
        "message": "Category updated successfully",
        "category": updated.into_category(),
    })))
}

/// DELETE /categories/{id} (admin)
pub async fn delete_category(
    State(state): State<AppState>,
    AdminCtx(admin): AdminCtx,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let category_id = id.to_string();
    let deleted = state
        .query(move |db| db.delete_category(&category_id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Category not found".into()))?;

    info!("Admin {} deleted category {}", admin.user_id(), id);

    Ok(Json(json!({
        "success": true,
        "message": "Category deleted successfully",
        "category": deleted.into_category(),
    })))
}
