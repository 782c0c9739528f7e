use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use quill_db::BlogFilter;
use quill_types::api::UpdateProfileRequest;
use quill_types::models::UserProfile;

use crate::auth::require;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::{AdminCtx, Ctx};
use crate::state::AppState;

/// GET /auth/profile — the caller with every post they wrote.
pub async fn profile(
    State(state): State<AppState>,
    ctx: Ctx,
) -> Result<impl IntoResponse, ApiError> {
    let author_id = ctx.user_id().to_string();
    let rows = state
        .query(move |db| db.list_blogs(&BlogFilter::Author(author_id)))
        .await?;

    let blogs = rows
        .into_iter()
        .map(|row| row.into_blog(Some(ctx.user.clone())))
        .collect();

    Ok(Json(json!({
        "success": true,
        "user": UserProfile { user: ctx.user, blogs },
        "token": ctx.token,
    })))
}

/// PUT /auth/update-profile — partial update over the profile allow-list.
pub async fn update_profile(
    State(state): State<AppState>,
    ctx: Ctx,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(name) = &req.name {
        require(name, "Name")?;
    }

    let id = ctx.user_id().to_string();
    let updated = state
        .query(move |db| {
            let Some(mut row) = db.get_user_by_id(&id)? else {
                return Ok(None);
            };

            if let Some(name) = req.name {
                row.name = name.trim().to_string();
            }
            if let Some(avatar) = req.avatar {
                row.avatar = Some(avatar);
            }
            if let Some(interests) = req.interests {
                row.set_interests(&interests);
            }
            if let Some(about) = req.about {
                row.about = about;
            }
            if let Some(phone) = req.phone {
                row.phone = phone;
            }
            if let Some(address) = req.address {
                row.address = address;
            }
            if let Some(gender) = req.gender {
                row.gender = gender;
            }
            if let Some(birthday) = req.birthday {
                row.birthday = Some(birthday.format("%Y-%m-%d").to_string());
            }

            db.update_user_profile(&row)?;
            db.get_user_by_id(&id)
        })
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let user = updated.into_user();
    let token = state.issue_token(user.id)?;

    Ok(Json(json!({
        "success": true,
        "message": "User updated successfully",
        "user": user,
        "token": token,
    })))
}

/// GET /auth/users (admin)
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminCtx,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.query(|db| db.list_users()).await?;
    let users: Vec<_> = rows.into_iter().map(|r| r.into_user()).collect();

    Ok(Json(json!({
        "success": true,
        "users": users,
    })))
}

/// DELETE /auth/user — the caller deletes their own account.
pub async fn delete_self(
    State(state): State<AppState>,
    ctx: Ctx,
) -> Result<impl IntoResponse, ApiError> {
    let id = ctx.user_id().to_string();
    if !state.query(move |db| db.delete_user(&id)).await? {
        return Err(ApiError::NotFound("User not found".into()));
    }

    info!("User {} deleted their account", ctx.user_id());
    Ok(Json(json!({
        "success": true,
        "message": "Sad to see you go, user deleted successfully",
    })))
}

/// DELETE /auth/users/{id} (admin)
pub async fn delete_user(
    State(state): State<AppState>,
    AdminCtx(admin): AdminCtx,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let id = user_id.to_string();
    if !state.query(move |db| db.delete_user(&id)).await? {
        return Err(ApiError::NotFound("User not found".into()));
    }

    info!("Admin {} deleted user {}", admin.user_id(), user_id);
    Ok(Json(json!({
        "success": true,
        "message": "User deleted successfully",
    })))
}
