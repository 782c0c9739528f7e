use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tracing::info;

use quill_db::{is_unique_violation, models::UserRow};
use quill_types::api::{ForgotPasswordRequest, LoginRequest, RegisterRequest};
use quill_types::models::Role;

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::middleware::Ctx;
use crate::state::AppState;

/// Emails are matched case-insensitively.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn require(value: &str, field: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require(&req.name, "Name")?;
    require(&req.email, "Email")?;
    require(&req.password, "Password")?;
    require(&req.answer, "Answer")?;

    let email = normalize_email(&req.email);

    let lookup = email.clone();
    if state
        .query(move |db| db.get_user_by_email(&lookup))
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("User already exists".into()));
    }

    let password_hash = state.hash_password(req.password).await?;
    let role = if state.config.is_admin_email(&email) {
        Role::Admin
    } else {
        Role::User
    };
    let row = UserRow::new(req.name.trim(), &email, &password_hash, &req.answer, role);

    let insert = row.clone();
    state
        .query(move |db| db.create_user(&insert))
        .await
        .map_err(|e| match e {
            // Lost a race with a concurrent registration of the same email.
            ApiError::Internal(inner) if is_unique_violation(&inner) => {
                ApiError::Conflict("User already exists".into())
            }
            other => other,
        })?;

    let user = row.into_user();
    let token = state.issue_token(user.id)?;
    info!("User {} registered as {}", user.id, user.role);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User created successfully",
            "user": user,
            "token": token,
        })),
    ))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = normalize_email(&req.email);
    let row = state
        .query(move |db| db.get_user_by_email(&email))
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".into()))?;

    if !state
        .verify_password(req.password, row.password.clone())
        .await?
    {
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    let mut user = row.into_user();

    // Emails added to the admin list after registration are promoted here.
    if !user.is_admin() && state.config.is_admin_email(&user.email) {
        let id = user.id.to_string();
        state
            .query(move |db| db.set_user_role(&id, Role::Admin))
            .await?;
        info!("User {} promoted to admin", user.id);
        user.role = Role::Admin;
    }

    let token = state.issue_token(user.id)?;

    Ok(Json(json!({
        "success": true,
        "message": "User logged in successfully",
        "user": user,
        "token": token,
    })))
}

/// POST /auth/forgot-password
///
/// Resets the password when the recovery answer matches exactly. No new
/// token is issued; the caller logs in again.
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require(&req.email, "Email")?;
    require(&req.answer, "Answer")?;
    require(&req.new_password, "New password")?;

    let email = normalize_email(&req.email);
    let row = state
        .query(move |db| db.get_user_by_email(&email))
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    if row.answer != req.answer {
        return Err(ApiError::Unauthorized("Answer is not matching".into()));
    }

    let password_hash = state.hash_password(req.new_password).await?;
    let id = row.id.clone();
    let updated = state
        .query(move |db| {
            db.update_password(&id, &password_hash)?;
            db.get_user_by_id(&id)
        })
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    info!("Password reset for user {}", updated.id);

    Ok(Json(json!({
        "success": true,
        "message": "Password updated successfully",
        "user": updated.into_user(),
    })))
}

/// GET /auth/logout — tokens are stateless, so this only acknowledges.
pub async fn logout(ctx: Ctx) -> Json<serde_json::Value> {
    info!("User {} logged out", ctx.user_id());
    Json(json!({
        "success": true,
        "message": "User logged out successfully",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn blank_fields_are_rejected() {
        assert!(matches!(require("   ", "Name"), Err(ApiError::Validation(m)) if m == "Name is required"));
        assert!(require("x", "Name").is_ok());
    }
}
