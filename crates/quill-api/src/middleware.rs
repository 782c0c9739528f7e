use axum::{
    Json, RequestPartsExt,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use quill_types::models::User;

use crate::error::{ApiError, ErrorReport};
use crate::state::AppState;
use crate::token;

/// An authenticated request: the bearer token verified and the current user
/// record loaded. Taking a `Ctx` argument is what makes a handler protected.
#[derive(Debug, Clone)]
pub struct Ctx {
    pub user: User,
    pub token: String,
}

impl Ctx {
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }

    pub fn is_admin(&self) -> bool {
        self.user.is_admin()
    }

    /// Owners may change their own resources; admins may change anything.
    pub fn can_modify(&self, owner_id: &str) -> bool {
        self.is_admin() || self.user.id.to_string() == owner_id
    }
}

impl FromRequestParts<AppState> for Ctx {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| ApiError::Unauthorized("Not authorized to access this route".into()))?;

        let token = bearer.token().to_string();
        let claims = token::verify(&state.config.jwt_secret, &token).map_err(|e| {
            debug!("Token rejected: {}", e);
            ApiError::Unauthorized(format!("Not authorized, token failed: {}", e))
        })?;

        let id = claims.id.to_string();
        let user = state
            .query(move |db| db.get_user_by_id(&id))
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Not authorized, user no longer exists".into()))?;

        Ok(Ctx {
            user: user.into_user(),
            token,
        })
    }
}

/// A [`Ctx`] whose user holds the admin role.
#[derive(Debug, Clone)]
pub struct AdminCtx(pub Ctx);

impl FromRequestParts<AppState> for AdminCtx {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let ctx = Ctx::from_request_parts(parts, state).await?;
        if !ctx.is_admin() {
            return Err(ApiError::Unauthorized("Not authorized as an admin".into()));
        }
        Ok(AdminCtx(ctx))
    }
}

/// Final shape of every error body: `{message}` in production,
/// `{message, stack}` everywhere else.
pub async fn render_errors(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;

    let Some(report) = response.extensions_mut().remove::<ErrorReport>() else {
        return response;
    };
    if state.config.is_production() {
        return response;
    }

    let status = response.status();
    (
        status,
        Json(json!({ "message": report.message, "stack": report.stack })),
    )
        .into_response()
}
