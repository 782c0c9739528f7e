use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, OriginalUri},
    handler::HandlerWithoutStateExt,
    middleware,
    routing::{delete, get, patch, post, put},
};
use serde_json::{Value, json};
use tower_http::services::ServeDir;

use crate::error::ApiError;
use crate::middleware::render_errors;
use crate::state::AppState;
use crate::uploads::UPLOADS_PREFIX;
use crate::{auth, blogs, categories, uploads, users};

/// Prefix for the JSON API. Uploads are served from the root.
pub const API_PREFIX: &str = "/api/v1";

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/logout", get(auth::logout))
        .route("/profile", get(users::profile))
        .route("/update-profile", put(users::update_profile))
        .route("/users", get(users::list_users))
        .route("/user", delete(users::delete_self))
        .route("/users/{id}", delete(users::delete_user))
        .method_not_allowed_fallback(not_found)
}

fn blog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(blogs::list_blogs).post(blogs::create_blog))
        .route("/featured", get(blogs::featured_blogs))
        .route("/related", get(blogs::related_blogs))
        .route("/search", get(blogs::search_blogs))
        .route("/tag/{tag}", get(blogs::blogs_by_tag))
        .route("/like/{id}", patch(blogs::like_blog))
        .route(
            "/{id}",
            get(blogs::get_blog)
                .put(blogs::update_blog)
                .delete(blogs::delete_blog),
        )
        .method_not_allowed_fallback(not_found)
}

fn category_routes() -> Router<AppState> {
    // One parameter name for the whole path: GET reads it as a slug,
    // PUT/DELETE as an id.
    Router::new()
        .route(
            "/",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/{key}",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        .method_not_allowed_fallback(not_found)
}

async fn welcome() -> Json<Value> {
    Json(json!({ "message": "Welcome to the API" }))
}

/// Unknown paths, unsupported methods and missing uploads all answer with
/// the same JSON 404. Nested routers see a stripped path, so report the
/// original one.
async fn not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::NotFound(format!("Not Found - {}", uri.path()))
}

/// The full application. CORS and request tracing are added by the binary.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/auth", auth_routes())
        .nest("/blogs", blog_routes())
        .nest("/categories", category_routes());

    Router::new()
        .route("/", get(welcome))
        .route("/upload", post(uploads::upload_image))
        .nest(API_PREFIX, api)
        .nest_service(
            UPLOADS_PREFIX,
            ServeDir::new(&state.config.upload_dir).not_found_service(not_found.into_service()),
        )
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(middleware::from_fn_with_state(state.clone(), render_errors))
        .with_state(state)
}
