use std::collections::{HashMap, HashSet};

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use quill_db::{BlogFilter, Database, models::BlogRow, now_timestamp};
use quill_types::api::{CreateBlogRequest, RelatedQuery, SearchQuery, UpdateBlogRequest};
use quill_types::models::{Blog, DEFAULT_BLOG_PHOTO, User};

use crate::auth::require;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::Ctx;
use crate::slug::slugify;
use crate::state::AppState;

/// Featured listings never return more than this many posts.
pub const FEATURED_LIMIT: u32 = 3;

/// Convert rows to API posts with their authors populated (one batch query).
fn with_authors(db: &Database, rows: Vec<BlogRow>) -> anyhow::Result<Vec<Blog>> {
    let author_ids: Vec<String> = rows
        .iter()
        .map(|r| r.author_id.clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let authors: HashMap<String, User> = db
        .get_users_by_ids(&author_ids)?
        .into_iter()
        .map(|u| (u.id.clone(), u.into_user()))
        .collect();

    Ok(rows
        .into_iter()
        .map(|row| {
            let author = authors.get(&row.author_id).cloned();
            row.into_blog(author)
        })
        .collect())
}

async fn list(state: &AppState, filter: BlogFilter) -> Result<Vec<Blog>, ApiError> {
    state
        .query(move |db| {
            let rows = db.list_blogs(&filter)?;
            with_authors(db, rows)
        })
        .await
}

fn blogs_response(blogs: Vec<Blog>) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "blogs": blogs,
    }))
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// GET /blogs
pub async fn list_blogs(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(blogs_response(list(&state, BlogFilter::All).await?))
}

/// GET /blogs/featured
pub async fn featured_blogs(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let filter = BlogFilter::Featured {
        limit: FEATURED_LIMIT,
    };
    Ok(blogs_response(list(&state, filter).await?))
}

/// GET /blogs/tag/{tag}
pub async fn blogs_by_tag(
    State(state): State<AppState>,
    ApiPath(tag): ApiPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = BlogFilter::Tags(vec![tag.trim().to_string()]);
    Ok(blogs_response(list(&state, filter).await?))
}

/// GET /blogs/related?tags=a,b — posts sharing at least one tag.
pub async fn related_blogs(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RelatedQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let tags = query.tag_list();
    if tags.is_empty() {
        return Err(ApiError::Validation("At least one tag is required".into()));
    }
    Ok(blogs_response(list(&state, BlogFilter::Tags(tags)).await?))
}

/// GET /blogs/search?query=
pub async fn search_blogs(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let needle = query.query.trim().to_string();
    if needle.is_empty() {
        return Err(ApiError::Validation("Search query is required".into()));
    }
    Ok(blogs_response(list(&state, BlogFilter::TitleContains(needle)).await?))
}

/// GET /blogs/{id} — counts as a view.
pub async fn get_blog(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let blog = state
        .query(move |db| match db.record_view(&id.to_string())? {
            Some(row) => Ok(with_authors(db, vec![row])?.pop()),
            None => Ok(None),
        })
        .await?
        .ok_or_else(|| ApiError::NotFound("Blog not found".into()))?;

    Ok(Json(json!({
        "success": true,
        "blog": blog,
    })))
}

/// POST /blogs — the caller becomes the author.
pub async fn create_blog(
    State(state): State<AppState>,
    ctx: Ctx,
    ApiJson(req): ApiJson<CreateBlogRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require(&req.title, "Title")?;
    require(&req.description, "Description")?;

    let id = Uuid::new_v4().to_string();
    let slug = match req.slug.as_deref().map(slugify) {
        Some(slug) if !slug.is_empty() => slug,
        _ => slugify(&req.title),
    };
    let now = now_timestamp();

    let row = BlogRow {
        slug: if slug.is_empty() { id.clone() } else { slug },
        id,
        title: req.title.trim().to_string(),
        description: req.description,
        photo: req
            .photo
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BLOG_PHOTO.to_string()),
        author_id: ctx.user_id().to_string(),
        category_id: req.category.map(|c| c.to_string()),
        views: 0,
        featured: req.featured,
        created_at: now.clone(),
        updated_at: now,
        tags: clean_tags(req.tags),
        likes: vec![],
    };

    let author = ctx.user.clone();
    let blog = state
        .query(move |db| {
            db.insert_blog(&row)?;
            Ok(db.get_blog(&row.id)?.map(|r| r.into_blog(Some(author))))
        })
        .await?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("blog vanished after insert")))?;

    info!("User {} created blog {}", ctx.user_id(), blog.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Blog created successfully",
            "data": blog,
        })),
    ))
}

/// PUT /blogs/{id} — author or admin. Only the fields present in the body
/// change.
pub async fn update_blog(
    State(state): State<AppState>,
    ctx: Ctx,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateBlogRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(title) = &req.title {
        require(title, "Title")?;
    }
    if let Some(description) = &req.description {
        require(description, "Description")?;
    }

    let blog_id = id.to_string();
    let mut row = state
        .query(move |db| db.get_blog(&blog_id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Blog not found".into()))?;

    if !ctx.can_modify(&row.author_id) {
        return Err(ApiError::Unauthorized(
            "You are not authorized to update this blog".into(),
        ));
    }

    if let Some(title) = req.title {
        row.title = title.trim().to_string();
    }
    if let Some(description) = req.description {
        row.description = description;
    }
    if let Some(photo) = req.photo {
        row.photo = photo;
    }
    if let Some(category) = req.category {
        row.category_id = Some(category.to_string());
    }
    if let Some(featured) = req.featured {
        row.featured = featured;
    }
    if let Some(tags) = req.tags {
        row.tags = clean_tags(tags);
    }
    if let Some(slug) = req.slug.as_deref().map(slugify).filter(|s| !s.is_empty()) {
        row.slug = slug;
    }

    let blog = state
        .query(move |db| {
            if !db.update_blog(&row)? {
                return Ok(None);
            }
            match db.get_blog(&row.id)? {
                Some(updated) => Ok(with_authors(db, vec![updated])?.pop()),
                None => Ok(None),
            }
        })
        .await?
        .ok_or_else(|| ApiError::NotFound("Blog not found".into()))?;

    info!("User {} updated blog {}", ctx.user_id(), blog.id);

    Ok(Json(json!({
        "success": true,
        "message": "Blog updated successfully",
        "data": blog,
    })))
}

/// DELETE /blogs/{id} — author or admin.
pub async fn delete_blog(
    State(state): State<AppState>,
    ctx: Ctx,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let blog_id = id.to_string();
    let row = state
        .query(move |db| db.get_blog(&blog_id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Blog not found".into()))?;

    if !ctx.can_modify(&row.author_id) {
        return Err(ApiError::Unauthorized(
            "You are not authorized to delete this blog".into(),
        ));
    }

    let blog_id = row.id;
    state.query(move |db| db.delete_blog(&blog_id)).await?;
    info!("User {} deleted blog {}", ctx.user_id(), id);

    Ok(Json(json!({
        "success": true,
        "message": "Blog deleted successfully",
    })))
}

/// PATCH /blogs/like/{id} — toggles the caller's like.
pub async fn like_blog(
    State(state): State<AppState>,
    ctx: Ctx,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let blog_id = id.to_string();
    let user_id = ctx.user_id().to_string();

    let (liked, blog) = state
        .query(move |db| match db.toggle_like(&blog_id, &user_id)? {
            Some((liked, row)) => Ok(with_authors(db, vec![row])?.pop().map(|b| (liked, b))),
            None => Ok(None),
        })
        .await?
        .ok_or_else(|| ApiError::NotFound("Blog not found".into()))?;

    let message = if liked { "Blog liked" } else { "Blog unliked" };
    Ok(Json(json!({
        "success": true,
        "message": message,
        "liked": liked,
        "blog": blog,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_tags_are_dropped() {
        let tags = clean_tags(vec![" rust ".into(), "".into(), "  ".into(), "web".into()]);
        assert_eq!(tags, vec!["rust", "web"]);
    }
}
