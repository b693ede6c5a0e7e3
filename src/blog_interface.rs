// Blog Interface - JSON endpoints over BlogService

use axum::{
    extract::{Path as AxumPath, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    models::{Project, TeamProject},
    services::{
        BlogService, CategoryFilter, LikeGuard, LikeOutcome, NavDirection, PostDetail, PostFilter,
        PostListing,
    },
};

// HTTP Request/Response types
#[derive(Debug, Default, Deserialize)]
pub struct ListPostsQuery {
    pub category: Option<String>,
    pub tag: Option<String>,
}

impl ListPostsQuery {
    fn into_filter(self) -> PostFilter {
        let filter =
            PostFilter::all().with_category(CategoryFilter::parse(self.category.as_deref()));
        match self.tag {
            Some(tag) => filter.with_tag(tag),
            None => filter,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LikeRequest {
    pub liked: bool,
    pub likes: u64,
}

// HTTP Handlers

pub async fn list_posts_handler(
    State(blog): State<BlogService>,
    Query(params): Query<ListPostsQuery>,
) -> AppResult<Json<PostListing>> {
    Ok(Json(blog.fetch_listing(params.into_filter()).await?))
}

pub async fn get_post_handler(
    State(blog): State<BlogService>,
    AxumPath(id): AxumPath<String>,
) -> AppResult<Json<PostDetail>> {
    match blog.fetch_post_detail(&id).await? {
        Some(detail) => Ok(Json(detail)),
        None => Err(AppError::NotFound(format!("Post with id {} not found", id))),
    }
}

pub async fn like_post_handler(
    State(blog): State<BlogService>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<LikeRequest>,
) -> Json<LikeOutcome> {
    Json(blog.like(&id, LikeGuard::new(req.liked), req.likes).await)
}

pub async fn navigate_handler(
    State(blog): State<BlogService>,
    AxumPath((id, direction)): AxumPath<(String, String)>,
) -> AppResult<Json<Value>> {
    let direction: NavDirection = direction.parse()?;
    let Some(post) = blog.posts().find_post(&id).await? else {
        return Err(AppError::NotFound(format!("Post with id {} not found", id)));
    };
    let series = blog.posts().series_for(&post).await;
    Ok(Json(json!({ "target": blog.navigate(direction, &series) })))
}

pub async fn list_projects_handler(
    State(blog): State<BlogService>,
) -> AppResult<Json<Vec<Project>>> {
    Ok(Json(blog.list_projects().await?))
}

pub async fn list_team_projects_handler(
    State(blog): State<BlogService>,
) -> AppResult<Json<Vec<TeamProject>>> {
    Ok(Json(blog.list_team_projects().await?))
}

pub async fn health_handler(State(blog): State<BlogService>) -> AppResult<Json<Value>> {
    blog.health_check().await?;
    Ok(Json(json!({ "status": "ok" })))
}

pub fn create_blog_router(blog: BlogService) -> Router {
    Router::new()
        // Posts
        .route("/posts", get(list_posts_handler))
        .route("/posts/{id}", get(get_post_handler))
        .route("/posts/{id}/like", post(like_post_handler))
        .route("/posts/{id}/navigate/{direction}", get(navigate_handler))
        // Portfolio
        .route("/projects", get(list_projects_handler))
        .route("/team-projects", get(list_team_projects_handler))
        .route("/health", get(health_handler))
        .with_state(blog)
}
