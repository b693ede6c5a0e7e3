// BlogService - operations the presentation layer calls
// Sits above the repositories and assembles detail pages, listings and likes

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::BlogConfig;
use crate::error::AppResult;
use crate::infrastructure::DocumentStore;
use crate::models::{Post, Project, TeamProject};
use crate::services::engagement::{LikeGuard, LikeOutcome, LikeStatus};
use crate::services::listing::{self, PostFilter};
use crate::services::post_repository::PostRepository;
use crate::services::project_repository::ProjectRepository;
use crate::services::series::{NavDirection, SeriesContext};

/// Everything a post page renders
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    pub post: Post,
    pub series: SeriesContext,
    pub related_posts: Vec<Post>,
    pub related_error: Option<String>,
}

/// Filtered listing plus the values available for the filter toggles
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostListing {
    pub posts: Vec<Post>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub filter: PostFilter,
}

#[derive(Clone)]
pub struct BlogService {
    posts: PostRepository,
    projects: ProjectRepository,
}

impl BlogService {
    pub fn new(store: Arc<dyn DocumentStore>, config: BlogConfig) -> Self {
        Self {
            posts: PostRepository::new(Arc::clone(&store), config),
            projects: ProjectRepository::new(store),
        }
    }

    pub fn posts(&self) -> &PostRepository {
        &self.posts
    }

    /// Post, series navigation and related posts for one page.
    ///
    /// Series and related lookups run concurrently once the post is known;
    /// neither can fail the page.
    pub async fn fetch_post_detail(&self, id: &str) -> AppResult<Option<PostDetail>> {
        let Some(post) = self.posts.get_post(id).await? else {
            return Ok(None);
        };

        let (series, related) = tokio::join!(
            self.posts.series_for(&post),
            self.posts.related_for(&post)
        );

        Ok(Some(PostDetail {
            post,
            series,
            related_posts: related.posts,
            related_error: related.error,
        }))
    }

    pub async fn fetch_listing(&self, filter: PostFilter) -> AppResult<PostListing> {
        let all = self.posts.list_posts().await?;
        Ok(PostListing {
            posts: listing::filter_posts(&all, &filter),
            categories: listing::categories(&all),
            tags: listing::tags(&all),
            filter,
        })
    }

    /// Like a post on behalf of a session.
    ///
    /// `displayed_likes` is the count the caller currently shows; it only
    /// advances once the store confirms the increment.
    pub async fn like(&self, id: &str, guard: LikeGuard, displayed_likes: u64) -> LikeOutcome {
        let mut guard = guard;
        match self.posts.increment_like(id, &mut guard).await {
            Ok(true) => {
                info!(post_id = id, "like recorded");
                LikeOutcome {
                    liked: guard,
                    likes: displayed_likes.saturating_add(1),
                    status: LikeStatus::Recorded,
                    error: None,
                }
            }
            Ok(false) => LikeOutcome {
                liked: guard,
                likes: displayed_likes,
                status: LikeStatus::AlreadyLiked,
                error: None,
            },
            Err(e) => {
                warn!(post_id = id, error = %e, "like was not recorded");
                LikeOutcome {
                    liked: guard,
                    likes: displayed_likes,
                    status: LikeStatus::Failed,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    pub fn navigate(&self, direction: NavDirection, series: &SeriesContext) -> Option<String> {
        series.navigate(direction).map(str::to_string)
    }

    pub async fn list_projects(&self) -> AppResult<Vec<Project>> {
        self.projects.list_projects().await
    }

    pub async fn list_team_projects(&self) -> AppResult<Vec<TeamProject>> {
        self.projects.list_team_projects().await
    }

    pub async fn health_check(&self) -> AppResult<()> {
        self.posts.store().health_check().await
    }
}
