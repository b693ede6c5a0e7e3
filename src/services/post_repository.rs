// Post Repository - post reads, series/related queries and engagement counters
// All derived data is recomputed per call; nothing is cached here.

use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::config::BlogConfig;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{Direction, Document, DocumentQuery, DocumentStore, Filter};
use crate::models::post::{
    LIKES_FIELD, SERIES_NAME_FIELD, SERIES_ORDER_FIELD, TAGS_FIELD, VIEWS_FIELD,
};
use crate::models::{Post, BLOG_POSTS};
use crate::services::engagement::LikeGuard;
use crate::services::listing::sort_newest_first;
use crate::services::related::{normalize_tags, rank_related, RelatedPosts};
use crate::services::series::SeriesContext;

pub const RELATED_ERROR_MESSAGE: &str = "Could not load related posts";

#[derive(Clone)]
pub struct PostRepository {
    store: Arc<dyn DocumentStore>,
    config: BlogConfig,
}

impl PostRepository {
    pub fn new(store: Arc<dyn DocumentStore>, config: BlogConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> Arc<dyn DocumentStore> {
        Arc::clone(&self.store)
    }

    pub fn config(&self) -> &BlogConfig {
        &self.config
    }

    /// Fetch one post and record a view for it.
    ///
    /// Returns `Ok(None)` when the post does not exist. The returned post carries
    /// the counters as read, before the view increment lands.
    #[instrument(skip(self))]
    pub async fn get_post(&self, id: &str) -> AppResult<Option<Post>> {
        let post = self.find_post(id).await?;
        if let Some(post) = &post {
            self.record_view(&post.id);
        }
        Ok(post)
    }

    /// Plain read without counting a view
    pub async fn find_post(&self, id: &str) -> AppResult<Option<Post>> {
        if id.trim().is_empty() {
            return Err(AppError::Validation("Post id must not be empty".to_string()));
        }

        let Some(doc) = self.store.get_by_id(BLOG_POSTS, id).await? else {
            debug!(post_id = id, "post not found");
            return Ok(None);
        };
        Post::from_document(doc).map(Some)
    }

    /// Fire-and-forget view increment; failures are logged and dropped
    fn record_view(&self, id: &str) {
        let store = Arc::clone(&self.store);
        let id = id.to_string();
        tokio::spawn(async move {
            match store.increment_field(BLOG_POSTS, &id, VIEWS_FIELD, 1).await {
                Ok(()) => debug!(post_id = %id, "view recorded"),
                Err(e) => warn!(post_id = %id, error = %e, "failed to record view"),
            }
        });
    }

    /// All posts of `series_name` in ascending series order, positioned at `current_id`
    #[instrument(skip(self))]
    pub async fn get_series(
        &self,
        series_name: Option<&str>,
        current_id: &str,
    ) -> AppResult<SeriesContext> {
        let Some(name) = series_name.filter(|n| !n.trim().is_empty()) else {
            return Ok(SeriesContext::empty());
        };

        let query = DocumentQuery::new()
            .filter(Filter::eq(SERIES_NAME_FIELD, name))
            .order_by(SERIES_ORDER_FIELD, Direction::Ascending);
        let docs = self.store.query(BLOG_POSTS, &query).await?;
        let context = SeriesContext::new(name, self.decode_all(docs), current_id);

        if context.position.is_none() {
            warn!(series = name, post_id = current_id, "post missing from its own series");
        }
        Ok(context)
    }

    /// Series context for a post, degrading to "no series" on store failure
    pub async fn series_for(&self, post: &Post) -> SeriesContext {
        match self.get_series(post.series_name(), &post.id).await {
            Ok(context) => context,
            Err(e) => {
                warn!(post_id = %post.id, error = %e, "failed to load series");
                SeriesContext::empty()
            }
        }
    }

    /// Posts sharing at least one tag with `tags`, excluding `exclude_id`.
    ///
    /// Never fails: store errors come back as an empty list with `error` set.
    #[instrument(skip(self, tags))]
    pub async fn get_related(
        &self,
        tags: &[String],
        exclude_id: &str,
        limit: usize,
    ) -> RelatedPosts {
        let tags = normalize_tags(tags);
        if tags.is_empty() || limit == 0 {
            return RelatedPosts::empty();
        }

        // No limit: overlap ranking needs the whole matching set
        let query = DocumentQuery::new()
            .filter(Filter::array_contains_any(TAGS_FIELD, tags.clone()))
            .filter(Filter::id_not_eq(exclude_id))
            .order_by(VIEWS_FIELD, Direction::Descending);

        match self.store.query(BLOG_POSTS, &query).await {
            Ok(docs) => {
                let ranked = rank_related(self.decode_all(docs), &tags, exclude_id, limit);
                debug!(count = ranked.len(), "related posts ranked");
                RelatedPosts::loaded(ranked)
            }
            Err(e) => {
                warn!(post_id = exclude_id, error = %e, "failed to load related posts");
                RelatedPosts::failed(RELATED_ERROR_MESSAGE)
            }
        }
    }

    /// Related posts for `post` using the configured limit
    pub async fn related_for(&self, post: &Post) -> RelatedPosts {
        self.get_related(&post.tags, &post.id, self.config.related_limit)
            .await
    }

    /// Increment the like counter unless the session guard is already set.
    ///
    /// Returns `Ok(true)` when the store confirmed the increment; the guard is
    /// only set in that case.
    #[instrument(skip(self, guard))]
    pub async fn increment_like(&self, id: &str, guard: &mut LikeGuard) -> AppResult<bool> {
        if guard.is_set() {
            debug!("already liked in this session");
            return Ok(false);
        }
        if id.trim().is_empty() {
            return Err(AppError::Validation("Post id must not be empty".to_string()));
        }

        self.store.increment_field(BLOG_POSTS, id, LIKES_FIELD, 1).await?;
        guard.set();
        Ok(true)
    }

    /// Every post, newest first; documents that cannot be decoded are skipped
    #[instrument(skip(self))]
    pub async fn list_posts(&self) -> AppResult<Vec<Post>> {
        let docs = self.store.query(BLOG_POSTS, &DocumentQuery::new()).await?;
        let mut posts = self.decode_all(docs);
        sort_newest_first(&mut posts);
        Ok(posts)
    }

    fn decode_all(&self, docs: Vec<Document>) -> Vec<Post> {
        docs.into_iter()
            .filter_map(|doc| {
                let id = doc.id.clone();
                match Post::from_document(doc) {
                    Ok(post) => Some(post),
                    Err(e) => {
                        warn!(post_id = %id, error = %e, "skipping malformed post");
                        None
                    }
                }
            })
            .collect()
    }
}
