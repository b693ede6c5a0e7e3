// PostView - per-viewer state of the post page
// Every fetch is tagged with the generation it was issued under; results from
// a superseded generation are dropped instead of overwriting newer state.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::models::Post;
use crate::services::blog_service::BlogService;
use crate::services::engagement::{LikeGuard, LikeOutcome, LikeStatus};
use crate::services::series::{NavDirection, SeriesContext};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "state", content = "value")]
pub enum LoadState<T> {
    #[default]
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            LoadState::Ready(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostViewState {
    pub post_id: Option<String>,
    /// `Ready(None)` means the post does not exist
    pub post: LoadState<Option<Post>>,
    pub series: LoadState<SeriesContext>,
    pub related: LoadState<Vec<Post>>,
    pub like_guard: LikeGuard,
    /// Posts liked during this session, kept across `open` calls
    #[serde(skip)]
    pub liked_posts: HashSet<String>,
}

impl PostViewState {
    fn reset_for(&mut self, id: &str) {
        self.post_id = Some(id.to_string());
        self.post = LoadState::Loading;
        self.series = LoadState::Loading;
        self.related = LoadState::Loading;
        self.like_guard = LikeGuard::new(self.liked_posts.contains(id));
    }

    pub fn current_post(&self) -> Option<&Post> {
        self.post.ready().and_then(Option::as_ref)
    }
}

pub struct PostView {
    service: BlogService,
    generation: AtomicU64,
    state: RwLock<PostViewState>,
    like_lock: Mutex<()>,
}

impl PostView {
    pub fn new(service: BlogService) -> Self {
        Self {
            service,
            generation: AtomicU64::new(0),
            state: RwLock::new(PostViewState::default()),
            like_lock: Mutex::new(()),
        }
    }

    pub async fn snapshot(&self) -> PostViewState {
        self.state.read().await.clone()
    }

    /// Load `id` into the view, superseding whatever was loading before
    pub async fn open(&self, id: &str) {
        let generation = {
            let mut state = self.state.write().await;
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            state.reset_for(id);
            generation
        };

        let post = match self.service.posts().get_post(id).await {
            Ok(Some(post)) => post,
            Ok(None) => {
                self.apply(generation, |state| {
                    state.post = LoadState::Ready(None);
                    state.series = LoadState::Ready(SeriesContext::empty());
                    state.related = LoadState::Ready(Vec::new());
                })
                .await;
                return;
            }
            Err(e) => {
                warn!(post_id = id, error = %e, "failed to load post");
                let message = e.to_string();
                self.apply(generation, |state| {
                    state.post = LoadState::Failed(message);
                    state.series = LoadState::Ready(SeriesContext::empty());
                    state.related = LoadState::Ready(Vec::new());
                })
                .await;
                return;
            }
        };

        let applied = self
            .apply(generation, |state| state.post = LoadState::Ready(Some(post.clone())))
            .await;
        if !applied {
            return;
        }

        let posts = self.service.posts();
        tokio::join!(
            async {
                let series = posts.series_for(&post).await;
                self.apply(generation, |state| state.series = LoadState::Ready(series))
                    .await;
            },
            async {
                let related = posts.related_for(&post).await;
                self.apply(generation, |state| {
                    state.related = match related.error {
                        Some(message) => LoadState::Failed(message),
                        None => LoadState::Ready(related.posts),
                    };
                })
                .await;
            }
        );
    }

    /// Run `update` only if no newer `open` happened since `generation` was issued
    async fn apply<F>(&self, generation: u64, update: F) -> bool
    where
        F: FnOnce(&mut PostViewState),
    {
        let mut state = self.state.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "discarding stale result");
            return false;
        }
        update(&mut state);
        true
    }

    /// Like the post currently shown; `None` when no post is loaded
    pub async fn like(&self) -> Option<LikeOutcome> {
        let _serial = self.like_lock.lock().await;

        let (generation, id, guard, likes) = {
            let state = self.state.read().await;
            let post = state.current_post()?;
            (
                self.generation.load(Ordering::SeqCst),
                post.id.clone(),
                state.like_guard,
                post.likes,
            )
        };

        let outcome = self.service.like(&id, guard, likes).await;
        if outcome.status == LikeStatus::Recorded {
            let mut state = self.state.write().await;
            state.liked_posts.insert(id);
            if self.generation.load(Ordering::SeqCst) == generation {
                state.like_guard = outcome.liked;
                if let LoadState::Ready(Some(post)) = &mut state.post {
                    post.likes = outcome.likes;
                }
            }
        }
        Some(outcome)
    }

    /// Target of a series navigation from the current post
    pub async fn navigate(&self, direction: NavDirection) -> Option<String> {
        let state = self.state.read().await;
        let series = state.series.ready()?;
        self.service.navigate(direction, series)
    }

    /// Navigate and open the target in one step
    pub async fn open_adjacent(&self, direction: NavDirection) -> Option<String> {
        let target = self.navigate(direction).await?;
        self.open(&target).await;
        Some(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BlogConfig;
    use crate::infrastructure::{DocumentStore, MemoryDocumentStore};
    use crate::models::{NewPost, BLOG_POSTS};
    use std::sync::Arc;

    async fn seeded_view() -> (Arc<MemoryDocumentStore>, PostView) {
        let store = Arc::new(MemoryDocumentStore::new());
        let posts = [
            NewPost::new("Intro 1").in_series("Intro", 1).with_tags(["rust"]),
            NewPost::new("Intro 2").in_series("Intro", 2).with_tags(["rust"]).with_likes(3),
            NewPost::new("Other").with_tags(["rust", "sql"]).with_views(7),
        ];
        for (id, post) in ["first", "second", "other"].iter().zip(posts.iter()) {
            store
                .set_document(BLOG_POSTS, id, post.to_fields().unwrap())
                .await
                .unwrap();
        }
        let service = BlogService::new(store.clone(), BlogConfig::default());
        (store, PostView::new(service))
    }

    #[tokio::test]
    async fn test_open_fills_every_section() {
        let (_store, view) = seeded_view().await;
        view.open("second").await;

        let state = view.snapshot().await;
        assert_eq!(state.current_post().unwrap().id, "second");
        let series = state.series.ready().unwrap();
        assert_eq!(series.position, Some(1));
        let related: Vec<_> = state.related.ready().unwrap().iter().map(|p| p.id.clone()).collect();
        assert_eq!(related, vec!["other", "first"]);
        assert!(!state.like_guard.is_set());
    }

    #[tokio::test]
    async fn test_missing_post_is_ready_none() {
        let (_store, view) = seeded_view().await;
        view.open("nope").await;
        let state = view.snapshot().await;
        assert_eq!(state.post, LoadState::Ready(None));
        assert_eq!(view.like().await, None);
        assert_eq!(view.navigate(NavDirection::Next).await, None);
    }

    #[tokio::test]
    async fn test_like_once_per_session_and_post() {
        let (store, view) = seeded_view().await;
        view.open("second").await;

        let first = view.like().await.unwrap();
        assert_eq!(first.status, LikeStatus::Recorded);
        assert_eq!(first.likes, 4);
        let second = view.like().await.unwrap();
        assert_eq!(second.status, LikeStatus::AlreadyLiked);
        assert_eq!(second.likes, 4);

        view.open("first").await;
        assert!(!view.snapshot().await.like_guard.is_set());
        view.open("second").await;
        assert!(view.snapshot().await.like_guard.is_set());

        let doc = store.get_by_id(BLOG_POSTS, "second").await.unwrap().unwrap();
        assert_eq!(doc.fields["likes"], 4);
    }

    #[tokio::test]
    async fn test_open_adjacent_follows_series() {
        let (_store, view) = seeded_view().await;
        view.open("first").await;
        assert_eq!(view.open_adjacent(NavDirection::Previous).await, None);
        assert_eq!(
            view.open_adjacent(NavDirection::Next).await.as_deref(),
            Some("second")
        );
        let state = view.snapshot().await;
        assert_eq!(state.post_id.as_deref(), Some("second"));
        assert_eq!(state.current_post().unwrap().title, "Intro 2");
    }
}
