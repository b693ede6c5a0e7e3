#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use portfolio_content::config::BlogConfig;
use portfolio_content::infrastructure::{
    Document, DocumentId, DocumentQuery, DocumentStore, Fields, MemoryDocumentStore,
};
use portfolio_content::models::{NewPost, Post, BLOG_POSTS};
use portfolio_content::services::{BlogService, PostRepository};
use portfolio_content::{AppError, AppResult};

/// Blog fixture used across the integration tests:
/// the "Intro" series (intro-1, abc123, intro-3) plus tagged standalone posts.
pub fn sample_posts() -> Vec<NewPost> {
    vec![
        NewPost::new("Intro part 1")
            .with_id("intro-1")
            .with_category("Backend")
            .with_tags(["rust", "intro"])
            .in_series("Intro", 1)
            .with_views(3),
        NewPost::new("Intro part 2")
            .with_id("abc123")
            .with_category("Backend")
            .with_tags(["rust", "async"])
            .in_series("Intro", 2)
            .with_views(10)
            .with_likes(5),
        NewPost::new("Intro part 3")
            .with_id("intro-3")
            .with_category("Backend")
            .with_tags(["rust"])
            .in_series("Intro", 3)
            .with_views(1),
        NewPost::new("Async deep dive")
            .with_id("async-deep")
            .with_category("Backend")
            .with_tags(["rust", "async", "tokio"])
            .with_views(40),
        NewPost::new("CSS grids")
            .with_id("css-grid")
            .with_category("Frontend")
            .with_tags(["css"])
            .with_views(99),
        NewPost::new("Untagged thoughts")
            .with_id("untagged")
            .with_category("Life"),
    ]
}

pub async fn seed_posts(store: &dyn DocumentStore, posts: &[NewPost]) {
    for post in posts {
        let id = post.id.clone().expect("fixture posts carry ids");
        store
            .set_document(BLOG_POSTS, &id, post.to_fields().unwrap())
            .await
            .unwrap();
    }
}

pub async fn seeded_memory_store() -> Arc<MemoryDocumentStore> {
    let store = Arc::new(MemoryDocumentStore::new());
    seed_posts(store.as_ref(), &sample_posts()).await;
    store
}

pub fn repository(store: Arc<dyn DocumentStore>) -> PostRepository {
    PostRepository::new(store, BlogConfig::default())
}

pub fn service(store: Arc<dyn DocumentStore>) -> BlogService {
    BlogService::new(store, BlogConfig::default())
}

pub fn ids(posts: &[Post]) -> Vec<String> {
    posts.iter().map(|p| p.id.clone()).collect()
}

pub async fn stored_count(store: &dyn DocumentStore, id: &str, field: &str) -> u64 {
    let doc = store.get_by_id(BLOG_POSTS, id).await.unwrap().unwrap();
    doc.fields.get(field).and_then(|v| v.as_u64()).unwrap_or(0)
}

/// Poll until the detached view increment lands
pub async fn wait_for_views(store: &dyn DocumentStore, id: &str, expected: u64) -> u64 {
    let mut views = 0;
    for _ in 0..100 {
        views = stored_count(store, id, "views").await;
        if views >= expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    views
}

/// Store wrapper that counts calls and can be told to fail reads or increments
pub struct FaultyStore {
    inner: Arc<dyn DocumentStore>,
    pub fail_queries: AtomicBool,
    pub fail_increments: AtomicBool,
    pub fail_gets: AtomicBool,
    pub increments: AtomicUsize,
    pub queries: Mutex<Vec<DocumentQuery>>,
}

impl FaultyStore {
    pub fn new(inner: Arc<dyn DocumentStore>) -> Self {
        Self {
            inner,
            fail_queries: AtomicBool::new(false),
            fail_increments: AtomicBool::new(false),
            fail_gets: AtomicBool::new(false),
            increments: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn increment_calls(&self) -> usize {
        self.increments.load(Ordering::SeqCst)
    }

    pub fn recorded_queries(&self) -> Vec<DocumentQuery> {
        self.queries.lock().unwrap().clone()
    }
}

fn unavailable() -> AppError {
    AppError::StoreError("injected outage".to_string())
}

#[async_trait]
impl DocumentStore for FaultyStore {
    async fn get_by_id(&self, collection: &str, id: &str) -> AppResult<Option<Document>> {
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.get_by_id(collection, id).await
    }

    async fn query(&self, collection: &str, query: &DocumentQuery) -> AppResult<Vec<Document>> {
        self.queries.lock().unwrap().push(query.clone());
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.query(collection, query).await
    }

    async fn increment_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> AppResult<()> {
        self.increments.fetch_add(1, Ordering::SeqCst);
        if self.fail_increments.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.increment_field(collection, id, field, delta).await
    }

    async fn create_document(&self, collection: &str, fields: Fields) -> AppResult<DocumentId> {
        self.inner.create_document(collection, fields).await
    }

    async fn set_document(&self, collection: &str, id: &str, fields: Fields) -> AppResult<()> {
        self.inner.set_document(collection, id, fields).await
    }

    async fn health_check(&self) -> AppResult<()> {
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.health_check().await
    }
}

/// Store wrapper that holds back `get_by_id` for selected ids
pub struct DelayedStore {
    inner: Arc<dyn DocumentStore>,
    delays: HashMap<String, Duration>,
}

impl DelayedStore {
    pub fn new(inner: Arc<dyn DocumentStore>) -> Self {
        Self {
            inner,
            delays: HashMap::new(),
        }
    }

    pub fn delay(mut self, id: &str, by: Duration) -> Self {
        self.delays.insert(id.to_string(), by);
        self
    }
}

#[async_trait]
impl DocumentStore for DelayedStore {
    async fn get_by_id(&self, collection: &str, id: &str) -> AppResult<Option<Document>> {
        if let Some(by) = self.delays.get(id) {
            tokio::time::sleep(*by).await;
        }
        self.inner.get_by_id(collection, id).await
    }

    async fn query(&self, collection: &str, query: &DocumentQuery) -> AppResult<Vec<Document>> {
        self.inner.query(collection, query).await
    }

    async fn increment_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> AppResult<()> {
        self.inner.increment_field(collection, id, field, delta).await
    }

    async fn create_document(&self, collection: &str, fields: Fields) -> AppResult<DocumentId> {
        self.inner.create_document(collection, fields).await
    }

    async fn set_document(&self, collection: &str, id: &str, fields: Fields) -> AppResult<()> {
        self.inner.set_document(collection, id, fields).await
    }

    async fn health_check(&self) -> AppResult<()> {
        self.inner.health_check().await
    }
}
