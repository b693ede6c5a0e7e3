use std::sync::Arc;
use crate::{
    config::Config,
    infrastructure::{DocumentStore, SqliteDocumentStore},
    services::BlogService,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub blog: BlogService,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Initialize document store
        let store = SqliteDocumentStore::connect(
            &config.database.url,
            config.database.max_connections,
        )
        .await?;
        Ok(Self::with_store(Arc::new(store), config))
    }

    /// Build the state over an already opened store
    pub fn with_store(store: Arc<dyn DocumentStore>, config: Config) -> Self {
        let blog = BlogService::new(Arc::clone(&store), config.blog.clone());
        Self { store, blog, config }
    }
}
