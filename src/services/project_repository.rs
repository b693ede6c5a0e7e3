use std::sync::Arc;
use tracing::{instrument, warn};

use crate::error::AppResult;
use crate::infrastructure::{DocumentQuery, DocumentStore};
use crate::models::{Project, TeamProject, PROJECTS, TEAM_PROJECTS};

/// Read-only access to the portfolio project collections
#[derive(Clone)]
pub struct ProjectRepository {
    store: Arc<dyn DocumentStore>,
}

impl ProjectRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn list_projects(&self) -> AppResult<Vec<Project>> {
        let docs = self.store.query(PROJECTS, &DocumentQuery::new()).await?;
        Ok(docs
            .into_iter()
            .filter_map(|doc| {
                let id = doc.id.clone();
                Project::from_document(doc)
                    .map_err(|e| warn!(project_id = %id, error = %e, "skipping malformed project"))
                    .ok()
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn list_team_projects(&self) -> AppResult<Vec<TeamProject>> {
        let docs = self.store.query(TEAM_PROJECTS, &DocumentQuery::new()).await?;
        Ok(docs
            .into_iter()
            .filter_map(|doc| {
                let id = doc.id.clone();
                TeamProject::from_document(doc)
                    .map_err(|e| {
                        warn!(project_id = %id, error = %e, "skipping malformed team project")
                    })
                    .ok()
            })
            .collect())
    }
}
