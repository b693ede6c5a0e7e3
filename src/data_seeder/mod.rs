use crate::{
    error::{AppError, AppResult},
    infrastructure::{DocumentStore, Fields},
    models::{NewPost, BLOG_POSTS, PROJECTS, TEAM_PROJECTS},
};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// Seed file contents: either a bare array of posts or an object with
/// `posts`, `projects` and `teamProjects` arrays
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeedFile {
    pub posts: Vec<NewPost>,
    pub projects: Vec<Fields>,
    pub team_projects: Vec<Fields>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub posts: usize,
    pub projects: usize,
    pub team_projects: usize,
}

impl SeedFile {
    pub fn parse(raw: &str) -> AppResult<Self> {
        let value: Value = serde_json::from_str(raw)?;
        let seed = match value {
            Value::Array(_) => SeedFile {
                posts: serde_json::from_value(value)?,
                ..Default::default()
            },
            Value::Object(_) => serde_json::from_value(value)?,
            _ => {
                return Err(AppError::Validation(
                    "Seed file must hold an array of posts or an object".to_string(),
                ))
            }
        };
        Ok(seed)
    }
}

pub async fn seed_from_file(
    store: &dyn DocumentStore,
    path: impl AsRef<Path>,
) -> AppResult<SeedReport> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::ConfigurationError(format!("Cannot read seed file {}: {}", path.display(), e))
    })?;
    let report = seed(store, SeedFile::parse(&raw)?).await?;
    info!(
        path = %path.display(),
        posts = report.posts,
        projects = report.projects,
        team_projects = report.team_projects,
        "seed data loaded"
    );
    Ok(report)
}

/// Write every seed record; records carrying an `id` overwrite that document
pub async fn seed(store: &dyn DocumentStore, seed_file: SeedFile) -> AppResult<SeedReport> {
    let mut report = SeedReport::default();

    for post in &seed_file.posts {
        let fields = post.to_fields()?;
        match &post.id {
            Some(id) => store.set_document(BLOG_POSTS, id, fields).await?,
            None => {
                store.create_document(BLOG_POSTS, fields).await?;
            }
        }
        report.posts += 1;
    }

    for (collection, records, count) in [
        (PROJECTS, seed_file.projects, &mut report.projects),
        (TEAM_PROJECTS, seed_file.team_projects, &mut report.team_projects),
    ] {
        for mut fields in records {
            match fields.remove("id") {
                Some(Value::String(id)) if !id.is_empty() => {
                    store.set_document(collection, &id, fields).await?
                }
                _ => {
                    store.create_document(collection, fields).await?;
                }
            }
            *count += 1;
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::MemoryDocumentStore;
    use crate::models::Post;

    #[tokio::test]
    async fn test_seed_object_with_projects() {
        let raw = r#"{
            "posts": [
                {
                    "id": "abc123", "title": "Hello", "tags": ["rust"],
                    "series": {"name": "Intro", "order": 1}
                },
                {"title": "No id"}
            ],
            "projects": [{"id": "site", "title": "Portfolio"}],
            "teamProjects": [{"title": "Team", "technologies": ["rust"]}]
        }"#;
        let store = MemoryDocumentStore::new();
        let report = seed(&store, SeedFile::parse(raw).unwrap()).await.unwrap();

        assert_eq!(
            report,
            SeedReport {
                posts: 2,
                projects: 1,
                team_projects: 1
            }
        );
        assert_eq!(store.len(BLOG_POSTS).await, 2);
        let doc = store.get_by_id(BLOG_POSTS, "abc123").await.unwrap().unwrap();
        let post = Post::from_document(doc).unwrap();
        assert_eq!(post.series_name(), Some("Intro"));

        let project = store.get_by_id(PROJECTS, "site").await.unwrap().unwrap();
        assert!(!project.fields.contains_key("id"));
    }

    #[tokio::test]
    async fn test_seed_bare_array() {
        let seed_file = SeedFile::parse(r#"[{"title": "Only"}]"#).unwrap();
        assert_eq!(seed_file.posts.len(), 1);
        assert!(SeedFile::parse("42").is_err());
    }
}
