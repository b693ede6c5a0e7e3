use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::coerce::{lenient_opt_string, lenient_string, lenient_string_list};
use crate::error::{AppError, AppResult};
use crate::infrastructure::Document;

/// Personal project card shown on the portfolio page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    #[serde(skip_deserializing)]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(deserialize_with = "lenient_string")]
    pub image: String,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub project_url: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub repo_url: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub role: Option<String>,
}

/// Team project: a project card plus list-valued details
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamProject {
    #[serde(flatten)]
    pub project: Project,
    #[serde(deserialize_with = "lenient_string_list")]
    pub technologies: Vec<String>,
    #[serde(deserialize_with = "lenient_string_list")]
    pub features: Vec<String>,
    #[serde(deserialize_with = "lenient_string_list")]
    pub additional_images: Vec<String>,
}

impl Project {
    pub fn from_document(doc: Document) -> AppResult<Self> {
        let Document { id, fields } = doc;
        let mut project: Project = serde_json::from_value(Value::Object(fields)).map_err(|e| {
            AppError::InconsistentData(format!("Project {} could not be decoded: {}", id, e))
        })?;
        project.id = id;
        Ok(project)
    }
}

impl TeamProject {
    pub fn from_document(doc: Document) -> AppResult<Self> {
        let Document { id, fields } = doc;
        let mut team: TeamProject = serde_json::from_value(Value::Object(fields)).map_err(|e| {
            AppError::InconsistentData(format!("Team project {} could not be decoded: {}", id, e))
        })?;
        team.project.id = id;
        Ok(team)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_team_project_lists_are_coerced() {
        let doc = Document::new(
            "t1",
            json!({
                "title": "Shop",
                "repoUrl": "https://git/shop",
                "technologies": ["rust", 3, "axum"],
                "features": "not a list"
            })
            .as_object()
            .cloned()
            .unwrap(),
        );
        let team = TeamProject::from_document(doc).unwrap();
        assert_eq!(team.project.id, "t1");
        assert_eq!(team.project.title, "Shop");
        assert_eq!(team.project.repo_url.as_deref(), Some("https://git/shop"));
        assert_eq!(team.technologies, vec!["rust", "axum"]);
        assert!(team.features.is_empty());
        assert!(team.additional_images.is_empty());
    }
}
