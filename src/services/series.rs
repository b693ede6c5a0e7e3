use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::AppError;
use crate::models::Post;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavDirection {
    Previous,
    Next,
}

impl FromStr for NavDirection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "previous" | "prev" => Ok(NavDirection::Previous),
            "next" => Ok(NavDirection::Next),
            _ => Err(AppError::Validation(format!("Unknown direction: {}", s))),
        }
    }
}

/// Posts of one series in ascending series order, plus where the viewed post sits
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesContext {
    pub name: Option<String>,
    pub posts: Vec<Post>,
    /// `None` when there is no series or the current post is missing from it
    pub position: Option<usize>,
}

fn series_order(post: &Post) -> i64 {
    post.series.as_ref().map(|s| s.order).unwrap_or(i64::MAX)
}

impl SeriesContext {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(name: impl Into<String>, mut posts: Vec<Post>, current_id: &str) -> Self {
        let name = name.into();
        posts.retain(|p| p.series_name() == Some(name.as_str()));
        posts.sort_by(|a, b| {
            series_order(a)
                .cmp(&series_order(b))
                .then_with(|| a.id.cmp(&b.id))
        });
        posts.dedup_by(|a, b| a.id == b.id);
        let position = posts.iter().position(|p| p.id == current_id);

        Self {
            name: Some(name),
            posts,
            position,
        }
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn has_previous(&self) -> bool {
        self.previous().is_some()
    }

    pub fn has_next(&self) -> bool {
        self.next().is_some()
    }

    pub fn previous(&self) -> Option<&Post> {
        let position = self.position?;
        if position > 0 {
            self.posts.get(position - 1)
        } else {
            None
        }
    }

    pub fn next(&self) -> Option<&Post> {
        let position = self.position?;
        self.posts.get(position + 1)
    }

    /// Target post id for a navigation request; disabled directions yield `None`
    pub fn navigate(&self, direction: NavDirection) -> Option<&str> {
        let target = match direction {
            NavDirection::Previous => self.previous(),
            NavDirection::Next => self.next(),
        };
        target.map(|p| p.id.as_str())
    }
}
