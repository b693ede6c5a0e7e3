// Listing filters - pure in-memory selection over an already fetched post list

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::models::Post;

/// Category toggle of the listing view
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "name")]
pub enum CategoryFilter {
    #[default]
    All,
    /// Posts that belong to any series
    Series,
    Category(String),
}

impl CategoryFilter {
    /// `None`, empty and `all` select everything; `series` selects series posts
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => CategoryFilter::All,
            Some(v) if v.eq_ignore_ascii_case("all") => CategoryFilter::All,
            Some(v) if v.eq_ignore_ascii_case("series") => CategoryFilter::Series,
            Some(v) => CategoryFilter::Category(v.to_string()),
        }
    }

    pub fn matches(&self, post: &Post) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Series => post.series.is_some(),
            CategoryFilter::Category(name) => post.category == *name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFilter {
    pub category: CategoryFilter,
    pub tag: Option<String>,
}

impl PostFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: CategoryFilter) -> Self {
        self.category = category;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        self.tag = if tag.is_empty() { None } else { Some(tag) };
        self
    }

    pub fn matches_tag(&self, post: &Post) -> bool {
        match &self.tag {
            Some(tag) => post.has_tag(tag),
            None => true,
        }
    }

    pub fn matches(&self, post: &Post) -> bool {
        self.category.matches(post) && self.matches_tag(post)
    }
}

pub fn filter_by_category(posts: &[Post], category: &CategoryFilter) -> Vec<Post> {
    posts.iter().filter(|p| category.matches(p)).cloned().collect()
}

pub fn filter_by_tag(posts: &[Post], tag: Option<&str>) -> Vec<Post> {
    match tag {
        Some(tag) => posts.iter().filter(|p| p.has_tag(tag)).cloned().collect(),
        None => posts.to_vec(),
    }
}

/// Apply both toggles; input order is preserved
pub fn filter_posts(posts: &[Post], filter: &PostFilter) -> Vec<Post> {
    posts.iter().filter(|p| filter.matches(p)).cloned().collect()
}

/// Distinct non-empty categories, sorted
pub fn categories(posts: &[Post]) -> Vec<String> {
    posts
        .iter()
        .map(|p| p.category.clone())
        .filter(|c| !c.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct tags across all posts, sorted
pub fn tags(posts: &[Post]) -> Vec<String> {
    posts
        .iter()
        .flat_map(|p| p.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Newest first; undated posts go last, ties broken by id
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| {
        let by_date = match (&a.date, &b.date) {
            (Some(x), Some(y)) => y.cmp(x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_date.then_with(|| a.id.cmp(&b.id))
    });
}
