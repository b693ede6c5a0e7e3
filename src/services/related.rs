use serde::Serialize;

use crate::models::Post;

/// Related posts for a detail page, with a separate error flag for the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedPosts {
    pub posts: Vec<Post>,
    pub error: Option<String>,
}

impl RelatedPosts {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn loaded(posts: Vec<Post>) -> Self {
        Self { posts, error: None }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            posts: Vec::new(),
            error: Some(message.into()),
        }
    }
}

/// Drop empty and repeated tags, keeping first occurrence order.
///
/// Tags are compared exactly as stored, so surrounding whitespace is kept.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !tag.is_empty() && !out.contains(tag) {
            out.push(tag.clone());
        }
    }
    out
}

/// Rank candidates by (tag overlap desc, views desc, id) and keep at most `limit`.
///
/// The excluded id is always removed here, whatever the store already filtered.
pub fn rank_related(
    candidates: Vec<Post>,
    tags: &[String],
    exclude_id: &str,
    limit: usize,
) -> Vec<Post> {
    let mut ranked: Vec<(usize, Post)> = candidates
        .into_iter()
        .filter(|p| p.id != exclude_id)
        .map(|p| (p.tag_overlap(tags), p))
        .filter(|(overlap, _)| *overlap > 0)
        .collect();

    ranked.sort_by(|(overlap_a, a), (overlap_b, b)| {
        overlap_b
            .cmp(overlap_a)
            .then_with(|| b.views.cmp(&a.views))
            .then_with(|| a.id.cmp(&b.id))
    });
    ranked.dedup_by(|(_, a), (_, b)| a.id == b.id);
    ranked.truncate(limit);

    ranked.into_iter().map(|(_, p)| p).collect()
}
