use serde::{Deserialize, Serialize};

/// Caller-owned "already liked in this session" flag for one post.
///
/// Nothing is persisted per user: a second browser or session can like again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LikeGuard {
    liked: bool,
}

impl LikeGuard {
    pub fn new(liked: bool) -> Self {
        Self { liked }
    }

    pub fn is_set(&self) -> bool {
        self.liked
    }

    pub(crate) fn set(&mut self) {
        self.liked = true;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LikeStatus {
    /// The store confirmed the increment
    Recorded,
    /// Guard was already set; no mutation issued
    AlreadyLiked,
    /// The store rejected the increment; guard and count are unchanged
    Failed,
}

/// Result of a like attempt: the guard and count the caller should now display
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeOutcome {
    pub liked: LikeGuard,
    pub likes: u64,
    pub status: LikeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
