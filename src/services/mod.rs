// Services - content queries, engagement and per-viewer page state
pub mod blog_service;
pub mod engagement;
pub mod listing;
pub mod post_repository;
pub mod post_view;
pub mod project_repository;
pub mod related;
pub mod series;

pub use blog_service::{BlogService, PostDetail, PostListing};
pub use engagement::{LikeGuard, LikeOutcome, LikeStatus};
pub use listing::{CategoryFilter, PostFilter};
pub use post_repository::PostRepository;
pub use post_view::{LoadState, PostView, PostViewState};
pub use project_repository::ProjectRepository;
pub use related::RelatedPosts;
pub use series::{NavDirection, SeriesContext};
