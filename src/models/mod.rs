// Record shapes for the content collections, coerced at the store boundary
pub mod coerce;
pub mod post;
pub mod project;

pub use post::{Author, NewPost, Post, SeriesInfo};
pub use project::{Project, TeamProject};

/// Collection holding blog posts
pub const BLOG_POSTS: &str = "blogPosts";
/// Collection holding personal projects
pub const PROJECTS: &str = "projects";
/// Collection holding team projects
pub const TEAM_PROJECTS: &str = "teamProjects";
