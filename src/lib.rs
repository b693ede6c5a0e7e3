// Portfolio Content - content queries and engagement tracking for a portfolio blog

// Document store contract and its SQLite / in-memory implementations
pub mod infrastructure;

// Record shapes coerced from stored documents
pub mod models;

// Repositories, ranking, listing filters and per-viewer page state
pub mod services;

// HTTP surface
pub mod app_state;
pub mod blog_interface;

// Common utilities
pub mod config;
pub mod error;
pub mod data_seeder;

// Re-exports for convenience
pub use error::{AppError, AppResult};
