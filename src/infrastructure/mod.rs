// Storage infrastructure - document store contract and its implementations
pub mod document_store;        // Store trait, documents, queries
pub mod memory_store;          // In-process store for tests and demos
pub mod sqlite_store;          // Durable SQLite-backed store

pub use document_store::{
    Direction, Document, DocumentId, DocumentQuery, DocumentStore, Fields, Filter, OrderBy,
};
pub use memory_store::MemoryDocumentStore;
pub use sqlite_store::SqliteDocumentStore;
