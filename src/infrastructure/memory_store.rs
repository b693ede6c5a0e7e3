use async_trait::async_trait;
use serde_json::{Number, Value};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::infrastructure::document_store::{
    compare_values, counter_from_text, new_document_id, validate_field_path, Direction, Document,
    DocumentId, DocumentQuery, DocumentStore, Fields,
};

/// In-process document store with the same query semantics as the SQLite store
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, BTreeMap<DocumentId, Fields>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }
}

fn increment_in_place(fields: &mut Fields, path: &str, delta: i64) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let leaf = segments.pop().unwrap_or(path);

    let mut target = fields;
    for segment in segments {
        let entry = target
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Fields::new()));
        if !entry.is_object() {
            *entry = Value::Object(Fields::new());
        }
        target = match entry {
            Value::Object(map) => map,
            _ => return,
        };
    }

    let next = match target.get(leaf) {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(current) => Value::Number(Number::from(current.saturating_add(delta))),
            None => Number::from_f64(n.as_f64().unwrap_or(0.0) + delta as f64)
                .map(Value::Number)
                .unwrap_or(Value::Number(Number::from(delta))),
        },
        Some(Value::String(text)) => match counter_from_text(text) {
            Some(current) => Value::Number(Number::from(current.saturating_add(delta))),
            None => Value::Number(Number::from(delta)),
        },
        // Missing or non-numeric values are replaced by the delta
        _ => Value::Number(Number::from(delta)),
    };
    target.insert(leaf.to_string(), next);
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get_by_id(&self, collection: &str, id: &str) -> AppResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    async fn query(&self, collection: &str, query: &DocumentQuery) -> AppResult<Vec<Document>> {
        query.validate()?;
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut results: Vec<Document> = docs
            .iter()
            .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
            .filter(|doc| query.matches(doc))
            .collect();

        if let Some(order) = &query.order_by {
            results.retain(|doc| !matches!(doc.field(&order.field), None | Some(Value::Null)));
            results.sort_by(|a, b| {
                let by_field = compare_values(
                    a.field(&order.field).unwrap_or(&Value::Null),
                    b.field(&order.field).unwrap_or(&Value::Null),
                );
                let by_field = match order.direction {
                    Direction::Ascending => by_field,
                    Direction::Descending => by_field.reverse(),
                };
                by_field.then_with(|| a.id.cmp(&b.id))
            });
        }

        if let Some(limit) = query.limit {
            results.truncate(limit);
        }

        debug!(collection, matched = results.len(), "memory query");
        Ok(results)
    }

    async fn increment_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> AppResult<()> {
        validate_field_path(field)?;
        let mut collections = self.collections.write().await;
        let fields = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| AppError::NotFound(format!("{}/{}", collection, id)))?;
        increment_in_place(fields, field, delta);
        Ok(())
    }

    async fn create_document(&self, collection: &str, fields: Fields) -> AppResult<DocumentId> {
        let id = new_document_id();
        self.set_document(collection, &id, fields).await?;
        Ok(id)
    }

    async fn set_document(&self, collection: &str, id: &str, fields: Fields) -> AppResult<()> {
        if id.is_empty() {
            return Err(AppError::Validation("Document id must not be empty".to_string()));
        }
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
        Ok(())
    }

    async fn health_check(&self) -> AppResult<()> {
        Ok(())
    }
}
