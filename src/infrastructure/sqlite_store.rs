use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::Value;
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Row};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::infrastructure::document_store::{
    new_document_id, validate_field_path, Direction, Document, DocumentId, DocumentQuery,
    DocumentStore, Fields, Filter, MAX_COUNTER_DIGITS,
};

/// SQLite implementation of the document store: one JSON document per row
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

fn json_path(field: &str) -> String {
    format!("$.{}", field)
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn push_value(qb: &mut QueryBuilder<'_, Sqlite>, value: &Value) {
    match value {
        Value::Bool(b) => qb.push_bind(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => qb.push_bind(i),
            None => qb.push_bind(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => qb.push_bind(s.clone()),
        other => qb.push_bind(other.to_string()),
    };
}

/// Numbers are added to; digit-only text is read with the same rule as
/// `counter_from_text`; everything else (missing, null, bool, other text) becomes the delta.
static INCREMENT_SQL: Lazy<String> = Lazy::new(|| {
    let text = "trim(json_extract(data, ?1), ' ' || char(9, 10, 13))";
    format!(
        "UPDATE documents SET data = json_set(data, ?1, \
           CASE json_type(data, ?1) \
             WHEN 'integer' THEN json_extract(data, ?1) + ?2 \
             WHEN 'real' THEN json_extract(data, ?1) + ?2 \
             WHEN 'text' THEN CASE \
               WHEN length({text}) BETWEEN 1 AND {max} AND {text} NOT GLOB '*[^0-9]*' \
               THEN CAST({text} AS INTEGER) + ?2 \
               ELSE ?2 END \
             ELSE ?2 END), \
         time_updated = ?3 \
         WHERE collection = ?4 AND id = ?5",
        text = text,
        max = MAX_COUNTER_DIGITS,
    )
});

fn decode_fields(id: &str, data: &str) -> AppResult<Fields> {
    serde_json::from_str::<Fields>(data).map_err(|e| {
        AppError::InconsistentData(format!("Document {} holds invalid JSON: {}", id, e))
    })
}

impl SqliteDocumentStore {
    /// Open (or create) the store behind `url`, e.g. `sqlite:data/content.db`
    pub async fn connect(url: &str, max_connections: u32) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| {
                AppError::ConfigurationError(format!("Invalid database url {}: {}", url, e))
            })?
            .create_if_missing(true);

        // Every connection to an in-memory database sees its own database,
        // so those pools are pinned to a single long-lived connection.
        let in_memory = url.contains(":memory:");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| AppError::StoreError(format!("Failed to connect to {}: {}", url, e)))?;

        let store = Self { pool };
        store.initialize().await?;
        info!(url, "document store ready");
        Ok(store)
    }

    pub async fn new_in_memory() -> AppResult<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    /// Create the documents table if it does not exist yet
    pub async fn initialize(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                data TEXT NOT NULL,
                time_created INTEGER NOT NULL,
                time_updated INTEGER NOT NULL,
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::StoreError(format!("Failed to create documents table: {}", e)))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection)")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::StoreError(format!("Failed to create collection index: {}", e))
            })?;

        Ok(())
    }

    fn build_query<'a>(collection: &str, query: &DocumentQuery) -> QueryBuilder<'a, Sqlite> {
        let mut qb =
            QueryBuilder::<Sqlite>::new("SELECT id, data FROM documents WHERE collection = ");
        qb.push_bind(collection.to_string());

        for filter in &query.filters {
            match filter {
                Filter::Eq { field, value } => {
                    let path = json_path(field);
                    if value.is_null() {
                        qb.push(format!(" AND json_extract(data, '{}') IS NULL", path));
                    } else {
                        qb.push(format!(" AND json_extract(data, '{}') = ", path));
                        push_value(&mut qb, value);
                    }
                }
                Filter::ArrayContainsAny { field, values } => {
                    let path = json_path(field);
                    qb.push(format!(
                        " AND json_type(documents.data, '{path}') = 'array' \
                         AND EXISTS (SELECT 1 FROM json_each(documents.data, '{path}') \
                         WHERE json_each.value IN ("
                    ));
                    for (i, value) in values.iter().enumerate() {
                        if i > 0 {
                            qb.push(", ");
                        }
                        push_value(&mut qb, value);
                    }
                    qb.push("))");
                }
                Filter::IdNotEq(id) => {
                    qb.push(" AND id != ");
                    qb.push_bind(id.clone());
                }
            }
        }

        match &query.order_by {
            Some(order) => {
                let path = json_path(&order.field);
                let direction = match order.direction {
                    Direction::Ascending => "ASC",
                    Direction::Descending => "DESC",
                };
                qb.push(format!(
                    " AND json_extract(data, '{path}') IS NOT NULL \
                     ORDER BY json_extract(data, '{path}') {direction}, id ASC"
                ));
            }
            None => {
                qb.push(" ORDER BY id ASC");
            }
        }

        if let Some(limit) = query.limit {
            qb.push(" LIMIT ");
            qb.push_bind(limit as i64);
        }

        qb
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get_by_id(&self, collection: &str, id: &str) -> AppResult<Option<Document>> {
        let row = sqlx::query("SELECT id, data FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::StoreError(format!("Failed to get {}/{}: {}", collection, id, e))
            })?;

        match row {
            Some(row) => {
                let id: String = row.try_get("id")?;
                let data: String = row.try_get("data")?;
                let fields = decode_fields(&id, &data)?;
                Ok(Some(Document::new(id, fields)))
            }
            None => Ok(None),
        }
    }

    async fn query(&self, collection: &str, query: &DocumentQuery) -> AppResult<Vec<Document>> {
        query.validate()?;
        let mut qb = Self::build_query(collection, query);
        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::StoreError(format!("Failed to query {}: {}", collection, e)))?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id")?;
            let data: String = row.try_get("data")?;
            let fields = decode_fields(&id, &data)?;
            documents.push(Document::new(id, fields));
        }

        debug!(collection, matched = documents.len(), "sqlite query");
        Ok(documents)
    }

    async fn increment_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> AppResult<()> {
        validate_field_path(field)?;
        let path = json_path(field);
        let result = sqlx::query(INCREMENT_SQL.as_str())
            .bind(path)
            .bind(delta)
            .bind(now_millis())
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::StoreError(format!(
                    "Failed to increment {} on {}/{}: {}",
                    field, collection, id, e
                ))
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("{}/{}", collection, id)));
        }
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
        let data = serde_json::to_string(&Value::Object(fields))?;
        let now = now_millis();
        sqlx::query(
            "INSERT INTO documents (collection, id, data, time_created, time_updated) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(collection, id) DO UPDATE \
             SET data = excluded.data, time_updated = excluded.time_updated",
        )
        .bind(collection)
        .bind(id)
        .bind(data)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::StoreError(format!("Failed to write {}/{}: {}", collection, id, e))
        })?;
        Ok(())
    }

    async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::ServiceUnavailable(format!("Store health check failed: {}", e))
            })?;
        Ok(())
    }
}
