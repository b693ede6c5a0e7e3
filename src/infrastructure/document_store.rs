// Document Store Interface - schemaless collection/document access for the content services
// Repositories only ever see this trait; concrete stores live next to it.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::cmp::Ordering;

use crate::error::{AppError, AppResult};

/// Opaque identifier assigned by the store
pub type DocumentId = String;

/// Untyped document body as returned by the store
pub type Fields = Map<String, Value>;

static FIELD_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("field path pattern is valid")
});

/// A single stored document: identifier plus its raw fields
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<DocumentId>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Resolve a dotted field path such as `series.name`
    pub fn field(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.fields.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }
}

/// Query filters supported by every store implementation
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals the given value
    Eq { field: String, value: Value },
    /// Array field shares at least one member with `values`
    ArrayContainsAny { field: String, values: Vec<Value> },
    /// Document identifier differs from the given one
    IdNotEq(DocumentId),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn array_contains_any<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Filter::ArrayContainsAny {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn id_not_eq(id: impl Into<DocumentId>) -> Self {
        Filter::IdNotEq(id.into())
    }

    pub fn validate(&self) -> AppResult<()> {
        match self {
            Filter::Eq { field, .. } => validate_field_path(field),
            Filter::ArrayContainsAny { field, values } => {
                validate_field_path(field)?;
                if values.is_empty() {
                    return Err(AppError::Validation(format!(
                        "array-contains-any filter on '{}' needs at least one value",
                        field
                    )));
                }
                Ok(())
            }
            Filter::IdNotEq(_) => Ok(()),
        }
    }

    /// Evaluate the filter against a document in memory
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::Eq { field, value } => doc
                .field(field)
                .map(|actual| values_equal(actual, value))
                .unwrap_or(false),
            Filter::ArrayContainsAny { field, values } => match doc.field(field) {
                Some(Value::Array(members)) => members
                    .iter()
                    .any(|member| values.iter().any(|wanted| values_equal(member, wanted))),
                _ => false,
            },
            Filter::IdNotEq(id) => doc.id != *id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// Declarative collection query: filters are ANDed together
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentQuery {
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl DocumentQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn validate(&self) -> AppResult<()> {
        for filter in &self.filters {
            filter.validate()?;
        }
        if let Some(order) = &self.order_by {
            validate_field_path(&order.field)?;
        }
        Ok(())
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.filters.iter().all(|filter| filter.matches(doc))
    }
}

/// Document store contract consumed by the repositories
///
/// Documents without the `order_by` field are left out of ordered queries,
/// and ties are broken by document id so results are deterministic.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_by_id(&self, collection: &str, id: &str) -> AppResult<Option<Document>>;

    async fn query(&self, collection: &str, query: &DocumentQuery) -> AppResult<Vec<Document>>;

    /// Atomic server-side numeric increment; `NotFound` if the document is absent
    async fn increment_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> AppResult<()>;

    /// Insert a document under a freshly assigned identifier
    async fn create_document(&self, collection: &str, fields: Fields) -> AppResult<DocumentId>;

    /// Insert or overwrite a document under a known identifier
    async fn set_document(&self, collection: &str, id: &str, fields: Fields) -> AppResult<()>;

    async fn health_check(&self) -> AppResult<()>;
}

pub fn validate_field_path(path: &str) -> AppResult<()> {
    if FIELD_PATH.is_match(path) {
        Ok(())
    } else {
        Err(AppError::Validation(format!("Invalid field path: '{}'", path)))
    }
}

pub fn new_document_id() -> DocumentId {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Longest digit run read as a counter; longer text does not fit an `i64`
pub const MAX_COUNTER_DIGITS: usize = 18;

/// Counter stored as text: plain digits, optionally padded with spaces, tabs or newlines.
///
/// Anything else (signs, decimals, letters, empty) is not a counter.
pub fn counter_from_text(text: &str) -> Option<i64> {
    let digits = text.trim_matches(|c| matches!(c, ' ' | '\t' | '\n' | '\r'));
    if digits.is_empty()
        || digits.len() > MAX_COUNTER_DIGITS
        || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    digits.parse().ok()
}

/// Equality with numbers compared by value, so `2` matches `2.0`
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values used for in-memory sorting
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, body: Value) -> Document {
        Document::new(id, body.as_object().cloned().unwrap())
    }

    #[test]
    fn test_counter_text() {
        assert_eq!(counter_from_text("7"), Some(7));
        assert_eq!(counter_from_text(" 42\n"), Some(42));
        assert_eq!(counter_from_text("+7"), None);
        assert_eq!(counter_from_text("-1"), None);
        assert_eq!(counter_from_text("2.5"), None);
        assert_eq!(counter_from_text("abc"), None);
        assert_eq!(counter_from_text(""), None);
        assert_eq!(counter_from_text(&"9".repeat(19)), None);
    }

    #[test]
    fn test_nested_field_lookup() {
        let d = doc("a", json!({"series": {"name": "Intro", "order": 2}}));
        assert_eq!(d.field("series.name"), Some(&json!("Intro")));
        assert_eq!(d.field("series.order"), Some(&json!(2)));
        assert_eq!(d.field("series.missing"), None);
        assert_eq!(d.field("title"), None);
    }

    #[test]
    fn test_filter_matching() {
        let d = doc("a", json!({"tags": ["rust", "sqlite"], "views": 3}));
        assert!(Filter::array_contains_any("tags", ["go", "rust"]).matches(&d));
        assert!(!Filter::array_contains_any("tags", ["go"]).matches(&d));
        assert!(Filter::eq("views", 3.0).matches(&d));
        assert!(!Filter::id_not_eq("a").matches(&d));
        assert!(Filter::id_not_eq("b").matches(&d));
    }

    #[test]
    fn test_query_validation() {
        let bad_path = DocumentQuery::new().filter(Filter::eq("views; DROP", 1));
        assert!(matches!(bad_path.validate(), Err(AppError::Validation(_))));

        let empty_any = DocumentQuery::new()
            .filter(Filter::array_contains_any("tags", Vec::<String>::new()));
        assert!(matches!(empty_any.validate(), Err(AppError::Validation(_))));

        let ok = DocumentQuery::new()
            .filter(Filter::eq("series.name", "Intro"))
            .order_by("series.order", Direction::Ascending);
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_value_ordering() {
        assert_eq!(compare_values(&json!(1), &json!(2.5)), Ordering::Less);
        assert_eq!(compare_values(&json!("b"), &json!("a")), Ordering::Greater);
        assert_eq!(compare_values(&json!(null), &json!(0)), Ordering::Less);
    }
}
