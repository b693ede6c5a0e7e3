use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::coerce::{
    lenient_count, lenient_minutes, lenient_opt_string, lenient_series, lenient_string,
    lenient_string_list, lenient_timestamp,
};
use crate::error::{AppError, AppResult};
use crate::infrastructure::{Document, Fields};

pub const VIEWS_FIELD: &str = "views";
pub const LIKES_FIELD: &str = "likes";
pub const TAGS_FIELD: &str = "tags";
pub const SERIES_NAME_FIELD: &str = "series.name";
pub const SERIES_ORDER_FIELD: &str = "series.order";

/// Position of a post inside an author-defined series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesInfo {
    pub name: String,
    pub order: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Author {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub avatar: String,
}

/// One blog entry, validated and coerced from its stored document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub category: String,
    pub tags: Vec<String>,
    pub excerpt: String,
    pub content: String,
    pub image: String,
    pub thumbnail_alt: Option<String>,
    pub author: Author,
    pub date: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
    pub read_time: u32,
    pub views: u64,
    pub likes: u64,
    pub series: Option<SeriesInfo>,
}

/// Raw payload shape as stored in `blogPosts`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PostDocument {
    #[serde(deserialize_with = "lenient_opt_string")]
    title: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    category: String,
    #[serde(deserialize_with = "lenient_string_list")]
    tags: Vec<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    excerpt: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    description: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    content: String,
    #[serde(deserialize_with = "lenient_string")]
    image: String,
    #[serde(deserialize_with = "lenient_opt_string")]
    thumbnail_alt: Option<String>,
    #[serde(deserialize_with = "lenient_author")]
    author: Author,
    #[serde(deserialize_with = "lenient_timestamp")]
    date: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient_timestamp")]
    last_updated: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient_minutes")]
    read_time: u32,
    #[serde(deserialize_with = "lenient_count")]
    views: u64,
    #[serde(deserialize_with = "lenient_count")]
    likes: u64,
    #[serde(deserialize_with = "lenient_series")]
    series: Option<SeriesInfo>,
}

fn lenient_author<'de, D>(deserializer: D) -> Result<Author, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

impl Post {
    pub fn from_document(doc: Document) -> AppResult<Self> {
        let Document { id, fields } = doc;
        let raw: PostDocument = serde_json::from_value(Value::Object(fields)).map_err(|e| {
            AppError::InconsistentData(format!("Post {} could not be decoded: {}", id, e))
        })?;

        let title = raw
            .title
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::InconsistentData(format!("Post {} has no title", id)))?;

        Ok(Post {
            id,
            title,
            category: raw.category,
            tags: raw.tags,
            excerpt: raw.excerpt.or(raw.description).unwrap_or_default(),
            content: raw.content,
            image: raw.image,
            thumbnail_alt: raw.thumbnail_alt,
            author: raw.author,
            date: raw.date,
            last_updated: raw.last_updated,
            read_time: raw.read_time,
            views: raw.views,
            likes: raw.likes,
            series: raw.series,
        })
    }

    pub fn series_name(&self) -> Option<&str> {
        self.series.as_ref().map(|s| s.name.as_str())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Number of this post's tags that appear in `tags`
    pub fn tag_overlap(&self, tags: &[String]) -> usize {
        self.tags.iter().filter(|t| tags.contains(t)).count()
    }
}

/// Post content as authored out-of-band, ready to be written to the store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewPost {
    #[serde(skip_serializing)]
    pub id: Option<String>,
    pub title: String,
    pub category: String,
    pub tags: Vec<String>,
    pub excerpt: String,
    pub content: String,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_alt: Option<String>,
    pub author: Author,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    pub read_time: u32,
    pub views: u64,
    pub likes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<SeriesInfo>,
}

impl NewPost {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn in_series(mut self, name: impl Into<String>, order: i64) -> Self {
        self.series = Some(SeriesInfo {
            name: name.into(),
            order,
        });
        self
    }

    pub fn with_views(mut self, views: u64) -> Self {
        self.views = views;
        self
    }

    pub fn with_likes(mut self, likes: u64) -> Self {
        self.likes = likes;
        self
    }

    pub fn published_at(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    pub fn to_fields(&self) -> AppResult<Fields> {
        match serde_json::to_value(self)? {
            Value::Object(fields) => Ok(fields),
            other => Err(AppError::SerializationError(format!(
                "Post serialized to non-object value: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(id: &str, body: Value) -> Document {
        Document::new(id, body.as_object().cloned().unwrap())
    }

    #[test]
    fn test_full_document_decodes() {
        let doc = document(
            "abc123",
            json!({
                "title": "Hooks in depth",
                "category": "Frontend",
                "tags": ["react", "firebase"],
                "excerpt": "short",
                "content": "<p>body</p>",
                "image": "https://img/1.png",
                "author": {"name": "Kim", "avatar": "https://img/a.png"},
                "date": {"seconds": 1_700_000_000, "nanoseconds": 0},
                "readTime": 5,
                "views": 10,
                "likes": 2,
                "series": {"name": "Intro", "order": 2}
            }),
        );
        let post = Post::from_document(doc).unwrap();
        assert_eq!(post.id, "abc123");
        assert_eq!(post.tags, vec!["react", "firebase"]);
        assert_eq!(post.views, 10);
        assert_eq!(post.read_time, 5);
        assert_eq!(post.author.name, "Kim");
        assert_eq!(post.series_name(), Some("Intro"));
        assert!(post.date.is_some());
        assert!(post.last_updated.is_none());
    }

    #[test]
    fn test_missing_optional_fields_degrade() {
        let doc = document(
            "p",
            json!({
                "title": "Bare",
                "tags": null,
                "views": -4,
                "series": {"name": "Intro"},
                "author": "nobody",
                "description": "from description"
            }),
        );
        let post = Post::from_document(doc).unwrap();
        assert!(post.tags.is_empty());
        assert_eq!(post.views, 0);
        assert_eq!(post.likes, 0);
        assert!(post.series.is_none());
        assert_eq!(post.author, Author::default());
        assert_eq!(post.excerpt, "from description");
    }

    #[test]
    fn test_missing_title_is_inconsistent() {
        let doc = document("p", json!({"tags": ["x"]}));
        assert!(matches!(
            Post::from_document(doc),
            Err(AppError::InconsistentData(_))
        ));
    }

    #[test]
    fn test_new_post_fields_decode_back() {
        let fields = NewPost::new("Round")
            .with_id("ignored-in-body")
            .with_tags(["a", "b"])
            .in_series("S", 3)
            .with_views(7)
            .to_fields()
            .unwrap();
        assert!(!fields.contains_key("id"));

        let post = Post::from_document(Document::new("x", fields)).unwrap();
        assert_eq!(post.title, "Round");
        assert_eq!(post.tags, vec!["a", "b"]);
        assert_eq!(post.views, 7);
        assert_eq!(post.series, Some(SeriesInfo { name: "S".into(), order: 3 }));
    }
}
