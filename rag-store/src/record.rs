//! Core data models used by the library.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Metadata key holding the origin label of a document.
pub const SOURCE_KEY: &str = "source";
/// Payload key holding the chunk text.
pub const CONTENT_KEY: &str = "content";
/// Label used when a stored point carries no source.
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// A unit of text plus metadata. Immutable once constructed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    content: String,
    #[serde(default)]
    metadata: BTreeMap<String, Value>,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(content: impl Into<String>, metadata: BTreeMap<String, Value>) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    /// The `source` metadata entry as a string, if present.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).and_then(Value::as_str)
    }
}

/// A chunk is a document derived from a larger one by the chunker.
pub type Chunk = Document;

/// Typed payload stored next to each vector.
///
/// Flattened into the index as `{content, source, ...extra}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointPayload {
    pub content: String,
    pub source: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl PointPayload {
    /// Builds the payload for a chunk; every metadata key except `source`
    /// lands in `extra`.
    pub fn from_chunk(chunk: &Chunk) -> Self {
        let source = chunk.source().unwrap_or(UNKNOWN_SOURCE).to_string();
        let extra = chunk
            .metadata()
            .iter()
            .filter(|(k, _)| k.as_str() != SOURCE_KEY && k.as_str() != CONTENT_KEY)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self {
            content: chunk.content().to_string(),
            source,
            extra,
        }
    }

    /// Flat JSON map; `content` and `source` win over same-named extra keys.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map: Map<String, Value> = self
            .extra
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        map.insert(CONTENT_KEY.into(), Value::String(self.content.clone()));
        map.insert(SOURCE_KEY.into(), Value::String(self.source.clone()));
        map
    }
}

/// A vector plus payload ready for upsert. `id` is assigned when absent.
#[derive(Clone, Debug)]
pub struct IndexedPoint {
    pub id: Option<Uuid>,
    pub vector: Vec<f32>,
    pub payload: PointPayload,
}

/// Raw search result as returned by an index.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchHit {
    pub id: Uuid,
    pub score: f32,
    pub payload: Map<String, Value>,
}

/// A retrieval result projected for prompting and API responses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetrievedContext {
    pub content: String,
    pub source: String,
    /// Higher means more relevant.
    pub score: f32,
}

impl From<SearchHit> for RetrievedContext {
    fn from(hit: SearchHit) -> Self {
        let content = hit
            .payload
            .get(CONTENT_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let source = hit
            .payload
            .get(SOURCE_KEY)
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_SOURCE)
            .to_string();
        Self {
            content,
            source,
            score: hit.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_keeps_required_fields_over_extras() {
        let mut meta = BTreeMap::new();
        meta.insert("source".to_string(), json!("errors.md"));
        meta.insert("page".to_string(), json!(3));
        meta.insert("content".to_string(), json!("stale"));
        let chunk = Chunk::with_metadata("Error 504 means gateway timeout", meta);

        let payload = PointPayload::from_chunk(&chunk);
        assert_eq!(payload.source, "errors.md");
        assert!(!payload.extra.contains_key("source"));

        let map = payload.to_map();
        assert_eq!(map["content"], json!("Error 504 means gateway timeout"));
        assert_eq!(map["page"], json!(3));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn projection_applies_defaults() {
        let hit = SearchHit {
            id: Uuid::new_v4(),
            score: 0.42,
            payload: Map::new(),
        };
        let ctx = RetrievedContext::from(hit);
        assert_eq!(ctx.content, "");
        assert_eq!(ctx.source, "Unknown");
        assert_eq!(ctx.score, 0.42);
    }
}
