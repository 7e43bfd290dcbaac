//! Thin adapter around `qdrant-client` to isolate API usage.
//!
//! This facade concentrates all Qdrant interactions behind [`VectorIndex`],
//! hiding away the verbose builder pattern and keeping the rest of the
//! application decoupled from `qdrant-client`.

use std::collections::HashMap;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, DeletePointsBuilder, Distance, ListValue, PointId, PointStruct,
    PointsIdsList, SearchParamsBuilder, SearchPointsBuilder, Struct, UpsertPointsBuilder,
    Value as QValue, VectorParamsBuilder, point_id::PointIdOptions, value::Kind, vectors_config,
};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{CollectionStatus, IndexFuture, VectorIndex, prepare_points};
use crate::config::{CollectionSpec, DistanceKind, RagConfig};
use crate::errors::RagError;
use crate::record::{IndexedPoint, SearchHit};

/// Qdrant-backed [`VectorIndex`].
pub struct QdrantIndex {
    client: Qdrant,
    exact: bool,
}

fn qerr(e: impl std::fmt::Display) -> RagError {
    RagError::Qdrant(e.to_string())
}

impl QdrantIndex {
    /// Creates a new client from the given configuration.
    ///
    /// Uses the builder-based API of `qdrant-client` and supports optional
    /// API key authentication. No request is sent until the first call.
    pub fn new(cfg: &RagConfig) -> Result<Self, RagError> {
        cfg.validate()?;

        let mut builder = Qdrant::from_url(&cfg.qdrant_url);
        if let Some(key) = &cfg.qdrant_api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder.build().map_err(qerr)?;

        info!(url = %cfg.qdrant_url, exact = cfg.exact_search, "qdrant client ready");
        Ok(Self {
            client,
            exact: cfg.exact_search,
        })
    }

    /// Reads the vector schema of an existing collection, `None` if absent.
    async fn existing_spec(&self, name: &str) -> Result<Option<CollectionSpec>, RagError> {
        if !self.client.collection_exists(name).await.map_err(qerr)? {
            return Ok(None);
        }
        let info = self.client.collection_info(name).await.map_err(qerr)?;
        let params = info
            .result
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config);

        match params {
            Some(vectors_config::Config::Params(p)) => {
                let distance = match p.distance() {
                    Distance::Cosine => DistanceKind::Cosine,
                    Distance::Dot => DistanceKind::Dot,
                    other => {
                        return Err(RagError::Config(format!(
                            "collection '{name}' uses unsupported distance {other:?}"
                        )));
                    }
                };
                Ok(Some(CollectionSpec {
                    name: name.to_string(),
                    vector_size: p.size as usize,
                    distance,
                }))
            }
            _ => Err(RagError::Config(format!(
                "collection '{name}' has no single unnamed vector configuration"
            ))),
        }
    }
}

impl VectorIndex for QdrantIndex {
    fn ensure_collection<'a>(
        &'a self,
        spec: &'a CollectionSpec,
    ) -> IndexFuture<'a, CollectionStatus> {
        Box::pin(async move {
            info!(
                "Ensuring collection '{}' with size={} distance={:?}",
                spec.name, spec.vector_size, spec.distance
            );

            if let Some(existing) = self.existing_spec(&spec.name).await? {
                if existing.vector_size != spec.vector_size {
                    return Err(RagError::VectorSizeMismatch {
                        got: spec.vector_size,
                        want: existing.vector_size,
                    });
                }
                if existing.distance != spec.distance {
                    return Err(RagError::Config(format!(
                        "collection '{}' uses {:?}, requested {:?}",
                        spec.name, existing.distance, spec.distance
                    )));
                }
                debug!("Collection '{}' already exists", spec.name);
                return Ok(CollectionStatus::Existing);
            }

            let distance = match spec.distance {
                DistanceKind::Cosine => Distance::Cosine,
                DistanceKind::Dot => Distance::Dot,
            };
            let created = self
                .client
                .create_collection(
                    CreateCollectionBuilder::new(&spec.name).vectors_config(
                        VectorParamsBuilder::new(spec.vector_size as u64, distance),
                    ),
                )
                .await;

            match created {
                Ok(_) => {
                    info!("Collection '{}' created successfully", spec.name);
                    Ok(CollectionStatus::Created)
                }
                Err(e) => {
                    // Another process may have created it between the check and the call.
                    warn!("Create collection '{}' failed ({e}); re-checking", spec.name);
                    match self.existing_spec(&spec.name).await? {
                        Some(existing) if existing == *spec => Ok(CollectionStatus::Existing),
                        _ => Err(qerr(e)),
                    }
                }
            }
        })
    }

    fn upsert<'a>(
        &'a self,
        collection: &'a str,
        points: Vec<IndexedPoint>,
    ) -> IndexFuture<'a, Vec<Uuid>> {
        Box::pin(async move {
            if points.is_empty() {
                debug!("No points provided for upsert");
                return Ok(Vec::new());
            }
            let spec = self
                .existing_spec(collection)
                .await?
                .ok_or_else(|| RagError::CollectionNotFound(collection.to_string()))?;
            let prepared = prepare_points(points, spec.vector_size)?;

            let mut ids = Vec::with_capacity(prepared.len());
            let structs: Vec<PointStruct> = prepared
                .into_iter()
                .map(|(id, p)| {
                    ids.push(id);
                    let payload: HashMap<String, QValue> = p
                        .payload
                        .to_map()
                        .into_iter()
                        .map(|(k, v)| (k, json_to_qvalue(v)))
                        .collect();
                    PointStruct::new(id.to_string(), p.vector, payload)
                })
                .collect();

            info!(
                "Upserting {} points into collection '{}'",
                structs.len(),
                collection
            );
            let res = self
                .client
                .upsert_points(UpsertPointsBuilder::new(collection, structs).wait(true))
                .await
                .map_err(qerr)?;
            debug!("Upsert operation result={:?}", res.result);
            Ok(ids)
        })
    }

    fn search<'a>(
        &'a self,
        collection: &'a str,
        vector: &'a [f32],
        k: usize,
    ) -> IndexFuture<'a, Vec<SearchHit>> {
        Box::pin(async move {
            if k == 0 {
                return Ok(Vec::new());
            }
            debug!(
                "Searching in '{}' with top_k={}, exact={}",
                collection, k, self.exact
            );

            let mut builder =
                SearchPointsBuilder::new(collection, vector.to_vec(), k as u64).with_payload(true);
            if self.exact {
                builder = builder.params(SearchParamsBuilder::default().exact(true));
            }
            let res = self.client.search_points(builder).await.map_err(qerr)?;

            let mut out = Vec::with_capacity(res.result.len());
            for r in res.result {
                let id = match r.id.and_then(|p| p.point_id_options) {
                    Some(PointIdOptions::Uuid(s)) => Uuid::parse_str(&s).map_err(qerr)?,
                    Some(PointIdOptions::Num(n)) => Uuid::from_u64_pair(0, n),
                    None => Uuid::nil(),
                };
                out.push(SearchHit {
                    id,
                    score: r.score,
                    payload: qpayload_to_json(r.payload),
                });
            }
            // Qdrant orders by score already; keep ties stable for callers.
            out.sort_by(|a, b| b.score.total_cmp(&a.score));

            debug!("Search completed: {} hits returned", out.len());
            Ok(out)
        })
    }
    fn delete<'a>(&'a self, collection: &'a str, ids: &'a [Uuid]) -> IndexFuture<'a, ()> {
        Box::pin(async move {
            if ids.is_empty() {
                return Ok(());
            }
            let ids: Vec<PointId> = ids.iter().map(|id| PointId::from(id.to_string())).collect();
            debug!("Deleting {} points from collection '{}'", ids.len(), collection);
            self.client
                .delete_points(
                    DeletePointsBuilder::new(collection)
                        .points(PointsIdsList { ids })
                        .wait(true),
                )
                .await
                .map_err(qerr)?;
            Ok(())
        })
    }
}

/// Converts a Qdrant payload (`HashMap<String, qdrant::Value>`) into a JSON map.
fn qpayload_to_json(p: HashMap<String, QValue>) -> Map<String, Value> {
    p.into_iter().map(|(k, v)| (k, qvalue_to_json(v))).collect()
}

fn qvalue_to_json(v: QValue) -> Value {
    match v.kind {
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::IntegerValue(i)) => Value::Number(i.into()),
        Some(Kind::DoubleValue(f)) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::ListValue(l)) => {
            Value::Array(l.values.into_iter().map(qvalue_to_json).collect())
        }
        Some(Kind::StructValue(s)) => Value::Object(
            s.fields
                .into_iter()
                .map(|(k, v)| (k, qvalue_to_json(v)))
                .collect(),
        ),
        Some(Kind::NullValue(_)) | None => Value::Null,
    }
}

/// Converts `serde_json::Value` into Qdrant `Value` (handles arrays/objects).
fn json_to_qvalue(v: Value) -> QValue {
    let kind = match v {
        Value::String(s) => Some(Kind::StringValue(s)),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Some(Kind::IntegerValue(i)),
            (None, Some(f)) => Some(Kind::DoubleValue(f)),
            _ => Some(Kind::StringValue(n.to_string())),
        },
        Value::Bool(b) => Some(Kind::BoolValue(b)),
        Value::Array(arr) => Some(Kind::ListValue(ListValue {
            values: arr.into_iter().map(json_to_qvalue).collect(),
        })),
        Value::Object(map) => Some(Kind::StructValue(Struct {
            fields: map.into_iter().map(|(k, v)| (k, json_to_qvalue(v))).collect(),
        })),
        Value::Null => None,
    };
    QValue { kind }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_survives_qdrant_value_conversion() {
        let original = json!({
            "content": "Error 504",
            "source": "errors.pdf",
            "page": 3,
            "score_hint": 0.5,
            "tags": ["http", "gateway"],
            "nested": { "ok": true },
            "missing": null
        });
        let Value::Object(map) = original.clone() else {
            unreachable!()
        };
        let q: HashMap<String, QValue> =
            map.into_iter().map(|(k, v)| (k, json_to_qvalue(v))).collect();
        assert_eq!(Value::Object(qpayload_to_json(q)), original);
    }

    #[test]
    fn client_builds_without_connecting() {
        let cfg = RagConfig::new_default("http://localhost:6334", "enterprise_rag");
        assert!(QdrantIndex::new(&cfg).is_ok());
    }
}
