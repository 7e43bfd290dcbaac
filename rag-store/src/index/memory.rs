//! In-process vector index guarded by a tokio `RwLock`.
//!
//! Exact brute-force search. Ties keep insertion order.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::{CollectionStatus, IndexFuture, VectorIndex, prepare_points};
use crate::config::{CollectionSpec, DistanceKind};
use crate::embed::check_dimension;
use crate::errors::RagError;
use crate::record::{IndexedPoint, SearchHit};

struct StoredPoint {
    id: Uuid,
    vector: Vec<f32>,
    payload: Map<String, Value>,
}

struct Collection {
    spec: CollectionSpec,
    points: Vec<StoredPoint>,
    positions: HashMap<Uuid, usize>,
}

#[derive(Default)]
pub struct InMemoryIndex {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of points stored in `collection`.
    pub async fn count(&self, collection: &str) -> Result<usize, RagError> {
        let guard = self.collections.read().await;
        guard
            .get(collection)
            .map(|c| c.points.len())
            .ok_or_else(|| RagError::CollectionNotFound(collection.to_string()))
    }
}

fn score(distance: DistanceKind, a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    match distance {
        DistanceKind::Dot => dot,
        DistanceKind::Cosine => {
            let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
            let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
            if na == 0.0 || nb == 0.0 {
                0.0
            } else {
                dot / (na * nb)
            }
        }
    }
}

impl VectorIndex for InMemoryIndex {
    fn ensure_collection<'a>(
        &'a self,
        spec: &'a CollectionSpec,
    ) -> IndexFuture<'a, CollectionStatus> {
        Box::pin(async move {
            if spec.vector_size == 0 {
                return Err(RagError::Config("vector_size must be > 0".into()));
            }
            let mut guard = self.collections.write().await;
            if let Some(existing) = guard.get(&spec.name) {
                if existing.spec.vector_size != spec.vector_size {
                    return Err(RagError::VectorSizeMismatch {
                        got: spec.vector_size,
                        want: existing.spec.vector_size,
                    });
                }
                if existing.spec.distance != spec.distance {
                    return Err(RagError::Config(format!(
                        "collection '{}' uses {:?}, requested {:?}",
                        spec.name, existing.spec.distance, spec.distance
                    )));
                }
                debug!(collection = %spec.name, "collection already exists");
                return Ok(CollectionStatus::Existing);
            }
            guard.insert(
                spec.name.clone(),
                Collection {
                    spec: spec.clone(),
                    points: Vec::new(),
                    positions: HashMap::new(),
                },
            );
            info!(
                collection = %spec.name,
                size = spec.vector_size,
                distance = ?spec.distance,
                "collection created"
            );
            Ok(CollectionStatus::Created)
        })
    }

    fn upsert<'a>(
        &'a self,
        collection: &'a str,
        points: Vec<IndexedPoint>,
    ) -> IndexFuture<'a, Vec<Uuid>> {
        Box::pin(async move {
            let mut guard = self.collections.write().await;
            let coll = guard
                .get_mut(collection)
                .ok_or_else(|| RagError::CollectionNotFound(collection.to_string()))?;

            let prepared = prepare_points(points, coll.spec.vector_size)?;
            let mut ids = Vec::with_capacity(prepared.len());
            for (id, point) in prepared {
                let stored = StoredPoint {
                    id,
                    vector: point.vector,
                    payload: point.payload.to_map(),
                };
                match coll.positions.get(&id) {
                    Some(&pos) => coll.points[pos] = stored,
                    None => {
                        coll.positions.insert(id, coll.points.len());
                        coll.points.push(stored);
                    }
                }
                ids.push(id);
            }
            debug!(collection, upserted = ids.len(), total = coll.points.len(), "points upserted");
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
            let guard = self.collections.read().await;
            let coll = guard
                .get(collection)
                .ok_or_else(|| RagError::CollectionNotFound(collection.to_string()))?;
            check_dimension(vector, coll.spec.vector_size)?;

            let mut scored: Vec<(f32, &StoredPoint)> = coll
                .points
                .iter()
                .map(|p| (score(coll.spec.distance, vector, &p.vector), p))
                .collect();
            // Stable sort: equal scores stay in insertion order.
            scored.sort_by(|a, b| b.0.total_cmp(&a.0));
            scored.truncate(k);

            Ok(scored
                .into_iter()
                .map(|(score, p)| SearchHit {
                    id: p.id,
                    score,
                    payload: p.payload.clone(),
                })
                .collect())
        })
    }

    fn delete<'a>(&'a self, collection: &'a str, ids: &'a [Uuid]) -> IndexFuture<'a, ()> {
        Box::pin(async move {
            let mut guard = self.collections.write().await;
            let coll = guard
                .get_mut(collection)
                .ok_or_else(|| RagError::CollectionNotFound(collection.to_string()))?;

            let before = coll.points.len();
            coll.points.retain(|p| !ids.contains(&p.id));
            coll.positions = coll
                .points
                .iter()
                .enumerate()
                .map(|(pos, p)| (p.id, pos))
                .collect();
            debug!(collection, removed = before - coll.points.len(), "points deleted");
            Ok(())
        })
    }
}
