//! Vector index abstraction with Qdrant and in-memory backends.

use std::{future::Future, pin::Pin};

use uuid::Uuid;

use crate::config::CollectionSpec;
use crate::embed::check_dimension;
use crate::errors::RagError;
use crate::record::{IndexedPoint, SearchHit};

pub mod memory;
pub mod qdrant;

/// Boxed future returned by index backends.
pub type IndexFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RagError>> + Send + 'a>>;

/// Outcome of [`VectorIndex::ensure_collection`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectionStatus {
    Created,
    Existing,
}

/// Storage of vectors with payloads, searchable by similarity.
///
/// Contract shared by all backends:
/// - `ensure_collection` never alters an existing schema; a dimension
///   conflict is [`RagError::VectorSizeMismatch`], a metric conflict
///   [`RagError::Config`].
/// - `upsert` validates every point before writing any of them and makes the
///   whole batch visible at once. Points without id receive a fresh UUID v4.
/// - `search` returns at most `k` hits in descending score order.
/// - `delete` ignores ids that are not stored.
pub trait VectorIndex: Send + Sync {
    fn ensure_collection<'a>(&'a self, spec: &'a CollectionSpec)
    -> IndexFuture<'a, CollectionStatus>;

    /// Returns the ids of the stored points in input order.
    fn upsert<'a>(
        &'a self,
        collection: &'a str,
        points: Vec<IndexedPoint>,
    ) -> IndexFuture<'a, Vec<Uuid>>;

    fn search<'a>(
        &'a self,
        collection: &'a str,
        vector: &'a [f32],
        k: usize,
    ) -> IndexFuture<'a, Vec<SearchHit>>;

    /// Removes points by id.
    fn delete<'a>(&'a self, collection: &'a str, ids: &'a [Uuid]) -> IndexFuture<'a, ()>;
}

/// Checks that every point matches `dim` and assigns missing ids.
pub(crate) fn prepare_points(
    points: Vec<IndexedPoint>,
    dim: usize,
) -> Result<Vec<(Uuid, IndexedPoint)>, RagError> {
    for p in &points {
        check_dimension(&p.vector, dim)?;
        if p.vector.iter().any(|x| !x.is_finite()) {
            return Err(RagError::InvalidInput("vector contains NaN or infinity".into()));
        }
    }
    Ok(points
        .into_iter()
        .map(|p| (p.id.unwrap_or_else(Uuid::new_v4), p))
        .collect())
}
