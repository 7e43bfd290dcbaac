use serde::Serialize;

/// Response payload for /ingest.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    /// Human-readable status line.
    pub message: String,
    /// Number of chunks written to the vector index.
    pub chunks_count: usize,
}
