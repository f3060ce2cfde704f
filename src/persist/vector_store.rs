//! Vector store sink: pushes embedded Q/A pairs to a Qdrant-compatible HTTP
//! collection for later semantic retrieval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PersistError, Result};

/// Current payload schema version, bumped whenever the payload shape changes.
pub const SCHEMA_VERSION: u32 = 1;

/// Per-point metadata stored alongside its vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointPayload {
    /// Dataset tag the pair was synthesized under.
    pub domain: String,
    /// The pair's question.
    pub question: String,
    /// The pair's answer.
    pub answer: String,
    /// Source chunk id the pair was synthesized from.
    pub source: String,
    /// UTC timestamp the point was written, ISO-8601.
    pub created_at: DateTime<Utc>,
    /// [`SCHEMA_VERSION`] at write time.
    pub schema_version: u32,
}

/// One upsertable vector-store point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Point {
    /// Deterministic 63-bit id, see [`point_id`].
    pub id: u64,
    /// The embedding vector.
    pub vector: Vec<f32>,
    /// Metadata carried alongside the vector.
    pub payload: PointPayload,
}

/// Derives a deterministic, non-negative 63-bit point id from `domain`,
/// `source`, and `row_index`, so re-ingesting the same Q/A CSV produces the
/// same ids on every run regardless of process or machine.
///
/// Uses a fixed-seed hash rather than `std`'s `RandomState`-seeded
/// `DefaultHasher`, which is randomized per process and would not be
/// reproducible across runs.
#[must_use]
pub fn point_id(domain: &str, source: &str, row_index: usize) -> u64 {
    fnv1a_64(domain, source, row_index) & 0x7FFF_FFFF_FFFF_FFFF
}

/// FNV-1a over the concatenation of the three fields, each terminated with a
/// byte not valid in UTF-8 so that `(domain="a", source="bc")` and
/// `(domain="ab", source="c")` cannot collide on the separator.
fn fnv1a_64(domain: &str, source: &str, row_index: usize) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01B3;
    const SEPARATOR: u8 = 0xFF;

    let mut hash = OFFSET_BASIS;
    for byte in domain
        .as_bytes()
        .iter()
        .chain(std::iter::once(&SEPARATOR))
        .chain(source.as_bytes())
        .chain(std::iter::once(&SEPARATOR))
        .chain(row_index.to_le_bytes().iter())
    {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// Builds a point from a synthesized pair's fields and its embedding vector.
#[must_use]
pub fn build_point(
    domain: &str,
    question: &str,
    answer: &str,
    source: &str,
    row_index: usize,
    vector: Vec<f32>,
    created_at: DateTime<Utc>,
) -> Point {
    Point {
        id: point_id(domain, source, row_index),
        vector,
        payload: PointPayload {
            domain: domain.to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
            source: source.to_string(),
            created_at,
            schema_version: SCHEMA_VERSION,
        },
    }
}

/// Distance metric used for a collection. Cosine is the only metric this
/// system creates collections with, since embeddings are compared by cosine
/// similarity everywhere else in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Distance {
    /// Cosine similarity.
    Cosine,
}

#[derive(Debug, Serialize)]
struct VectorParams {
    size: usize,
    distance: Distance,
}

#[derive(Debug, Serialize)]
struct CreateCollectionRequest {
    vectors: VectorParams,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    points: &'a [Point],
}

/// Thin HTTP client over a Qdrant-compatible REST API.
pub struct QdrantVectorStore {
    http: reqwest::Client,
    base_url: String,
}

impl QdrantVectorStore {
    /// Builds a client against `base_url` (e.g. `http://localhost:6333`).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Drops `collection` if it exists and recreates it with `dimensions`
    /// and cosine distance.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::VectorStoreWriteFailed`] if either request
    /// fails or returns a non-success status.
    pub async fn recreate_collection(&self, collection: &str, dimensions: usize) -> Result<()> {
        let url = format!("{}/collections/{collection}", self.base_url);

        let delete = self.http.delete(&url).send().await;
        if let Ok(response) = delete {
            if !response.status().is_success() && response.status().as_u16() != 404 {
                return Err(store_error(format!(
                    "delete collection {collection} returned {}",
                    response.status()
                )));
            }
        }

        let body = CreateCollectionRequest {
            vectors: VectorParams {
                size: dimensions,
                distance: Distance::Cosine,
            },
        };
        let response = self.http.put(&url).json(&body).send().await.map_err(|e| store_error(e.to_string()))?;
        if !response.status().is_success() {
            return Err(store_error(format!(
                "create collection {collection} returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    /// Upserts `points` into `collection` in a single request, indexed on
    /// the `domain` payload field for per-dataset filtering.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::VectorStoreWriteFailed`] if the request fails
    /// or the server rejects it.
    pub async fn upsert_batch(&self, collection: &str, points: &[Point]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        let url = format!("{}/collections/{collection}/points?wait=true", self.base_url);
        let body = UpsertRequest { points };
        let response = self.http.put(&url).json(&body).send().await.map_err(|e| store_error(e.to_string()))?;
        if !response.status().is_success() {
            return Err(store_error(format!("upsert into {collection} returned {}", response.status())));
        }
        Ok(())
    }

    /// Creates a payload index on the `domain` field, used to scope searches
    /// and deletions to a single dataset.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::VectorStoreWriteFailed`] if the request fails
    /// or the server rejects it.
    pub async fn index_domain_field(&self, collection: &str) -> Result<()> {
        let url = format!("{}/collections/{collection}/index", self.base_url);
        let body = serde_json::json!({
            "field_name": "domain",
            "field_schema": "keyword",
        });
        let response = self.http.put(&url).json(&body).send().await.map_err(|e| store_error(e.to_string()))?;
        if !response.status().is_success() {
            return Err(store_error(format!("index domain field on {collection} returned {}", response.status())));
        }
        Ok(())
    }
}

fn store_error(message: String) -> crate::error::Error {
    PersistError::VectorStoreWriteFailed(message).into()
}
