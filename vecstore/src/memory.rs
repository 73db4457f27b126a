use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use crate::error::VecError;
use crate::store::{Neighbor, VectorStore, closest};

/// In-memory [`VectorStore`] using brute-force distance computation.
///
/// Vectors are grouped per organization and visited in ascending id order,
/// which makes tie-breaking deterministic.
pub struct MemoryVectorStore {
    dim: usize,
    orgs: RwLock<HashMap<String, BTreeMap<String, Vec<f32>>>>,
}

impl MemoryVectorStore {
    /// Creates an empty store that accepts vectors of length `dim`.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            orgs: RwLock::new(HashMap::new()),
        }
    }

    /// Add or replace the vector stored for `id` in `org`.
    pub fn insert(&self, org: &str, id: &str, vector: &[f32]) -> Result<(), VecError> {
        if vector.len() != self.dim {
            return Err(VecError::DimensionMismatch {
                got: vector.len(),
                want: self.dim,
            });
        }
        let mut orgs = self
            .orgs
            .write()
            .map_err(|e| VecError::Storage(e.to_string()))?;
        orgs.entry(org.to_string())
            .or_default()
            .insert(id.to_string(), vector.to_vec());
        Ok(())
    }

    /// Remove a vector. No error if it does not exist.
    pub fn remove(&self, org: &str, id: &str) -> Result<(), VecError> {
        let mut orgs = self
            .orgs
            .write()
            .map_err(|e| VecError::Storage(e.to_string()))?;
        if let Some(vectors) = orgs.get_mut(org) {
            vectors.remove(id);
        }
        Ok(())
    }

    /// Number of vectors stored for `org`.
    pub fn len(&self, org: &str) -> usize {
        self.orgs
            .read()
            .map(|orgs| orgs.get(org).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }
}

impl VectorStore for MemoryVectorStore {
    fn supports_vectors(&self) -> bool {
        true
    }

    fn nearest(
        &self,
        org: &str,
        query: &[f32],
        exclude: Option<&str>,
    ) -> Result<Option<Neighbor>, VecError> {
        let orgs = self
            .orgs
            .read()
            .map_err(|e| VecError::Storage(e.to_string()))?;
        let Some(vectors) = orgs.get(org) else {
            return Ok(None);
        };
        let candidates = vectors
            .iter()
            .filter(|(id, _)| Some(id.as_str()) != exclude)
            .map(|(id, v)| (id.as_str(), v.as_slice()));
        Ok(closest(query, candidates))
    }
}
