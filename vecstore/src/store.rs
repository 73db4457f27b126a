use crate::distance::{cosine_distance, l2_distance};
use crate::error::VecError;

/// The stored vector closest to a query, with both distance metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    /// Identifier of the stored vector's owner.
    pub id: String,

    /// Cosine distance to the query. `None` when undefined (zero norm,
    /// dimension mismatch).
    pub cosine_distance: Option<f32>,

    /// Euclidean distance to the query. `None` when undefined.
    pub l2_distance: Option<f32>,
}

/// VectorStore answers organization-scoped nearest-neighbour queries over
/// stored embeddings.
///
/// All implementations must be safe for concurrent use (Send + Sync).
pub trait VectorStore: Send + Sync {
    /// Report whether this backend can run similarity queries at all.
    /// Backends that return false are never asked for [`VectorStore::nearest`]
    /// by the matcher.
    fn supports_vectors(&self) -> bool;

    /// Return the stored vector in `org` with the smallest cosine distance to
    /// `query`, skipping `exclude`. `Ok(None)` means the organization has no
    /// candidate vectors.
    fn nearest(
        &self,
        org: &str,
        query: &[f32],
        exclude: Option<&str>,
    ) -> Result<Option<Neighbor>, VecError>;
}

/// Pick the candidate with minimum cosine distance to `query`.
///
/// Candidates are visited in iteration order and only a strictly smaller
/// distance replaces the current best, so ties resolve to the first
/// candidate. Candidates whose cosine distance is undefined rank after every
/// defined one; if all are undefined the first candidate is returned with
/// `cosine_distance: None`.
pub fn closest<'a, I>(query: &[f32], candidates: I) -> Option<Neighbor>
where
    I: IntoIterator<Item = (&'a str, &'a [f32])>,
{
    let mut best: Option<Neighbor> = None;
    for (id, vector) in candidates {
        let cos = cosine_distance(query, vector);
        let better = match (&best, cos) {
            (None, _) => true,
            (Some(b), Some(c)) => b.cosine_distance.is_none_or(|bc| c < bc),
            (Some(_), None) => false,
        };
        if better {
            best = Some(Neighbor {
                id: id.to_string(),
                cosine_distance: cos,
                l2_distance: l2_distance(query, vector),
            });
        }
    }
    best
}
