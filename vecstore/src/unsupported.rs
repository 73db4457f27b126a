use crate::error::VecError;
use crate::store::{Neighbor, VectorStore};

/// A backend without similarity search, such as a plain relational store
/// with no vector index. Matching against it always degrades to "create".
#[derive(Debug, Default, Clone, Copy)]
pub struct NoVectorSupport;

impl VectorStore for NoVectorSupport {
    fn supports_vectors(&self) -> bool {
        false
    }

    fn nearest(
        &self,
        _org: &str,
        _query: &[f32],
        _exclude: Option<&str>,
    ) -> Result<Option<Neighbor>, VecError> {
        Ok(None)
    }
}
