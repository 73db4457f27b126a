use thiserror::Error;

/// Errors returned by the matcher.
///
/// A backend without vector support is not an error; it yields a `create`
/// decision instead.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("identity: nearest-neighbour query failed: {0}")]
    Storage(#[from] footfall_vecstore::VecError),
}
