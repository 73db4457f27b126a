use thiserror::Error;

#[derive(Error, Debug)]
pub enum PeopleError {
    /// Rejected before any matching or storage happens.
    #[error("people: invalid request: {0}")]
    Validation(String),

    #[error("people: {0} not found")]
    NotFound(String),

    #[error("people: conflict: {0}")]
    Conflict(String),

    #[error("people: storage error: {0}")]
    Storage(#[from] footfall_kv::KVError),

    #[error("people: serialization error: {0}")]
    Serialization(String),

    #[error("people: match failed: {0}")]
    Match(#[from] footfall_identity::MatchError),
}
