//! Identity matching for person embeddings.
//!
//! Given a new embedding and an organization, [`Matcher::find_best_match`]
//! looks up the closest stored person and [`classify`] turns the pair of
//! distances into a [`Decision`]:
//!
//! - `accept`: cosine and L2 are both inside the tight bounds; attach to the
//!   existing person.
//! - `review`: either metric is inside the loose bounds; ambiguous.
//! - `create`: nothing close enough; treat as a new person.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use footfall_identity::{Decision, Matcher, Thresholds};
//! use footfall_vecstore::MemoryVectorStore;
//!
//! let store = Arc::new(MemoryVectorStore::new(3));
//! store.insert("org", "alice", &[1.0, 0.0, 0.0]).unwrap();
//!
//! let matcher = Matcher::new(Thresholds::default(), store);
//! let m = matcher.find_best_match("org", &[1.0, 0.0, 0.0], None).unwrap();
//! assert_eq!(m.decision, Decision::Accept);
//! assert_eq!(m.person.as_deref(), Some("alice"));
//! ```
//!
//! The matcher only reads. Persisting the outcome, and serializing
//! concurrent match-then-write sequences, is up to the caller.

mod classify;
mod error;
mod matcher;

pub use classify::{
    ACCEPT_COSINE, ACCEPT_L2, Decision, REVIEW_COSINE, REVIEW_L2, Thresholds, classify,
};
pub use error::MatchError;
pub use matcher::{MatchResult, Matcher};
