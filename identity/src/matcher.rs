use std::fmt;
use std::sync::Arc;

use footfall_vecstore::VectorStore;
use serde::Serialize;
use tracing::{debug, warn};

use crate::classify::{Decision, Thresholds};
use crate::error::MatchError;

/// The matcher's answer for one query vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// Id of the matched person. Present only for `accept` and `review`.
    pub person: Option<String>,
    pub decision: Decision,
    pub cosine_distance: Option<f32>,
    pub l2_distance: Option<f32>,
}

impl MatchResult {
    /// A `create` decision with no candidate and no distances.
    pub fn unmatched() -> Self {
        Self {
            person: None,
            decision: Decision::Create,
            cosine_distance: None,
            l2_distance: None,
        }
    }
}

/// Finds the closest known person for an embedding and classifies the match.
///
/// Thread-safe: the matcher holds no mutable state.
pub struct Matcher {
    thresholds: Thresholds,
    store: Arc<dyn VectorStore>,
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher")
            .field("thresholds", &self.thresholds)
            .field("vector_search", &self.store.supports_vectors())
            .finish()
    }
}

impl Matcher {
    pub fn new(thresholds: Thresholds, store: Arc<dyn VectorStore>) -> Self {
        Self { thresholds, store }
    }

    /// Match `vector` against the people of `org`, optionally skipping
    /// `exclude_person_id` (used when re-matching a stored person).
    ///
    /// The vector must already be validated against the configured
    /// dimension. Query failures are returned as errors and never turned
    /// into a `create` decision.
    pub fn find_best_match(
        &self,
        org: &str,
        vector: &[f32],
        exclude_person_id: Option<&str>,
    ) -> Result<MatchResult, MatchError> {
        if !self.store.supports_vectors() {
            warn!(org, "vector search unavailable; skipping deduplication");
            return Ok(MatchResult::unmatched());
        }

        let Some(candidate) = self.store.nearest(org, vector, exclude_person_id)? else {
            debug!(org, "no candidates; create");
            return Ok(MatchResult::unmatched());
        };
        let Some(cos) = candidate.cosine_distance else {
            debug!(org, candidate = %candidate.id, "cosine distance undefined; create");
            return Ok(MatchResult::unmatched());
        };

        let decision = self.thresholds.classify(Some(cos), candidate.l2_distance);
        debug!(
            org,
            candidate = %candidate.id,
            cosine = cos,
            l2 = ?candidate.l2_distance,
            %decision,
            "match classified"
        );

        let person = match decision {
            Decision::Create => None,
            Decision::Accept | Decision::Review => Some(candidate.id),
        };
        Ok(MatchResult {
            person,
            decision,
            cosine_distance: Some(cos),
            l2_distance: candidate.l2_distance,
        })
    }
}
