use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum cosine distance for an automatic merge.
pub const ACCEPT_COSINE: f32 = 0.30;
/// Maximum L2 distance for an automatic merge.
pub const ACCEPT_L2: f32 = 0.55;
/// Maximum cosine distance that still flags a candidate for review.
pub const REVIEW_COSINE: f32 = 0.38;
/// Maximum L2 distance that still flags a candidate for review.
pub const REVIEW_L2: f32 = 0.65;

/// Outcome of comparing a query embedding with its nearest stored person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Same person; attach the observation.
    Accept,
    /// Ambiguous; needs confirmation.
    Review,
    /// New identity.
    Create,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Accept => "accept",
            Decision::Review => "review",
            Decision::Create => "create",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Distance bounds used by [`Thresholds::classify`].
///
/// Accept is conjunctive: both metrics must be inside their accept bound.
/// Review is disjunctive: either metric inside its review bound is enough.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub accept_cosine: f32,
    pub accept_l2: f32,
    pub review_cosine: f32,
    pub review_l2: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            accept_cosine: ACCEPT_COSINE,
            accept_l2: ACCEPT_L2,
            review_cosine: REVIEW_COSINE,
            review_l2: REVIEW_L2,
        }
    }
}

impl Thresholds {
    /// Checks that every bound is a finite non-negative number and that each
    /// review bound is at least as loose as the matching accept bound.
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("accept_cosine", self.accept_cosine),
            ("accept_l2", self.accept_l2),
            ("review_cosine", self.review_cosine),
            ("review_l2", self.review_l2),
        ];
        for (name, v) in fields {
            if !v.is_finite() || v < 0.0 {
                return Err(format!("{name} must be a finite non-negative number, got {v}"));
            }
        }
        if self.review_cosine < self.accept_cosine {
            return Err("review_cosine must not be below accept_cosine".into());
        }
        if self.review_l2 < self.accept_l2 {
            return Err("review_l2 must not be below accept_l2".into());
        }
        Ok(())
    }

    /// Map a pair of distances to a decision. A missing distance counts as
    /// infinitely far, so it can never produce an accept.
    pub fn classify(&self, cosine: Option<f32>, l2: Option<f32>) -> Decision {
        let cos = cosine.unwrap_or(f32::INFINITY);
        let l2 = l2.unwrap_or(f32::INFINITY);

        if cos <= self.accept_cosine && l2 <= self.accept_l2 {
            Decision::Accept
        } else if cos <= self.review_cosine || l2 <= self.review_l2 {
            Decision::Review
        } else {
            Decision::Create
        }
    }
}

/// Classify with the default thresholds.
pub fn classify(cosine: Option<f32>, l2: Option<f32>) -> Decision {
    Thresholds::default().classify(cosine, l2)
}
