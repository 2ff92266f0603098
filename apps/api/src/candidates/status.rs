//! Candidate status derivation from a relevance score and per-job thresholds.
//!
//! Bands, with the defaults:
//! - `score >= 75`            → shortlisted (inclusive)
//! - `40 <= score < 75`       → reviewed
//! - `score < 40`             → rejected (exclusive at the boundary)
//!
//! The inclusive-shortlist / exclusive-reject boundaries are a product
//! decision; keep them exactly as written.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::candidate::CandidateStatus;

pub const DEFAULT_SHORTLIST_THRESHOLD: f64 = 75.0;
pub const DEFAULT_REJECT_THRESHOLD: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub shortlist: f64,
    pub reject: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            shortlist: DEFAULT_SHORTLIST_THRESHOLD,
            reject: DEFAULT_REJECT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThresholdError {
    #[error("{name} must be between 0 and 100, got {value}")]
    OutOfRange { name: &'static str, value: f64 },
    #[error("rejectThreshold ({reject}) must be lower than shortlistThreshold ({shortlist})")]
    Inverted { shortlist: f64, reject: f64 },
}

impl Thresholds {
    /// Checks a job configuration before it is stored. [`derive_status`] still
    /// tolerates inverted thresholds that slipped through.
    pub fn validate(&self) -> Result<(), ThresholdError> {
        for (name, value) in [
            ("shortlistThreshold", self.shortlist),
            ("rejectThreshold", self.reject),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ThresholdError::OutOfRange { name, value });
            }
        }
        if self.reject >= self.shortlist {
            return Err(ThresholdError::Inverted {
                shortlist: self.shortlist,
                reject: self.reject,
            });
        }
        Ok(())
    }
}

/// Derives a candidate status from `score`.
///
/// Derivation only ever moves a candidate out of `pending`: with no score, or
/// once a status has been set, `existing` is returned untouched. The shortlist
/// check runs first, so with inverted thresholds an overlapping score lands in
/// `shortlisted`.
pub fn derive_status(
    score: Option<f64>,
    thresholds: &Thresholds,
    existing: CandidateStatus,
) -> CandidateStatus {
    let Some(score) = score else {
        return existing;
    };
    if existing != CandidateStatus::Pending {
        return existing;
    }
    if score >= thresholds.shortlist {
        CandidateStatus::Shortlisted
    } else if score < thresholds.reject {
        CandidateStatus::Rejected
    } else {
        CandidateStatus::Reviewed
    }
}
