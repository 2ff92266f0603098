//! Candidate response shape: the stored record plus `score` and `rank`, both
//! always present and nulled when the caller may not see them.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::access::{visible_fields, FieldVisibility, Identity};
use crate::errors::AppError;
use crate::models::candidate::Candidate;
use crate::store::{CandidateStore, Store};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateView {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub score: Option<f64>,
    pub rank: Option<u32>,
}

impl CandidateView {
    pub fn new(mut candidate: Candidate, rank: Option<u32>, visibility: FieldVisibility) -> Self {
        let score = visibility.score(candidate.relevance_score);
        candidate.relevance_score = score;
        Self {
            candidate,
            score,
            rank: visibility.score(rank),
        }
    }
}

/// 1-based position among the scored candidates of one job. Equal scores
/// share a rank.
pub fn rank_among(score: Option<f64>, job_scores: &[f64]) -> Option<u32> {
    let score = score?;
    let higher = job_scores.iter().filter(|other| **other > score).count();
    Some(higher as u32 + 1)
}

/// Builds views for `candidates`, ranking each against every scored candidate
/// of its job, not only those in the list.
pub async fn present(
    store: &dyn Store,
    identity: &Identity,
    candidates: Vec<Candidate>,
) -> Result<Vec<CandidateView>, AppError> {
    let visibility = visible_fields(identity);

    let mut job_ids: Vec<Uuid> = candidates.iter().map(|c| c.job_id).collect();
    job_ids.sort_unstable();
    job_ids.dedup();

    let mut scores_by_job: HashMap<Uuid, Vec<f64>> = HashMap::new();
    if visibility.include_score && !job_ids.is_empty() {
        for entry in store.job_scores(&job_ids).await? {
            scores_by_job.entry(entry.job_id).or_default().push(entry.score);
        }
    }

    Ok(candidates
        .into_iter()
        .map(|candidate| {
            let scores = scores_by_job
                .get(&candidate.job_id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let rank = rank_among(candidate.relevance_score, scores);
            CandidateView::new(candidate, rank, visibility)
        })
        .collect())
}

pub async fn present_one(
    store: &dyn Store,
    identity: &Identity,
    candidate: Candidate,
) -> Result<CandidateView, AppError> {
    present(store, identity, vec![candidate])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("candidate view vanished")))
}
