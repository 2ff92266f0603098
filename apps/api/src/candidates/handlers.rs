use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::access::{self, scope_filter, Action, Caller};
use crate::candidates::status::derive_status;
use crate::candidates::view::{present, present_one, CandidateView};
use crate::errors::{required, AppError};
use crate::models::candidate::{CandidateStatus, Evaluation};
use crate::resumes::remove_sidecar;
use crate::state::AppState;
use crate::store::{CandidateQuery, CandidateStore, JobStore, ResumeStore};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateListQuery {
    pub job_id: Option<Uuid>,
    pub status: Option<String>,
    pub company_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRequest {
    pub relevance_score: Option<f64>,
    pub strengths: Option<Vec<String>>,
    pub weaknesses: Option<Vec<String>>,
    pub feedback: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

fn parse_status(raw: &str) -> Result<CandidateStatus, AppError> {
    raw.parse::<CandidateStatus>()
        .map_err(|e| AppError::Validation(e.to_string()))
}

fn check_score(score: f64) -> Result<f64, AppError> {
    if !score.is_finite() || !(0.0..=100.0).contains(&score) {
        return Err(AppError::Validation(format!(
            "relevanceScore must be between 0 and 100, got {score}"
        )));
    }
    Ok(score)
}

/// GET /api/candidates?jobId=&status=&companyId=
/// Highest score first, unscored last, then newest.
pub async fn handle_list(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<CandidateListQuery>,
) -> Result<Json<Vec<CandidateView>>, AppError> {
    let identity = access::require(&caller, Action::ReadCandidate)?;
    let status = query.status.as_deref().map(parse_status).transpose()?;

    let candidates = state
        .store
        .list_candidates(&CandidateQuery {
            job_id: query.job_id,
            status,
            company: scope_filter(identity, query.company_id),
        })
        .await?;
    Ok(Json(present(state.store.as_ref(), identity, candidates).await?))
}

/// GET /api/candidates/:id
pub async fn handle_get(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<CandidateView>, AppError> {
    let identity = access::require(&caller, Action::ReadCandidate)?;
    let candidate = access::reveal(
        identity,
        Action::ReadCandidate,
        state.store.find_candidate(id).await?,
    )?;
    Ok(Json(present_one(state.store.as_ref(), identity, candidate).await?))
}

/// PATCH /api/candidates/:id/status
/// An explicit decision; later evaluations will not override it.
pub async fn handle_update_status(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<CandidateView>, AppError> {
    let identity = access::require(&caller, Action::UpdateCandidateStatus)?;
    let status = parse_status(&required(req.status, "status")?)?;
    let candidate = access::reveal(
        identity,
        Action::UpdateCandidateStatus,
        state.store.find_candidate(id).await?,
    )?;

    let updated = state
        .store
        .update_candidate_status(candidate.id, status)
        .await?
        .ok_or_else(|| AppError::NotFound("Candidate not found".into()))?;
    info!(candidate_id = %updated.id, status = %updated.status, "Candidate status set");
    Ok(Json(present_one(state.store.as_ref(), identity, updated).await?))
}

/// PATCH /api/candidates/:id/evaluate
/// Merges the supplied fields, then re-derives status from the job's
/// thresholds.
pub async fn handle_evaluate(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(req): Json<EvaluationRequest>,
) -> Result<Json<CandidateView>, AppError> {
    let identity = access::require(&caller, Action::EvaluateCandidate)?;
    let score = req.relevance_score.map(check_score).transpose()?;
    let candidate = access::reveal(
        identity,
        Action::EvaluateCandidate,
        state.store.find_candidate(id).await?,
    )?;

    let thresholds = state
        .store
        .find_job(candidate.job_id)
        .await?
        .map(|job| job.thresholds())
        .unwrap_or_default();

    let relevance_score = score.or(candidate.relevance_score);
    let evaluation = Evaluation {
        relevance_score,
        strengths: req.strengths.unwrap_or(candidate.strengths),
        weaknesses: req.weaknesses.unwrap_or(candidate.weaknesses),
        feedback: req.feedback.unwrap_or(candidate.feedback),
        status: derive_status(relevance_score, &thresholds, candidate.status),
    };

    let updated = state
        .store
        .record_evaluation(candidate.id, &evaluation)
        .await?
        .ok_or_else(|| AppError::NotFound("Candidate not found".into()))?;
    info!(candidate_id = %updated.id, status = %updated.status, "Candidate evaluated");
    Ok(Json(present_one(state.store.as_ref(), identity, updated).await?))
}

/// DELETE /api/candidates/:id
/// Takes the candidate's resume and sidecar with it.
pub async fn handle_delete(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, AppError> {
    let identity = access::require(&caller, Action::DeleteCandidate)?;
    let candidate = access::reveal(
        identity,
        Action::DeleteCandidate,
        state.store.find_candidate(id).await?,
    )?;

    if !state.store.delete_candidate(candidate.id).await? {
        return Err(AppError::NotFound("Candidate not found".into()));
    }
    if let Some(resume_id) = candidate.resume_id {
        if let Some(resume) = state.store.find_resume(resume_id).await? {
            state.store.delete_resume_cascade(resume.id).await?;
            remove_sidecar(&resume).await;
        }
    }
    state.store.adjust_cv_count(candidate.job_id, -1).await?;

    info!(candidate_id = %candidate.id, "Candidate deleted");
    Ok(Json(DeleteResponse {
        message: "Candidate deleted successfully".into(),
    }))
}

