use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::access::{self, Action, Caller};
use crate::candidates::status::derive_status;
use crate::candidates::view::{present_one, CandidateView};
use crate::errors::{required, AppError};
use crate::models::candidate::{CandidateStatus, NewCandidate};
use crate::resumes::{
    parse_uuid,
    staging::{stage_multipart, UploadLimits},
};
use crate::scoring::{ResumeScorer, ScoringRequest, ScoringResult};
use crate::state::AppState;
use crate::store::{CandidateStore, JobStore};

const UNKNOWN_NAME: &str = "Unknown";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResponse {
    pub message: String,
    pub candidate: CandidateView,
    pub ml_result: ScoringResult,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// True when both addresses are present and name different mailboxes.
fn emails_conflict(supplied: Option<&str>, extracted: Option<&str>) -> bool {
    match (non_empty(supplied), non_empty(extracted)) {
        (Some(a), Some(b)) => !a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

/// POST /api/ml/evaluate-cv
/// Multipart: `cv` file, `job_id`, `jd_text`, optional `email`. Scores one
/// resume remotely and records a candidate without storing the file. The
/// staged upload is removed however the request ends.
pub async fn handle_evaluate_cv(
    State(state): State<AppState>,
    caller: Caller,
    multipart: Multipart,
) -> Result<Json<EvaluationResponse>, AppError> {
    let identity = access::require(&caller, Action::EvaluateCandidate)?;

    let form = stage_multipart(
        multipart,
        "cv",
        &state.config.upload_dir,
        UploadLimits {
            max_file_bytes: state.config.max_upload_bytes,
            max_files: 1,
        },
    )
    .await?;

    let cv = required(form.files.first(), "cv")?;
    let job_id = parse_uuid(form.text("job_id"), "job_id")?;
    let jd_text = required(form.text("jd_text"), "jd_text")?.to_string();
    let supplied_email = form.text("email").map(str::to_string);

    let job = access::reveal(
        identity,
        Action::EvaluateCandidate,
        state.store.find_job(job_id).await?,
    )?;

    let result = state
        .scorer
        .score(&ScoringRequest {
            cv_path: cv.path().to_path_buf(),
            file_name: cv.file_name.clone(),
            content_type: cv.kind.content_type(),
            job_id: job.id,
            company_id: job.company_id,
            job_title: job.title.clone(),
            jd_text,
            email: supplied_email.clone(),
        })
        .await?;

    if emails_conflict(supplied_email.as_deref(), result.email.as_deref()) {
        warn!(job_id = %job.id, "Supplied email does not match the CV");
        return Err(AppError::UnprocessableEntity(
            "The supplied email does not match the email found in the CV".into(),
        ));
    }

    let candidate = state
        .store
        .create_candidate(NewCandidate {
            name: non_empty(result.name.as_deref())
                .unwrap_or(UNKNOWN_NAME)
                .to_string(),
            email: non_empty(result.email.as_deref())
                .or(supplied_email.as_deref())
                .map(str::to_lowercase),
            phone: non_empty(result.phone.as_deref()).map(str::to_string),
            job_id: job.id,
            resume_id: None,
            extracted_text: String::new(),
            relevance_score: Some(result.score),
            strengths: result.strengths.clone(),
            weaknesses: result.weaknesses.clone(),
            feedback: result.feedback.clone(),
            status: derive_status(
                Some(result.score),
                &job.thresholds(),
                CandidateStatus::Pending,
            ),
            company_id: job.company_id,
        })
        .await?;
    state.store.adjust_cv_count(job.id, 1).await?;

    info!(
        candidate_id = %candidate.id,
        job_id = %job.id,
        status = %candidate.status,
        "CV evaluated"
    );

    let candidate = present_one(state.store.as_ref(), identity, candidate).await?;

    Ok(Json(EvaluationResponse {
        message: "CV evaluated successfully".into(),
        candidate,
        ml_result: result,
    }))
}
