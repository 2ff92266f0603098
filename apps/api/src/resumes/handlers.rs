use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::access::{self, Action, Caller};
use crate::errors::AppError;
use crate::models::{
    candidate::{CandidateStatus, NewCandidate},
    resume::{NewResume, Resume},
};
use crate::resumes::{
    extract::{extract_readable, ExtractError},
    parse_uuid, persist_resume,
    profile::contact_profile,
    remove_sidecar,
    staging::{stage_multipart, UploadLimits},
};
use crate::state::AppState;
use crate::store::{CandidateStore, JobStore, ResumeStore};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestedResume {
    pub resume_id: Uuid,
    pub candidate_id: Uuid,
    pub file_name: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub data: Vec<IngestedResume>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// POST /api/cvs/upload
/// Multipart: `jobId` plus one or more `cvs` files. Every file is extracted
/// and checked before anything is written.
pub async fn handle_upload(
    State(state): State<AppState>,
    caller: Caller,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let identity = access::require(&caller, Action::UploadResume)?;

    let form = stage_multipart(
        multipart,
        "cvs",
        &state.config.upload_dir,
        UploadLimits {
            max_file_bytes: state.config.max_upload_bytes,
            max_files: state.config.max_files_per_upload,
        },
    )
    .await?;

    let job_id = parse_uuid(form.text("jobId"), "jobId")?;
    let job = access::reveal(
        identity,
        Action::UploadResume,
        state.store.find_job(job_id).await?,
    )?;

    if form.files.is_empty() {
        return Err(AppError::Validation(
            "At least one CV file is required".into(),
        ));
    }

    let mut extracted = Vec::with_capacity(form.files.len());
    for file in &form.files {
        let text =
            extract_readable(state.extractor.clone(), file.path().to_path_buf(), file.kind)
                .await
                .map_err(|e| match e {
                    ExtractError::Io(_) => AppError::from(e),
                    other => AppError::Validation(format!("{}: {other}", file.file_name)),
                })?;
        extracted.push((file, text));
    }

    let mut data = Vec::with_capacity(extracted.len());
    for (file, text) in extracted {
        let resume_id = Uuid::new_v4();
        let storage_path = state
            .config
            .upload_dir
            .join(format!("{resume_id}.{}", file.kind.extension()))
            .to_string_lossy()
            .into_owned();

        let resume = persist_resume(
            state.store.as_ref(),
            NewResume {
                id: resume_id,
                job_id: job.id,
                file_name: file.file_name.clone(),
                storage_path,
                extracted_text: text.clone(),
                file_size_bytes: file.size_bytes as i64,
                uploaded_by: identity.id(),
                company_id: job.company_id,
            },
        )
        .await?;

        let profile = contact_profile(&text);
        let candidate = state
            .store
            .create_candidate(NewCandidate {
                name: profile.name,
                email: profile.email,
                phone: profile.phone,
                job_id: job.id,
                resume_id: Some(resume.id),
                extracted_text: text,
                relevance_score: None,
                strengths: Vec::new(),
                weaknesses: Vec::new(),
                feedback: String::new(),
                status: CandidateStatus::Pending,
                company_id: job.company_id,
            })
            .await?;

        data.push(IngestedResume {
            resume_id: resume.id,
            candidate_id: candidate.id,
            file_name: resume.file_name,
        });
    }

    state
        .store
        .adjust_cv_count(job.id, data.len() as i32)
        .await?;

    info!(job_id = %job.id, count = data.len(), "Resumes ingested");
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: format!("{} CV(s) uploaded successfully", data.len()),
            data,
        }),
    ))
}

/// GET /api/cvs/job/:job_id
pub async fn handle_list_for_job(
    State(state): State<AppState>,
    caller: Caller,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Vec<Resume>>, AppError> {
    let identity = access::require(&caller, Action::ReadResume)?;
    let job = access::reveal(
        identity,
        Action::ReadResume,
        state.store.find_job(job_id).await?,
    )?;
    Ok(Json(state.store.list_resumes_for_job(job.id).await?))
}

/// GET /api/cvs/:id
pub async fn handle_get(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<Resume>, AppError> {
    let identity = access::require(&caller, Action::ReadResume)?;
    let resume = access::reveal(
        identity,
        Action::ReadResume,
        state.store.find_resume(id).await?,
    )?;
    Ok(Json(resume))
}

/// DELETE /api/cvs/:id
/// Also removes the derived candidate and the sidecar text file.
pub async fn handle_delete(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, AppError> {
    let identity = access::require(&caller, Action::DeleteResume)?;
    let resume = access::reveal(
        identity,
        Action::DeleteResume,
        state.store.find_resume(id).await?,
    )?;

    if !state.store.delete_resume_cascade(resume.id).await? {
        return Err(AppError::NotFound("CV not found".into()));
    }
    remove_sidecar(&resume).await;
    state.store.adjust_cv_count(resume.job_id, -1).await?;

    info!(resume_id = %resume.id, "Resume deleted");
    Ok(Json(DeleteResponse {
        message: "CV deleted successfully".into(),
    }))
}
