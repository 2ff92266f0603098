use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::access::{self, authorize_identity, scope_filter, Action, Caller, Identity};
use crate::candidates::status::Thresholds;
use crate::errors::{required, required_text, AppError};
use crate::models::job::{Job, JobChanges, JobStatus, NewJob};
use crate::resumes::remove_sidecar;
use crate::state::AppState;
use crate::store::{CompanyStore, JobStore, ResumeStore};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub title: Option<String>,
    pub department: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience_years: Option<i32>,
    pub description: Option<String>,
    pub shortlist_threshold: Option<f64>,
    pub reject_threshold: Option<f64>,
    pub status: Option<String>,
    /// Honoured for admins only; everyone else creates in their own company.
    pub company_id: Option<Uuid>,
}

/// Owner company and creator are not editable, so they are not accepted here.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobRequest {
    pub title: Option<String>,
    pub department: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience_years: Option<i32>,
    pub description: Option<String>,
    pub shortlist_threshold: Option<f64>,
    pub reject_threshold: Option<f64>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListQuery {
    pub company_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

fn parse_status(raw: &str) -> Result<JobStatus, AppError> {
    raw.parse::<JobStatus>()
        .map_err(|e| AppError::Validation(e.to_string()))
}

fn check_experience(years: i32) -> Result<i32, AppError> {
    if years < 0 {
        return Err(AppError::Validation(
            "experienceYears must not be negative".into(),
        ));
    }
    Ok(years)
}

fn check_thresholds(thresholds: Thresholds) -> Result<Thresholds, AppError> {
    thresholds
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    Ok(thresholds)
}

async fn owning_company(
    state: &AppState,
    identity: &Identity,
    requested: Option<Uuid>,
) -> Result<Uuid, AppError> {
    match identity.company_id() {
        Some(own) if !identity.is_admin() => Ok(own),
        _ => {
            let company_id = required(requested, "companyId")?;
            if state.store.find_company(company_id).await?.is_none() {
                return Err(AppError::Validation(format!(
                    "companyId {company_id} does not name an existing company"
                )));
            }
            Ok(company_id)
        }
    }
}

/// POST /api/jobs
pub async fn handle_create(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    let identity = access::require(&caller, Action::CreateJob)?;

    let title = required_text(req.title, "title")?;
    let department = required_text(req.department, "department")?;
    let experience_years = check_experience(required(req.experience_years, "experienceYears")?)?;
    let description = required_text(req.description, "description")?;
    let defaults = Thresholds::default();
    let thresholds = check_thresholds(Thresholds {
        shortlist: req.shortlist_threshold.unwrap_or(defaults.shortlist),
        reject: req.reject_threshold.unwrap_or(defaults.reject),
    })?;
    let status = match req.status.as_deref() {
        Some(raw) => parse_status(raw)?,
        None => JobStatus::default(),
    };

    let company_id = owning_company(&state, identity, req.company_id).await?;
    authorize_identity(identity, Action::CreateJob, Some(company_id)).into_result()?;

    let job = state
        .store
        .create_job(NewJob {
            title,
            department,
            skills: req.skills.unwrap_or_default(),
            experience_years,
            description,
            created_by: identity.id(),
            thresholds,
            status,
            company_id,
        })
        .await?;

    info!(job_id = %job.id, company_id = %job.company_id, "Job created");
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/jobs?companyId=
pub async fn handle_list(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<JobListQuery>,
) -> Result<Json<Vec<Job>>, AppError> {
    let identity = access::require(&caller, Action::ReadJob)?;
    let jobs = state
        .store
        .list_jobs(scope_filter(identity, query.company_id))
        .await?;
    Ok(Json(jobs))
}

/// GET /api/jobs/:id
pub async fn handle_get(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<Job>, AppError> {
    let identity = access::require(&caller, Action::ReadJob)?;
    let job = access::reveal(identity, Action::ReadJob, state.store.find_job(id).await?)?;
    Ok(Json(job))
}

/// PUT /api/jobs/:id
/// Thresholds are validated after merging with the stored values.
pub async fn handle_update(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateJobRequest>,
) -> Result<Json<Job>, AppError> {
    let identity = access::require(&caller, Action::UpdateJob)?;
    let job = access::reveal(identity, Action::UpdateJob, state.store.find_job(id).await?)?;

    let changes = JobChanges {
        title: req
            .title
            .map(|title| required_text(Some(title), "title"))
            .transpose()?,
        department: req
            .department
            .map(|department| required_text(Some(department), "department"))
            .transpose()?,
        skills: req.skills,
        experience_years: req.experience_years.map(check_experience).transpose()?,
        description: req
            .description
            .map(|description| required_text(Some(description), "description"))
            .transpose()?,
        shortlist_threshold: req.shortlist_threshold,
        reject_threshold: req.reject_threshold,
        status: req.status.as_deref().map(parse_status).transpose()?,
    };
    check_thresholds(changes.apply_to(&job).thresholds())?;

    let updated = state
        .store
        .update_job(job.id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found".into()))?;
    Ok(Json(updated))
}

/// DELETE /api/jobs/:id
/// Removes the job's resumes, candidates and sidecar files.
pub async fn handle_delete(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, AppError> {
    let identity = access::require(&caller, Action::DeleteJob)?;
    let job = access::reveal(identity, Action::DeleteJob, state.store.find_job(id).await?)?;

    let resumes = state.store.list_resumes_for_job(job.id).await?;
    if !state.store.delete_job_cascade(job.id).await? {
        return Err(AppError::NotFound("Job not found".into()));
    }
    for resume in &resumes {
        remove_sidecar(resume).await;
    }

    info!(job_id = %job.id, resumes = resumes.len(), "Job deleted");
    Ok(Json(DeleteResponse {
        message: "Job deleted successfully".into(),
    }))
}
