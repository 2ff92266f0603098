//! Persistence seam. Handlers only see these traits; `PgStore` backs them in
//! production and an in-memory store backs them in tests.

pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::access::CompanyFilter;
use crate::models::{
    candidate::{Candidate, CandidateStatus, Evaluation, NewCandidate},
    company::{Company, NewCompany},
    job::{Job, JobChanges, NewJob},
    resume::{NewResume, Resume},
    user::{NewUser, User, UserChanges},
};

pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write. Carries what was duplicated.
    #[error("{0} already exists")]
    Duplicate(&'static str),

    /// The write would leave the deployment without an admin.
    #[error("the last admin cannot be removed")]
    LastAdmin,

    #[error("storage error: {0}")]
    Sql(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        let duplicate = error.as_database_error().and_then(|db| {
            if !db.is_unique_violation() {
                return None;
            }
            Some(match db.constraint() {
                Some("users_email_key") => "User",
                Some("companies_name_key") => "Company",
                _ => "Record",
            })
        });
        match duplicate {
            Some(what) => StoreError::Duplicate(what),
            None => StoreError::Sql(error),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Candidate listing criteria. The company predicate always comes from
/// `access::scope_filter`, never straight from the request.
#[derive(Debug, Clone, Copy)]
pub struct CandidateQuery {
    pub job_id: Option<Uuid>,
    pub status: Option<CandidateStatus>,
    pub company: CompanyFilter,
}

/// A scored candidate's position input for ranking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JobScore {
    pub job_id: Uuid,
    pub score: f64,
}

#[async_trait]
pub trait CompanyStore: Send + Sync {
    async fn create_company(&self, company: NewCompany) -> StoreResult<Company>;
    async fn find_company(&self, id: Uuid) -> StoreResult<Option<Company>>;
    /// All companies ordered by name.
    async fn list_companies(&self) -> StoreResult<Vec<Company>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    /// `email` must already be normalised.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn list_users(&self, company: CompanyFilter) -> StoreResult<Vec<User>>;
    /// Fails with `LastAdmin` when the change demotes the only admin. The
    /// check and the write are atomic.
    async fn update_user(&self, id: Uuid, changes: &UserChanges) -> StoreResult<Option<User>>;
    /// Same guard as `update_user`.
    async fn delete_user(&self, id: Uuid) -> StoreResult<bool>;
    async fn count_admins(&self) -> StoreResult<i64>;
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create_job(&self, job: NewJob) -> StoreResult<Job>;
    async fn find_job(&self, id: Uuid) -> StoreResult<Option<Job>>;
    /// Newest first.
    async fn list_jobs(&self, company: CompanyFilter) -> StoreResult<Vec<Job>>;
    async fn update_job(&self, id: Uuid, changes: &JobChanges) -> StoreResult<Option<Job>>;
    /// Moves the advisory resume counter, never below zero.
    async fn adjust_cv_count(&self, id: Uuid, delta: i32) -> StoreResult<()>;
    /// Removes the job together with its resumes and candidates.
    async fn delete_job_cascade(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait ResumeStore: Send + Sync {
    async fn create_resume(&self, resume: NewResume) -> StoreResult<Resume>;
    async fn find_resume(&self, id: Uuid) -> StoreResult<Option<Resume>>;
    /// Newest first.
    async fn list_resumes_for_job(&self, job_id: Uuid) -> StoreResult<Vec<Resume>>;
    /// Removes the resume and any candidate derived from it.
    async fn delete_resume_cascade(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait CandidateStore: Send + Sync {
    async fn create_candidate(&self, candidate: NewCandidate) -> StoreResult<Candidate>;
    async fn find_candidate(&self, id: Uuid) -> StoreResult<Option<Candidate>>;
    /// Highest relevance score first, unscored last, then newest.
    async fn list_candidates(&self, query: &CandidateQuery) -> StoreResult<Vec<Candidate>>;
    /// Scores of every scored candidate in the given jobs.
    async fn job_scores(&self, job_ids: &[Uuid]) -> StoreResult<Vec<JobScore>>;
    async fn update_candidate_status(
        &self,
        id: Uuid,
        status: CandidateStatus,
    ) -> StoreResult<Option<Candidate>>;
    async fn record_evaluation(
        &self,
        id: Uuid,
        evaluation: &Evaluation,
    ) -> StoreResult<Option<Candidate>>;
    async fn delete_candidate(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    /// One round trip to the backing database.
    async fn ping(&self) -> StoreResult<()>;
}

pub trait Store:
    CompanyStore + UserStore + JobStore + ResumeStore + CandidateStore + StoreHealth
{
}

impl<T> Store for T where
    T: CompanyStore + UserStore + JobStore + ResumeStore + CandidateStore + StoreHealth
{
}
