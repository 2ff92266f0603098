use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::access::CompanyFilter;
use crate::models::{
    candidate::{Candidate, CandidateStatus, Evaluation, NewCandidate},
    company::{Company, NewCompany},
    job::{Job, JobChanges, NewJob},
    resume::{NewResume, Resume},
    user::{NewUser, Role, User, UserChanges},
};
use crate::store::{
    CandidateQuery, CandidateStore, CompanyStore, JobScore, JobStore, ResumeStore, StoreError,
    StoreHealth, StoreResult, UserStore,
};

/// PostgreSQL-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Locks every admin row, so concurrent demotions and deletions queue up
/// behind each other, then refuses if `id` is the only admin left.
async fn ensure_other_admin(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> StoreResult<()> {
    let admins: Vec<Uuid> =
        sqlx::query_scalar("SELECT id FROM users WHERE role = 'admin' FOR UPDATE")
            .fetch_all(&mut **tx)
            .await?;
    if admins == [id] {
        return Err(StoreError::LastAdmin);
    }
    Ok(())
}

#[async_trait]
impl StoreHealth for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl CompanyStore for PgStore {
    async fn create_company(&self, company: NewCompany) -> StoreResult<Company> {
        let NewCompany { name, metadata } = company;
        let created = sqlx::query_as::<_, Company>(
            "INSERT INTO companies (id, name, metadata) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(metadata)
        .fetch_one(&self.pool)
        .await?;
        info!("Created company {} ({})", created.name, created.id);
        Ok(created)
    }

    async fn find_company(&self, id: Uuid) -> StoreResult<Option<Company>> {
        Ok(
            sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_companies(&self) -> StoreResult<Vec<Company>> {
        Ok(
            sqlx::query_as::<_, Company>("SELECT * FROM companies ORDER BY name ASC")
                .fetch_all(&self.pool)
                .await?,
        )
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        Ok(sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, credential_hash, role, company_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.credential_hash)
        .bind(user.role.as_str())
        .bind(user.company_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_users(&self, company: CompanyFilter) -> StoreResult<Vec<User>> {
        Ok(sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE ($1::uuid IS NULL OR company_id = $1) ORDER BY name ASC",
        )
        .bind(company.company_id())
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_user(&self, id: Uuid, changes: &UserChanges) -> StoreResult<Option<User>> {
        let mut tx = self.pool.begin().await?;
        if changes.role.is_some_and(|role| role != Role::Admin) {
            ensure_other_admin(&mut tx, id).await?;
        }
        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                role = COALESCE($4, role),
                company_id = CASE WHEN $5 THEN $6 ELSE company_id END,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.email.as_deref())
        .bind(changes.role.map(|r| r.as_str()))
        .bind(changes.company_id.is_some())
        .bind(changes.company_id.flatten())
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        ensure_other_admin(&mut tx, id).await?;
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_admins(&self) -> StoreResult<i64> {
        Ok(
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin'")
                .fetch_one(&self.pool)
                .await?,
        )
    }
}

#[async_trait]
impl JobStore for PgStore {
    async fn create_job(&self, job: NewJob) -> StoreResult<Job> {
        Ok(sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs
                (id, title, department, skills, experience_years, description, created_by,
                 shortlist_threshold, reject_threshold, status, company_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&job.title)
        .bind(&job.department)
        .bind(&job.skills)
        .bind(job.experience_years)
        .bind(&job.description)
        .bind(job.created_by)
        .bind(job.thresholds.shortlist)
        .bind(job.thresholds.reject)
        .bind(job.status.as_str())
        .bind(job.company_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_job(&self, id: Uuid) -> StoreResult<Option<Job>> {
        Ok(sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_jobs(&self, company: CompanyFilter) -> StoreResult<Vec<Job>> {
        Ok(sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE ($1::uuid IS NULL OR company_id = $1) ORDER BY created_at DESC",
        )
        .bind(company.company_id())
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_job(&self, id: Uuid, changes: &JobChanges) -> StoreResult<Option<Job>> {
        Ok(sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs SET
                title = COALESCE($2, title),
                department = COALESCE($3, department),
                skills = COALESCE($4, skills),
                experience_years = COALESCE($5, experience_years),
                description = COALESCE($6, description),
                shortlist_threshold = COALESCE($7, shortlist_threshold),
                reject_threshold = COALESCE($8, reject_threshold),
                status = COALESCE($9, status),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.title.as_deref())
        .bind(changes.department.as_deref())
        .bind(changes.skills.as_ref())
        .bind(changes.experience_years)
        .bind(changes.description.as_deref())
        .bind(changes.shortlist_threshold)
        .bind(changes.reject_threshold)
        .bind(changes.status.map(|s| s.as_str()))
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn adjust_cv_count(&self, id: Uuid, delta: i32) -> StoreResult<()> {
        sqlx::query("UPDATE jobs SET cv_count = GREATEST(cv_count + $2, 0) WHERE id = $1")
            .bind(id)
            .bind(delta)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_job_cascade(&self, id: Uuid) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        let candidates = sqlx::query("DELETE FROM candidates WHERE job_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let resumes = sqlx::query("DELETE FROM resumes WHERE job_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let jobs = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;

        info!("Deleted job {id} with {resumes} resumes and {candidates} candidates");
        Ok(jobs > 0)
    }
}

#[async_trait]
impl ResumeStore for PgStore {
    async fn create_resume(&self, resume: NewResume) -> StoreResult<Resume> {
        Ok(sqlx::query_as::<_, Resume>(
            r#"
            INSERT INTO resumes
                (id, job_id, file_name, storage_path, extracted_text, file_size_bytes,
                 uploaded_by, company_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(resume.id)
        .bind(resume.job_id)
        .bind(&resume.file_name)
        .bind(&resume.storage_path)
        .bind(&resume.extracted_text)
        .bind(resume.file_size_bytes)
        .bind(resume.uploaded_by)
        .bind(resume.company_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_resume(&self, id: Uuid) -> StoreResult<Option<Resume>> {
        Ok(
            sqlx::query_as::<_, Resume>("SELECT * FROM resumes WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_resumes_for_job(&self, job_id: Uuid) -> StoreResult<Vec<Resume>> {
        Ok(sqlx::query_as::<_, Resume>(
            "SELECT * FROM resumes WHERE job_id = $1 ORDER BY created_at DESC",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn delete_resume_cascade(&self, id: Uuid) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM candidates WHERE resume_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM resumes WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        Ok(deleted > 0)
    }
}

#[async_trait]
impl CandidateStore for PgStore {
    async fn create_candidate(&self, candidate: NewCandidate) -> StoreResult<Candidate> {
        Ok(sqlx::query_as::<_, Candidate>(
            r#"
            INSERT INTO candidates
                (id, name, email, phone, job_id, resume_id, extracted_text, relevance_score,
                 strengths, weaknesses, feedback, status, company_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&candidate.name)
        .bind(candidate.email.as_deref())
        .bind(candidate.phone.as_deref())
        .bind(candidate.job_id)
        .bind(candidate.resume_id)
        .bind(&candidate.extracted_text)
        .bind(candidate.relevance_score)
        .bind(&candidate.strengths)
        .bind(&candidate.weaknesses)
        .bind(&candidate.feedback)
        .bind(candidate.status.as_str())
        .bind(candidate.company_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn find_candidate(&self, id: Uuid) -> StoreResult<Option<Candidate>> {
        Ok(
            sqlx::query_as::<_, Candidate>("SELECT * FROM candidates WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_candidates(&self, query: &CandidateQuery) -> StoreResult<Vec<Candidate>> {
        Ok(sqlx::query_as::<_, Candidate>(
            r#"
            SELECT * FROM candidates
            WHERE ($1::uuid IS NULL OR company_id = $1)
              AND ($2::uuid IS NULL OR job_id = $2)
              AND ($3::text IS NULL OR status = $3)
            ORDER BY relevance_score DESC NULLS LAST, created_at DESC
            "#,
        )
        .bind(query.company.company_id())
        .bind(query.job_id)
        .bind(query.status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn job_scores(&self, job_ids: &[Uuid]) -> StoreResult<Vec<JobScore>> {
        let rows: Vec<(Uuid, f64)> = sqlx::query_as(
            r#"
            SELECT job_id, relevance_score FROM candidates
            WHERE job_id = ANY($1) AND relevance_score IS NOT NULL
            "#,
        )
        .bind(job_ids.to_vec())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(job_id, score)| JobScore { job_id, score })
            .collect())
    }

    async fn update_candidate_status(
        &self,
        id: Uuid,
        status: CandidateStatus,
    ) -> StoreResult<Option<Candidate>> {
        Ok(sqlx::query_as::<_, Candidate>(
            "UPDATE candidates SET status = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn record_evaluation(
        &self,
        id: Uuid,
        evaluation: &Evaluation,
    ) -> StoreResult<Option<Candidate>> {
        Ok(sqlx::query_as::<_, Candidate>(
            r#"
            UPDATE candidates SET
                relevance_score = $2,
                strengths = $3,
                weaknesses = $4,
                feedback = $5,
                status = $6,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(evaluation.relevance_score)
        .bind(&evaluation.strengths)
        .bind(&evaluation.weaknesses)
        .bind(&evaluation.feedback)
        .bind(evaluation.status.as_str())
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_candidate(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM candidates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
