//! In-memory store for tests. Rows live in insertion order, so "newest first"
//! is a reverse scan.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
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

#[derive(Debug, Default)]
struct Tables {
    companies: Vec<Company>,
    users: Vec<User>,
    jobs: Vec<Job>,
    resumes: Vec<Resume>,
    candidates: Vec<Candidate>,
}

impl Tables {
    fn ensure_other_admin(&self, id: Uuid) -> StoreResult<()> {
        let mut admins = self.users.iter().filter(|u| u.role == Role::Admin);
        match (admins.next(), admins.next()) {
            (Some(only), None) if only.id == id => Err(StoreError::LastAdmin),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        let mut tables = self.tables.lock().unwrap();
        f(&mut tables)
    }

    pub fn resume_count(&self) -> usize {
        self.with(|t| t.resumes.len())
    }

    pub fn candidate_count(&self) -> usize {
        self.with(|t| t.candidates.len())
    }

    pub fn user_count(&self) -> usize {
        self.with(|t| t.users.len())
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl CompanyStore for MemoryStore {
    async fn create_company(&self, company: NewCompany) -> StoreResult<Company> {
        self.with(|t| {
            if t.companies.iter().any(|c| c.name == company.name) {
                return Err(StoreError::Duplicate("Company"));
            }
            let created = Company {
                id: Uuid::new_v4(),
                name: company.name,
                metadata: company.metadata,
                created_at: Utc::now(),
            };
            t.companies.push(created.clone());
            Ok(created)
        })
    }

    async fn find_company(&self, id: Uuid) -> StoreResult<Option<Company>> {
        Ok(self.with(|t| t.companies.iter().find(|c| c.id == id).cloned()))
    }

    async fn list_companies(&self) -> StoreResult<Vec<Company>> {
        let mut companies = self.with(|t| t.companies.clone());
        companies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(companies)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        self.with(|t| {
            if t.users.iter().any(|u| u.email == user.email) {
                return Err(StoreError::Duplicate("User"));
            }
            let now = Utc::now();
            let created = User {
                id: Uuid::new_v4(),
                name: user.name,
                email: user.email,
                credential_hash: user.credential_hash,
                role: user.role,
                company_id: user.company_id,
                created_at: now,
                updated_at: now,
            };
            t.users.push(created.clone());
            Ok(created)
        })
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.with(|t| t.users.iter().find(|u| u.id == id).cloned()))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.with(|t| t.users.iter().find(|u| u.email == email).cloned()))
    }

    async fn list_users(&self, company: CompanyFilter) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.with(|t| {
            t.users
                .iter()
                .filter(|u| match company {
                    CompanyFilter::Any => true,
                    CompanyFilter::Only(id) => u.company_id == Some(id),
                })
                .cloned()
                .collect()
        });
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn update_user(&self, id: Uuid, changes: &UserChanges) -> StoreResult<Option<User>> {
        self.with(|t| {
            if let Some(email) = &changes.email {
                if t.users.iter().any(|u| u.id != id && &u.email == email) {
                    return Err(StoreError::Duplicate("User"));
                }
            }
            if changes.role.is_some_and(|role| role != Role::Admin) {
                t.ensure_other_admin(id)?;
            }
            Ok(t.users.iter_mut().find(|u| u.id == id).map(|user| {
                *user = changes.apply_to(user);
                user.updated_at = Utc::now();
                user.clone()
            }))
        })
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        self.with(|t| {
            t.ensure_other_admin(id)?;
            let before = t.users.len();
            t.users.retain(|u| u.id != id);
            Ok(t.users.len() < before)
        })
    }

    async fn count_admins(&self) -> StoreResult<i64> {
        Ok(self.with(|t| t.users.iter().filter(|u| u.role == Role::Admin).count() as i64))
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn create_job(&self, job: NewJob) -> StoreResult<Job> {
        let now = Utc::now();
        let created = Job {
            id: Uuid::new_v4(),
            title: job.title,
            department: job.department,
            skills: job.skills,
            experience_years: job.experience_years,
            description: job.description,
            created_by: Some(job.created_by),
            cv_count: 0,
            shortlist_threshold: job.thresholds.shortlist,
            reject_threshold: job.thresholds.reject,
            status: job.status,
            company_id: job.company_id,
            created_at: now,
            updated_at: now,
        };
        self.with(|t| t.jobs.push(created.clone()));
        Ok(created)
    }

    async fn find_job(&self, id: Uuid) -> StoreResult<Option<Job>> {
        Ok(self.with(|t| t.jobs.iter().find(|j| j.id == id).cloned()))
    }

    async fn list_jobs(&self, company: CompanyFilter) -> StoreResult<Vec<Job>> {
        Ok(self.with(|t| {
            t.jobs
                .iter()
                .rev()
                .filter(|j| company.matches(j.company_id))
                .cloned()
                .collect()
        }))
    }

    async fn update_job(&self, id: Uuid, changes: &JobChanges) -> StoreResult<Option<Job>> {
        Ok(self.with(|t| {
            t.jobs.iter_mut().find(|j| j.id == id).map(|job| {
                *job = changes.apply_to(job);
                job.updated_at = Utc::now();
                job.clone()
            })
        }))
    }

    async fn adjust_cv_count(&self, id: Uuid, delta: i32) -> StoreResult<()> {
        self.with(|t| {
            if let Some(job) = t.jobs.iter_mut().find(|j| j.id == id) {
                job.cv_count = (job.cv_count + delta).max(0);
            }
        });
        Ok(())
    }

    async fn delete_job_cascade(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.with(|t| {
            t.candidates.retain(|c| c.job_id != id);
            t.resumes.retain(|r| r.job_id != id);
            let before = t.jobs.len();
            t.jobs.retain(|j| j.id != id);
            t.jobs.len() < before
        }))
    }
}

#[async_trait]
impl ResumeStore for MemoryStore {
    async fn create_resume(&self, resume: NewResume) -> StoreResult<Resume> {
        let created = Resume {
            id: resume.id,
            job_id: resume.job_id,
            file_name: resume.file_name,
            storage_path: resume.storage_path,
            extracted_text: resume.extracted_text,
            file_size_bytes: resume.file_size_bytes,
            uploaded_by: Some(resume.uploaded_by),
            company_id: resume.company_id,
            created_at: Utc::now(),
        };
        self.with(|t| {
            if t.resumes.iter().any(|r| r.id == created.id) {
                return Err(StoreError::Duplicate("Resume"));
            }
            t.resumes.push(created.clone());
            Ok(created)
        })
    }

    async fn find_resume(&self, id: Uuid) -> StoreResult<Option<Resume>> {
        Ok(self.with(|t| t.resumes.iter().find(|r| r.id == id).cloned()))
    }

    async fn list_resumes_for_job(&self, job_id: Uuid) -> StoreResult<Vec<Resume>> {
        Ok(self.with(|t| {
            t.resumes
                .iter()
                .rev()
                .filter(|r| r.job_id == job_id)
                .cloned()
                .collect()
        }))
    }

    async fn delete_resume_cascade(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.with(|t| {
            t.candidates.retain(|c| c.resume_id != Some(id));
            let before = t.resumes.len();
            t.resumes.retain(|r| r.id != id);
            t.resumes.len() < before
        }))
    }
}

#[async_trait]
impl CandidateStore for MemoryStore {
    async fn create_candidate(&self, candidate: NewCandidate) -> StoreResult<Candidate> {
        let now = Utc::now();
        let created = Candidate {
            id: Uuid::new_v4(),
            name: candidate.name,
            email: candidate.email,
            phone: candidate.phone,
            job_id: candidate.job_id,
            resume_id: candidate.resume_id,
            extracted_text: candidate.extracted_text,
            relevance_score: candidate.relevance_score,
            strengths: candidate.strengths,
            weaknesses: candidate.weaknesses,
            feedback: candidate.feedback,
            status: candidate.status,
            company_id: candidate.company_id,
            created_at: now,
            updated_at: now,
        };
        self.with(|t| t.candidates.push(created.clone()));
        Ok(created)
    }

    async fn find_candidate(&self, id: Uuid) -> StoreResult<Option<Candidate>> {
        Ok(self.with(|t| t.candidates.iter().find(|c| c.id == id).cloned()))
    }

    async fn list_candidates(&self, query: &CandidateQuery) -> StoreResult<Vec<Candidate>> {
        let mut candidates: Vec<Candidate> = self.with(|t| {
            t.candidates
                .iter()
                .rev()
                .filter(|c| query.company.matches(c.company_id))
                .filter(|c| query.job_id.map_or(true, |id| c.job_id == id))
                .filter(|c| query.status.map_or(true, |s| c.status == s))
                .cloned()
                .collect()
        });
        // Stable sort keeps newest-first among equal scores.
        candidates.sort_by(|a, b| match (a.relevance_score, b.relevance_score) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        Ok(candidates)
    }

    async fn job_scores(&self, job_ids: &[Uuid]) -> StoreResult<Vec<JobScore>> {
        Ok(self.with(|t| {
            t.candidates
                .iter()
                .filter(|c| job_ids.contains(&c.job_id))
                .filter_map(|c| {
                    c.relevance_score.map(|score| JobScore {
                        job_id: c.job_id,
                        score,
                    })
                })
                .collect()
        }))
    }

    async fn update_candidate_status(
        &self,
        id: Uuid,
        status: CandidateStatus,
    ) -> StoreResult<Option<Candidate>> {
        Ok(self.with(|t| {
            t.candidates.iter_mut().find(|c| c.id == id).map(|c| {
                c.status = status;
                c.updated_at = Utc::now();
                c.clone()
            })
        }))
    }

    async fn record_evaluation(
        &self,
        id: Uuid,
        evaluation: &Evaluation,
    ) -> StoreResult<Option<Candidate>> {
        Ok(self.with(|t| {
            t.candidates.iter_mut().find(|c| c.id == id).map(|c| {
                c.relevance_score = evaluation.relevance_score;
                c.strengths = evaluation.strengths.clone();
                c.weaknesses = evaluation.weaknesses.clone();
                c.feedback = evaluation.feedback.clone();
                c.status = evaluation.status;
                c.updated_at = Utc::now();
                c.clone()
            })
        }))
    }

    async fn delete_candidate(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.with(|t| {
            let before = t.candidates.len();
            t.candidates.retain(|c| c.id != id);
            t.candidates.len() < before
        }))
    }
}
