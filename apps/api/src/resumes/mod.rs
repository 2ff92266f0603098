pub mod extract;
pub mod handlers;
pub mod profile;
pub mod staging;

use tracing::warn;
use uuid::Uuid;

use crate::errors::{required, AppError};
use crate::models::resume::{NewResume, Resume};
use crate::store::{ResumeStore, Store};

/// Stores the row, then writes its sidecar. If the write fails the row is
/// taken back out, so a sidecar never exists without its resume.
pub async fn persist_resume(store: &dyn Store, resume: NewResume) -> Result<Resume, AppError> {
    let text = resume.extracted_text.clone();
    let stored = store.create_resume(resume).await?;
    if let Err(e) = tokio::fs::write(stored.sidecar_path(), &text).await {
        store.delete_resume_cascade(stored.id).await?;
        return Err(AppError::Internal(e.into()));
    }
    Ok(stored)
}

/// Deletes a resume's sidecar text file. A file that is already gone is fine;
/// other failures are logged and do not fail the request.
pub async fn remove_sidecar(resume: &Resume) {
    let path = resume.sidecar_path();
    match tokio::fs::remove_file(&path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), "Failed to remove sidecar: {e}"),
    }
}

/// Parses a required id carried in a multipart text field.
pub fn parse_uuid(value: Option<&str>, field: &str) -> Result<Uuid, AppError> {
    let raw = required(value, field)?;
    Uuid::parse_str(raw).map_err(|_| AppError::Validation(format!("{field} is not a valid id")))
}
