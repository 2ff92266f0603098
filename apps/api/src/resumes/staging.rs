//! Streams multipart uploads into request-scoped temporary files.
//!
//! Each file lands in a [`NamedTempFile`] inside the upload directory, so it
//! is removed when the [`StagedForm`] is dropped, whichever way the request
//! ends.

use std::collections::HashMap;
use std::path::Path;

use axum::extract::Multipart;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::errors::AppError;
use crate::resumes::extract::DocumentKind;

#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_file_bytes: usize,
    pub max_files: usize,
}

#[derive(Debug)]
pub struct StagedFile {
    pub file_name: String,
    pub kind: DocumentKind,
    pub size_bytes: u64,
    temp: NamedTempFile,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        self.temp.path()
    }
}

#[derive(Debug, Default)]
pub struct StagedForm {
    pub fields: HashMap<String, String>,
    pub files: Vec<StagedFile>,
}

impl StagedForm {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}

/// Reads the whole form. Files are accepted only under `file_field`; every
/// other part is kept as text.
pub async fn stage_multipart(
    mut multipart: Multipart,
    file_field: &str,
    dir: &Path,
    limits: UploadLimits,
) -> Result<StagedForm, AppError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let mut form = StagedForm::default();

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        let Some(file_name) = field.file_name().map(str::to_string) else {
            form.fields.insert(name, field.text().await?);
            continue;
        };

        if name != file_field {
            return Err(AppError::Validation(format!(
                "Unexpected file field '{name}'; upload files as '{file_field}'"
            )));
        }
        if form.files.len() == limits.max_files {
            return Err(AppError::Validation(format!(
                "At most {} files may be uploaded at once",
                limits.max_files
            )));
        }

        let kind = DocumentKind::from_upload(&file_name, field.content_type())?;
        let temp = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&format!(".{}", kind.extension()))
            .tempfile_in(dir)
            .map_err(|e| AppError::Internal(e.into()))?;
        let mut out = tokio::fs::File::from_std(
            temp.as_file()
                .try_clone()
                .map_err(|e| AppError::Internal(e.into()))?,
        );

        let mut size_bytes: u64 = 0;
        while let Some(chunk) = field.chunk().await? {
            size_bytes += chunk.len() as u64;
            if size_bytes > limits.max_file_bytes as u64 {
                return Err(AppError::Validation(format!(
                    "'{file_name}' exceeds the {} byte upload limit",
                    limits.max_file_bytes
                )));
            }
            out.write_all(&chunk)
                .await
                .map_err(|e| AppError::Internal(e.into()))?;
        }
        out.flush()
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        debug!(file_name = %file_name, size_bytes, "Upload staged");
        form.files.push(StagedFile {
            file_name,
            kind,
            size_bytes,
            temp,
        });
    }

    Ok(form)
}
