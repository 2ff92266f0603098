use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An ingested resume file. The original upload is discarded after extraction;
/// the extracted text is kept both here and in a sidecar file on disk.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
    pub id: Uuid,
    pub job_id: Uuid,
    pub file_name: String,
    /// Server-side location; never sent to clients.
    #[serde(skip_serializing)]
    pub storage_path: String,
    pub extracted_text: String,
    pub file_size_bytes: i64,
    pub uploaded_by: Option<Uuid>,
    pub company_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Resume {
    pub fn sidecar_path(&self) -> PathBuf {
        sidecar_path_for(&self.storage_path)
    }
}

pub fn sidecar_path_for(storage_path: &str) -> PathBuf {
    PathBuf::from(format!("{storage_path}.txt"))
}

#[derive(Debug, Clone)]
pub struct NewResume {
    pub id: Uuid,
    pub job_id: Uuid,
    pub file_name: String,
    pub storage_path: String,
    pub extracted_text: String,
    pub file_size_bytes: i64,
    pub uploaded_by: Uuid,
    pub company_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_path_stays_server_side() {
        let resume = Resume {
            id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            file_name: "jane.pdf".into(),
            storage_path: "/srv/uploads/abc.pdf".into(),
            extracted_text: "Jane Doe".into(),
            file_size_bytes: 1024,
            uploaded_by: None,
            company_id: Uuid::new_v4(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&resume).unwrap();
        assert!(json.get("storagePath").is_none());
        assert_eq!(json["fileName"], "jane.pdf");
        assert_eq!(resume.sidecar_path(), PathBuf::from("/srv/uploads/abc.pdf.txt"));
    }
}
