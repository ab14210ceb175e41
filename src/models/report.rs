use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ReportStatus;

/// A user-owned lab report upload.
///
/// Created on upload in `pending`, moved to `processing` when the
/// remote analysis is invoked, and lands in exactly one of the two
/// terminal states. Deleted only by explicit user action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabReport {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub file_name: String,
    /// Stored file path relative to the uploads directory.
    pub file_path: String,
    /// Sniffed from magic bytes at upload, never trusted from the client.
    pub content_type: String,
    pub size_bytes: i64,
    pub status: ReportStatus,
    /// Free-text/JSON-hybrid payload returned by the analysis service.
    pub analysis: Option<String>,
    /// Why the report failed, when it did.
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LabReport {
    pub fn new(profile_id: Uuid, file_name: &str, file_path: &str, content_type: &str, size_bytes: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            profile_id,
            file_name: file_name.to_string(),
            file_path: file_path.to_string(),
            content_type: content_type.to_string(),
            size_bytes,
            status: ReportStatus::Pending,
            analysis: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }
}
