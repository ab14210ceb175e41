//! Lab report endpoints — upload, list, view, analyze, delete.
//!
//! `POST   /api/reports` — receive a base64 upload, store it, insert `pending`
//! `GET    /api/reports` — the caller's reports, newest first
//! `GET    /api/reports/:id` — one report (owner only)
//! `POST   /api/reports/:id/analyze` — invoke the remote analysis once
//! `DELETE /api/reports/:id` — explicit user deletion

use axum::extract::{Path, State};
use axum::{Extension, Json};
use base64::Engine;
use serde::Deserialize;
use uuid::Uuid;

use crate::analysis::{AnalysisRequest, FunctionalRange, Observation, PatientProfile};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::db::repository::{
    delete_report, get_profile, get_report, insert_report, list_reports_for_profile,
    transition_report,
};
use crate::models::{LabReport, ReportStatus};

#[derive(Deserialize)]
pub struct UploadRequest {
    pub file_name: String,
    /// Base64 file content, raw or as a data URL
    /// (`data:application/pdf;base64,...`).
    pub data: String,
}

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    pub patient: PatientProfile,
    pub observations: Vec<Observation>,
    #[serde(default)]
    pub functional_ranges: Vec<FunctionalRange>,
}

/// `POST /api/reports` — validate, store, insert as `pending`.
///
/// Validation failures are 400s and change nothing; consent is checked
/// once here, at the upload boundary.
pub async fn upload(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<UploadRequest>,
) -> Result<Json<LabReport>, ApiError> {
    let conn = ctx.state.open_db()?;
    let profile = get_profile(&conn, &auth.profile_id)?
        .ok_or_else(|| ApiError::NotFound("Profile not found".into()))?;
    if !profile.consented() {
        return Err(ApiError::ConsentRequired);
    }

    if payload.file_name.trim().is_empty() {
        return Err(ApiError::BadRequest("File name is required".into()));
    }

    let bytes = decode_data_url(&payload.data)
        .map_err(|e| ApiError::BadRequest(format!("Invalid file data: {e}")))?;
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("File is empty".into()));
    }
    if bytes.len() > ctx.state.config.max_upload_bytes {
        return Err(ApiError::BadRequest(format!(
            "File exceeds {} byte size limit ({} bytes)",
            ctx.state.config.max_upload_bytes,
            bytes.len()
        )));
    }

    // Content type comes from magic bytes, never from the client
    let (content_type, ext) = detect_content_type(&bytes).ok_or_else(|| {
        ApiError::BadRequest("Unsupported file type: expected PDF, JPEG or PNG".into())
    })?;

    let report_id = Uuid::new_v4();
    let relative_path = format!("{report_id}.{ext}");

    let uploads_dir = ctx.state.config.uploads_dir();
    std::fs::create_dir_all(&uploads_dir)
        .map_err(|e| ApiError::Internal(format!("Uploads directory: {e}")))?;
    std::fs::write(uploads_dir.join(&relative_path), &bytes)
        .map_err(|e| ApiError::Internal(format!("Failed to store upload: {e}")))?;

    let report = LabReport {
        id: report_id,
        ..LabReport::new(
            auth.profile_id,
            payload.file_name.trim(),
            &relative_path,
            content_type,
            bytes.len() as i64,
        )
    };
    insert_report(&conn, &report)?;

    tracing::info!(
        report_id = %report.id,
        profile_id = %auth.profile_id,
        content_type,
        size_bytes = bytes.len(),
        "Report uploaded"
    );

    Ok(Json(report))
}

/// `GET /api/reports` — the caller's reports.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<LabReport>>, ApiError> {
    let conn = ctx.state.open_db()?;
    let reports = list_reports_for_profile(&conn, &auth.profile_id)?;
    Ok(Json(reports))
}

/// `GET /api/reports/:id` — owner only; anyone else sees a 404.
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<LabReport>, ApiError> {
    let conn = ctx.state.open_db()?;
    let report = owned_report(&conn, &id, &auth)?;
    Ok(Json(report))
}

/// `POST /api/reports/:id/analyze` — fire the remote analysis once.
///
/// pending → processing → completed | failed. A transport failure or an
/// unsuccessful upstream status leaves the report `failed` with a reason;
/// there is no retry path.
pub async fn analyze(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<Json<LabReport>, ApiError> {
    let conn = ctx.state.open_db()?;
    let report = owned_report(&conn, &id, &auth)?;

    if report.status != ReportStatus::Pending {
        return Err(ApiError::Conflict(format!(
            "Report is {} and cannot be analyzed",
            report.status.as_str()
        )));
    }

    transition_report(&conn, &id, ReportStatus::Processing, None, None)?;

    let request = AnalysisRequest {
        report_id: id.to_string(),
        patient: payload.patient,
        observations: payload.observations,
        functional_ranges: payload.functional_ranges,
    };

    match ctx.state.analysis.analyze(&request).await {
        Ok(outcome) if outcome.is_success() => {
            let analysis = outcome.analysis.to_string();
            let updated = transition_report(
                &conn,
                &id,
                ReportStatus::Completed,
                Some(&analysis),
                None,
            )?;
            tracing::info!(report_id = %id, "Report analysis completed");
            Ok(Json(updated))
        }
        Ok(outcome) => {
            let reason = format!("analysis service reported status {:?}", outcome.status);
            transition_report(&conn, &id, ReportStatus::Failed, None, Some(&reason))?;
            tracing::warn!(report_id = %id, reason, "Report analysis failed");
            Err(ApiError::Upstream(reason))
        }
        Err(e) => {
            let reason = e.to_string();
            transition_report(&conn, &id, ReportStatus::Failed, None, Some(&reason))?;
            tracing::warn!(report_id = %id, error = %reason, "Report analysis failed");
            Err(ApiError::Upstream(reason))
        }
    }
}

/// `DELETE /api/reports/:id` — remove the row, then the stored file.
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = ctx.state.open_db()?;
    owned_report(&conn, &id, &auth)?;
    let deleted = delete_report(&conn, &id)?;

    let stored = ctx.state.config.uploads_dir().join(&deleted.file_path);
    if let Err(e) = std::fs::remove_file(&stored) {
        tracing::warn!(report_id = %id, error = %e, "Failed to delete stored upload");
    }

    tracing::info!(report_id = %id, profile_id = %auth.profile_id, "Report deleted");
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Load a report and enforce ownership. A foreign report is a 404, not
/// a 403 — existence is not leaked across profiles.
fn owned_report(
    conn: &rusqlite::Connection,
    id: &Uuid,
    auth: &AuthContext,
) -> Result<LabReport, ApiError> {
    let report = get_report(conn, id)?
        .ok_or_else(|| ApiError::NotFound("Report not found".into()))?;
    if report.profile_id != auth.profile_id {
        return Err(ApiError::NotFound("Report not found".into()));
    }
    Ok(report)
}

/// Decode a base64 data URL to raw bytes.
///
/// Handles both `data:application/pdf;base64,...` and raw base64 strings.
fn decode_data_url(data_url: &str) -> Result<Vec<u8>, String> {
    let base64_data = match data_url.find(',') {
        Some(idx) => &data_url[idx + 1..],
        None => data_url,
    };

    base64::engine::general_purpose::STANDARD
        .decode(base64_data)
        .map_err(|e| format!("Base64 decode failed: {e}"))
}

/// Detect an accepted upload type from magic bytes.
fn detect_content_type(bytes: &[u8]) -> Option<(&'static str, &'static str)> {
    if bytes.len() >= 5 && &bytes[0..5] == b"%PDF-" {
        Some(("application/pdf", "pdf"))
    } else if bytes.len() >= 3 && bytes[0..3] == [0xFF, 0xD8, 0xFF] {
        Some(("image/jpeg", "jpg"))
    } else if bytes.len() >= 8 && bytes[0..8] == [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A] {
        Some(("image/png", "png"))
    } else {
        None
    }
}
