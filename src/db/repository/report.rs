use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::profile::{parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::{LabReport, ReportStatus};

pub fn insert_report(conn: &Connection, report: &LabReport) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO lab_reports (id, profile_id, file_name, file_path, content_type,
         size_bytes, status, analysis, failure_reason, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            report.id.to_string(),
            report.profile_id.to_string(),
            report.file_name,
            report.file_path,
            report.content_type,
            report.size_bytes,
            report.status.as_str(),
            report.analysis,
            report.failure_reason,
            report.created_at.to_rfc3339(),
            report.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_report(conn: &Connection, id: &Uuid) -> Result<Option<LabReport>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("{REPORT_SELECT} WHERE id = ?1"),
            params![id.to_string()],
            report_row_from_rusqlite,
        )
        .optional()?;
    row.map(report_from_row).transpose()
}

pub fn list_reports_for_profile(
    conn: &Connection,
    profile_id: &Uuid,
) -> Result<Vec<LabReport>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{REPORT_SELECT} WHERE profile_id = ?1 ORDER BY created_at DESC"
    ))?;

    let rows = stmt.query_map(params![profile_id.to_string()], |row| {
        Ok(report_row_from_rusqlite(row))
    })?;

    let mut reports = Vec::new();
    for row in rows {
        reports.push(report_from_row(row??)?);
    }
    Ok(reports)
}

/// Transition a report's status, enforcing the linear lifecycle.
/// Illegal transitions (leaving a terminal state, skipping `processing`)
/// are constraint violations, not silent updates.
pub fn transition_report(
    conn: &Connection,
    id: &Uuid,
    next: ReportStatus,
    analysis: Option<&str>,
    failure_reason: Option<&str>,
) -> Result<LabReport, DatabaseError> {
    let current = get_report(conn, id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "lab_report".into(),
        id: id.to_string(),
    })?;

    if !current.status.can_transition_to(next) {
        return Err(DatabaseError::ConstraintViolation(format!(
            "illegal report transition {} -> {}",
            current.status.as_str(),
            next.as_str()
        )));
    }

    let now: DateTime<Utc> = Utc::now();
    conn.execute(
        "UPDATE lab_reports SET status = ?2, analysis = ?3, failure_reason = ?4, updated_at = ?5
         WHERE id = ?1",
        params![
            id.to_string(),
            next.as_str(),
            analysis,
            failure_reason,
            now.to_rfc3339(),
        ],
    )?;

    Ok(LabReport {
        status: next,
        analysis: analysis.map(String::from),
        failure_reason: failure_reason.map(String::from),
        updated_at: now,
        ..current
    })
}

/// Explicit user deletion. Returns the deleted row so the caller can
/// remove the stored file afterwards.
pub fn delete_report(conn: &Connection, id: &Uuid) -> Result<LabReport, DatabaseError> {
    let report = get_report(conn, id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "lab_report".into(),
        id: id.to_string(),
    })?;
    conn.execute(
        "DELETE FROM lab_reports WHERE id = ?1",
        params![id.to_string()],
    )?;
    Ok(report)
}

const REPORT_SELECT: &str = "SELECT id, profile_id, file_name, file_path, content_type,
     size_bytes, status, analysis, failure_reason, created_at, updated_at
     FROM lab_reports";

// Internal row type for LabReport mapping
struct ReportRow {
    id: String,
    profile_id: String,
    file_name: String,
    file_path: String,
    content_type: String,
    size_bytes: i64,
    status: String,
    analysis: Option<String>,
    failure_reason: Option<String>,
    created_at: String,
    updated_at: String,
}

fn report_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ReportRow, rusqlite::Error> {
    Ok(ReportRow {
        id: row.get(0)?,
        profile_id: row.get(1)?,
        file_name: row.get(2)?,
        file_path: row.get(3)?,
        content_type: row.get(4)?,
        size_bytes: row.get(5)?,
        status: row.get(6)?,
        analysis: row.get(7)?,
        failure_reason: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn report_from_row(row: ReportRow) -> Result<LabReport, DatabaseError> {
    Ok(LabReport {
        id: parse_uuid(&row.id)?,
        profile_id: parse_uuid(&row.profile_id)?,
        file_name: row.file_name,
        file_path: row.file_path,
        content_type: row.content_type,
        size_bytes: row.size_bytes,
        status: ReportStatus::from_str(&row.status)?,
        analysis: row.analysis,
        failure_reason: row.failure_reason,
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
    })
}
