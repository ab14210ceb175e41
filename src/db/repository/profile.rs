use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Profile;

pub fn insert_profile(conn: &Connection, profile: &Profile) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO profiles (id, email, display_name, password_hash, clinic_id,
         terms_accepted, data_consent, dispensary_account_id, dispensary_url, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            profile.id.to_string(),
            profile.email,
            profile.display_name,
            profile.password_hash,
            profile.clinic_id.map(|id| id.to_string()),
            profile.terms_accepted,
            profile.data_consent,
            profile.dispensary_account_id,
            profile.dispensary_url,
            profile.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_profile(conn: &Connection, id: &Uuid) -> Result<Option<Profile>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("{PROFILE_SELECT} WHERE id = ?1"),
            params![id.to_string()],
            profile_row_from_rusqlite,
        )
        .optional()?;
    row.map(profile_from_row).transpose()
}

pub fn get_profile_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<Profile>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("{PROFILE_SELECT} WHERE email = ?1 COLLATE NOCASE"),
            params![email],
            profile_row_from_rusqlite,
        )
        .optional()?;
    row.map(profile_from_row).transpose()
}

/// Link a profile to the clinic it administers or belongs to.
pub fn set_profile_clinic(
    conn: &Connection,
    profile_id: &Uuid,
    clinic_id: &Uuid,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE profiles SET clinic_id = ?2 WHERE id = ?1",
        params![profile_id.to_string(), clinic_id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "profile".into(),
            id: profile_id.to_string(),
        });
    }
    Ok(())
}

/// Persist the dispensary account linkage returned by provisioning.
pub fn set_dispensary_link(
    conn: &Connection,
    profile_id: &Uuid,
    account_id: &str,
    dispensary_url: &str,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE profiles SET dispensary_account_id = ?2, dispensary_url = ?3 WHERE id = ?1",
        params![profile_id.to_string(), account_id, dispensary_url],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "profile".into(),
            id: profile_id.to_string(),
        });
    }
    Ok(())
}

const PROFILE_SELECT: &str = "SELECT id, email, display_name, password_hash, clinic_id,
     terms_accepted, data_consent, dispensary_account_id, dispensary_url, created_at
     FROM profiles";

// Internal row type for Profile mapping
struct ProfileRow {
    id: String,
    email: String,
    display_name: String,
    password_hash: String,
    clinic_id: Option<String>,
    terms_accepted: bool,
    data_consent: bool,
    dispensary_account_id: Option<String>,
    dispensary_url: Option<String>,
    created_at: String,
}

fn profile_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ProfileRow, rusqlite::Error> {
    Ok(ProfileRow {
        id: row.get(0)?,
        email: row.get(1)?,
        display_name: row.get(2)?,
        password_hash: row.get(3)?,
        clinic_id: row.get(4)?,
        terms_accepted: row.get(5)?,
        data_consent: row.get(6)?,
        dispensary_account_id: row.get(7)?,
        dispensary_url: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn profile_from_row(row: ProfileRow) -> Result<Profile, DatabaseError> {
    Ok(Profile {
        id: parse_uuid(&row.id)?,
        email: row.email,
        display_name: row.display_name,
        password_hash: row.password_hash,
        clinic_id: row.clinic_id.as_deref().map(parse_uuid).transpose()?,
        terms_accepted: row.terms_accepted,
        data_consent: row.data_consent,
        dispensary_account_id: row.dispensary_account_id,
        dispensary_url: row.dispensary_url,
        created_at: parse_timestamp(&row.created_at)?,
    })
}

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::from_str(s).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}
