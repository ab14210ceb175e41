use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::profile::{parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::{Clinic, SubscriptionStatus};

pub fn insert_clinic(conn: &Connection, clinic: &Clinic) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO clinics (id, slug, name, logo_url, primary_color, accent_color,
         subscription_status, dispensary_url, admin_profile_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            clinic.id.to_string(),
            clinic.slug,
            clinic.name,
            clinic.logo_url,
            clinic.primary_color,
            clinic.accent_color,
            clinic.subscription_status.as_str(),
            clinic.dispensary_url,
            clinic.admin_profile_id.to_string(),
            clinic.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// The tenant resolver's single round trip: slug in, clinic row or nothing out.
pub fn get_clinic_by_slug(conn: &Connection, slug: &str) -> Result<Option<Clinic>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("{CLINIC_SELECT} WHERE slug = ?1"),
            params![slug],
            clinic_row_from_rusqlite,
        )
        .optional()?;
    row.map(clinic_from_row).transpose()
}

pub fn get_clinic(conn: &Connection, id: &Uuid) -> Result<Option<Clinic>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("{CLINIC_SELECT} WHERE id = ?1"),
            params![id.to_string()],
            clinic_row_from_rusqlite,
        )
        .optional()?;
    row.map(clinic_from_row).transpose()
}

/// Branding fields mutable by the clinic admin. Everything else
/// (slug, subscription) stays fixed through this path.
pub fn update_clinic_branding(
    conn: &Connection,
    id: &Uuid,
    name: &str,
    logo_url: Option<&str>,
    primary_color: Option<&str>,
    accent_color: Option<&str>,
    dispensary_url: Option<&str>,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE clinics SET name = ?2, logo_url = ?3, primary_color = ?4,
         accent_color = ?5, dispensary_url = ?6 WHERE id = ?1",
        params![
            id.to_string(),
            name,
            logo_url,
            primary_color,
            accent_color,
            dispensary_url
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "clinic".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

const CLINIC_SELECT: &str = "SELECT id, slug, name, logo_url, primary_color, accent_color,
     subscription_status, dispensary_url, admin_profile_id, created_at
     FROM clinics";

// Internal row type for Clinic mapping
struct ClinicRow {
    id: String,
    slug: String,
    name: String,
    logo_url: Option<String>,
    primary_color: Option<String>,
    accent_color: Option<String>,
    subscription_status: String,
    dispensary_url: Option<String>,
    admin_profile_id: String,
    created_at: String,
}

fn clinic_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ClinicRow, rusqlite::Error> {
    Ok(ClinicRow {
        id: row.get(0)?,
        slug: row.get(1)?,
        name: row.get(2)?,
        logo_url: row.get(3)?,
        primary_color: row.get(4)?,
        accent_color: row.get(5)?,
        subscription_status: row.get(6)?,
        dispensary_url: row.get(7)?,
        admin_profile_id: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn clinic_from_row(row: ClinicRow) -> Result<Clinic, DatabaseError> {
    Ok(Clinic {
        id: parse_uuid(&row.id)?,
        slug: row.slug,
        name: row.name,
        logo_url: row.logo_url,
        primary_color: row.primary_color,
        accent_color: row.accent_color,
        subscription_status: SubscriptionStatus::from_str(&row.subscription_status)?,
        dispensary_url: row.dispensary_url,
        admin_profile_id: parse_uuid(&row.admin_profile_id)?,
        created_at: parse_timestamp(&row.created_at)?,
    })
}
