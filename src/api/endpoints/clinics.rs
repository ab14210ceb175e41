//! Clinic signup and admin endpoints.
//!
//! `POST /api/clinics` — create a clinic, caller becomes its admin
//! `PUT  /api/clinics/:id/branding` — admin-only branding update

use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::db::repository::{
    get_clinic, get_clinic_by_slug, get_profile, insert_clinic, set_profile_clinic,
    update_clinic_branding,
};
use crate::models::{Clinic, SubscriptionStatus};
use crate::tenant::is_valid_slug;

#[derive(Deserialize)]
pub struct CreateClinicRequest {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub primary_color: Option<String>,
    #[serde(default)]
    pub accent_color: Option<String>,
    #[serde(default)]
    pub dispensary_url: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateBrandingRequest {
    pub name: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub primary_color: Option<String>,
    #[serde(default)]
    pub accent_color: Option<String>,
    #[serde(default)]
    pub dispensary_url: Option<String>,
}

/// `POST /api/clinics` — clinic signup.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreateClinicRequest>,
) -> Result<Json<Clinic>, ApiError> {
    if !is_valid_slug(&payload.slug) {
        return Err(ApiError::BadRequest(
            "Slug must be lowercase letters, digits and single hyphens".into(),
        ));
    }
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Clinic name is required".into()));
    }

    let conn = ctx.state.open_db()?;

    let profile = get_profile(&conn, &auth.profile_id)?
        .ok_or_else(|| ApiError::NotFound("Profile not found".into()))?;
    if profile.clinic_id.is_some() {
        return Err(ApiError::Conflict(
            "Profile is already linked to a clinic".into(),
        ));
    }
    if get_clinic_by_slug(&conn, &payload.slug)?.is_some() {
        return Err(ApiError::Conflict("Slug already taken".into()));
    }

    let clinic = Clinic {
        id: Uuid::new_v4(),
        slug: payload.slug,
        name: payload.name.trim().to_string(),
        logo_url: payload.logo_url,
        primary_color: payload.primary_color,
        accent_color: payload.accent_color,
        subscription_status: SubscriptionStatus::Active,
        dispensary_url: payload.dispensary_url,
        admin_profile_id: auth.profile_id,
        created_at: Utc::now(),
    };
    insert_clinic(&conn, &clinic)?;
    set_profile_clinic(&conn, &auth.profile_id, &clinic.id)?;

    tracing::info!(clinic_id = %clinic.id, slug = %clinic.slug, "Clinic created");

    Ok(Json(clinic))
}

/// `PUT /api/clinics/:id/branding` — only the clinic admin may rebrand.
pub async fn update_branding(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBrandingRequest>,
) -> Result<Json<Clinic>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Clinic name is required".into()));
    }

    let conn = ctx.state.open_db()?;
    let clinic = get_clinic(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound("Clinic not found".into()))?;
    if clinic.admin_profile_id != auth.profile_id {
        return Err(ApiError::Forbidden(
            "Only the clinic admin may update branding".into(),
        ));
    }

    update_clinic_branding(
        &conn,
        &id,
        payload.name.trim(),
        payload.logo_url.as_deref(),
        payload.primary_color.as_deref(),
        payload.accent_color.as_deref(),
        payload.dispensary_url.as_deref(),
    )?;

    let updated = get_clinic(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound("Clinic not found".into()))?;
    Ok(Json(updated))
}
