//! `POST /api/dispensary/provision` — create (or surface) the caller's
//! dispensary account and persist the linkage on the profile.

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::db::repository::{get_profile, set_dispensary_link};
use crate::models::DispensaryAccountType;

#[derive(Deserialize)]
pub struct ProvisionRequest {
    pub account_type: DispensaryAccountType,
}

#[derive(Serialize)]
pub struct ProvisionResponse {
    pub account_id: String,
    pub dispensary_url: String,
    /// Configured discount surfaced next to the storefront link.
    pub discount_percent: u8,
}

pub async fn provision(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<ProvisionRequest>,
) -> Result<Json<ProvisionResponse>, ApiError> {
    let conn = ctx.state.open_db()?;
    let profile = get_profile(&conn, &auth.profile_id)?
        .ok_or_else(|| ApiError::NotFound("Profile not found".into()))?;

    // Already linked: surface the stored linkage, no second remote call
    if let (Some(account_id), Some(dispensary_url)) =
        (&profile.dispensary_account_id, &profile.dispensary_url)
    {
        return Ok(Json(ProvisionResponse {
            account_id: account_id.clone(),
            dispensary_url: dispensary_url.clone(),
            discount_percent: ctx.state.config.dispensary_discount_percent,
        }));
    }

    let account = ctx
        .state
        .dispensary
        .provision_account(
            &profile.id.to_string(),
            &profile.email,
            &profile.display_name,
            payload.account_type,
        )
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;

    set_dispensary_link(&conn, &profile.id, &account.account_id, &account.dispensary_url)?;

    tracing::info!(
        profile_id = %profile.id,
        account_id = %account.account_id,
        "Dispensary account provisioned"
    );

    Ok(Json(ProvisionResponse {
        account_id: account.account_id,
        dispensary_url: account.dispensary_url,
        discount_percent: ctx.state.config.dispensary_discount_percent,
    }))
}
