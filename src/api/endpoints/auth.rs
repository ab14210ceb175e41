//! Authentication endpoints.
//!
//! `POST /api/auth/signup` — create a profile, returns a session token
//! `POST /api/auth/signin` — verify credentials, returns a session token
//! `POST /api/auth/signout` — drop the session (protected)
//! `GET  /api/auth/me` — current profile (protected)

use axum::extract::State;
use axum::http::HeaderMap;
use axum::{Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::password::{hash_password, verify_password};
use crate::api::types::{generate_token, hash_token, ApiContext, AuthContext};
use crate::db::repository::{get_profile, get_profile_by_email, insert_profile};
use crate::models::Profile;

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub accept_terms: bool,
    #[serde(default)]
    pub data_consent: bool,
}

#[derive(Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub profile: Profile,
}

/// `POST /api/auth/signup` — create a profile and sign it in.
pub async fn signup(
    State(ctx): State<ApiContext>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let email = payload.email.trim().to_lowercase();
    if !email.contains('@') || email.len() < 5 {
        return Err(ApiError::BadRequest("Invalid email address".into()));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "Password must be at least 8 characters".into(),
        ));
    }
    if payload.display_name.trim().is_empty() {
        return Err(ApiError::BadRequest("Display name is required".into()));
    }
    if !payload.accept_terms {
        return Err(ApiError::BadRequest(
            "Terms must be accepted to create an account".into(),
        ));
    }

    let conn = ctx.state.open_db()?;
    if get_profile_by_email(&conn, &email)?.is_some() {
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password(&payload.password);

    let profile = Profile {
        id: Uuid::new_v4(),
        email,
        display_name: payload.display_name.trim().to_string(),
        password_hash,
        clinic_id: None,
        terms_accepted: payload.accept_terms,
        data_consent: payload.data_consent,
        dispensary_account_id: None,
        dispensary_url: None,
        created_at: Utc::now(),
    };
    insert_profile(&conn, &profile)?;

    tracing::info!(profile_id = %profile.id, "Profile created");

    Ok(Json(issue_session(&ctx, profile)?))
}

/// `POST /api/auth/signin` — verify credentials.
///
/// A wrong email and a wrong password are indistinguishable to the caller.
pub async fn signin(
    State(ctx): State<ApiContext>,
    Json(payload): Json<SigninRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let conn = ctx.state.open_db()?;
    let profile = get_profile_by_email(&conn, payload.email.trim())?
        .ok_or(ApiError::Unauthorized)?;

    if !verify_password(&payload.password, &profile.password_hash) {
        return Err(ApiError::Unauthorized);
    }

    Ok(Json(issue_session(&ctx, profile)?))
}

/// `POST /api/auth/signout` — invalidate the presented token.
pub async fn signout(
    State(ctx): State<ApiContext>,
    Extension(_auth): Extension<AuthContext>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let token = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    let mut sessions = ctx
        .sessions
        .lock()
        .map_err(|_| ApiError::Internal("session lock".into()))?;
    sessions.remove(&hash_token(token));

    Ok(Json(serde_json::json!({ "signed_out": true })))
}

/// `GET /api/auth/me` — the signed-in profile.
pub async fn me(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Profile>, ApiError> {
    let conn = ctx.state.open_db()?;
    let profile = get_profile(&conn, &auth.profile_id)?
        .ok_or_else(|| ApiError::NotFound("Profile not found".into()))?;
    Ok(Json(profile))
}

fn issue_session(ctx: &ApiContext, profile: Profile) -> Result<SessionResponse, ApiError> {
    let token = generate_token();
    let mut sessions = ctx
        .sessions
        .lock()
        .map_err(|_| ApiError::Internal("session lock".into()))?;
    sessions.insert(hash_token(&token), profile.id);
    Ok(SessionResponse { token, profile })
}
