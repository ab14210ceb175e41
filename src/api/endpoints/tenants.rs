//! Tenant-slug endpoints.
//!
//! `GET /api/t/:slug` — clinic landing data (branding + capabilities)
//! `GET /api/t/:slug/catalog` — the catalog as this tenant sees it
//!
//! An unknown slug is a plain 404: no clinic-branded payload of any
//! kind leaves the handler.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::access::{self, Capabilities, TenantContext};
use crate::api::endpoints::catalog::{catalog_response, CatalogResponse};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::Clinic;
use crate::tenant::resolve_slug;

/// Branding fields safe for unauthenticated rendering.
#[derive(Serialize)]
pub struct ClinicView {
    pub slug: String,
    pub name: String,
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
    pub accent_color: Option<String>,
}

impl From<&Clinic> for ClinicView {
    fn from(clinic: &Clinic) -> Self {
        Self {
            slug: clinic.slug.clone(),
            name: clinic.name.clone(),
            logo_url: clinic.logo_url.clone(),
            primary_color: clinic.primary_color.clone(),
            accent_color: clinic.accent_color.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct TenantResponse {
    pub clinic: ClinicView,
    pub capabilities: Capabilities,
}

/// `GET /api/t/:slug` — resolve a clinic and its capability set.
pub async fn landing(
    State(ctx): State<ApiContext>,
    Path(slug): Path<String>,
) -> Result<Json<TenantResponse>, ApiError> {
    let (context, clinic) = resolve(&ctx, &slug)?;
    let capabilities =
        access::resolve(&context, ctx.state.config.dispensary_discount_percent);
    Ok(Json(TenantResponse {
        clinic: ClinicView::from(&clinic),
        capabilities,
    }))
}

/// `GET /api/t/:slug/catalog` — capability-gated catalog for a tenant.
pub async fn tenant_catalog(
    State(ctx): State<ApiContext>,
    Path(slug): Path<String>,
) -> Result<Json<CatalogResponse>, ApiError> {
    let (context, _clinic) = resolve(&ctx, &slug)?;
    let capabilities =
        access::resolve(&context, ctx.state.config.dispensary_discount_percent);
    Ok(Json(catalog_response(&ctx, capabilities)))
}

fn resolve(ctx: &ApiContext, slug: &str) -> Result<(TenantContext, Clinic), ApiError> {
    let conn = ctx.state.open_db()?;
    match resolve_slug(&conn, slug)? {
        Some(TenantContext::Clinic(clinic)) => {
            Ok((TenantContext::Clinic(clinic.clone()), clinic))
        }
        _ => Err(ApiError::NotFound("Clinic not found".into())),
    }
}
