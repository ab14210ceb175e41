//! `GET /api/catalog` — the public (direct-to-consumer) catalog.
//!
//! Prices are computed on demand by the pricing engine; they are a view
//! artifact, never read back from storage. Advanced panels are filtered
//! by the public capability set.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::access::{self, Capabilities, TenantContext};
use crate::api::types::ApiContext;
use crate::catalog::PricedPanel;

#[derive(Serialize)]
pub struct CatalogResponse {
    pub currency: String,
    pub capabilities: Capabilities,
    pub panels: Vec<PricedPanel>,
}

pub async fn public_catalog(State(ctx): State<ApiContext>) -> Json<CatalogResponse> {
    let capabilities = access::resolve(
        &TenantContext::Public,
        ctx.state.config.dispensary_discount_percent,
    );
    Json(catalog_response(&ctx, capabilities))
}

/// Price the catalog and apply a capability set's panel visibility.
pub(super) fn catalog_response(ctx: &ApiContext, capabilities: Capabilities) -> CatalogResponse {
    let panels = ctx
        .state
        .catalog
        .priced_panels()
        .into_iter()
        .filter(|priced| capabilities.advanced_panels || !priced.panel.advanced)
        .collect();

    CatalogResponse {
        currency: ctx.state.catalog.currency().to_string(),
        capabilities,
        panels,
    }
}
