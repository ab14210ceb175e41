//! Checkout endpoints.
//!
//! `POST /api/checkout` — price the selected panels, create an order,
//! and open an external checkout session.
//! `POST /api/orders/:id/confirm` — mark the order paid after the
//! checkout redirect returns.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::db::repository::{get_order, insert_order, mark_order_paid};
use crate::models::Order;

#[derive(Deserialize)]
pub struct CheckoutRequest {
    pub panel_ids: Vec<String>,
    pub return_url: String,
}

#[derive(Serialize)]
pub struct CheckoutResponse {
    pub order_id: Uuid,
    pub amount_cents: i64,
    /// External checkout page to redirect the user to.
    pub checkout_url: String,
}

/// `POST /api/checkout` — one order, one session, one redirect URL.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    if payload.panel_ids.is_empty() {
        return Err(ApiError::BadRequest("No panels selected".into()));
    }
    if payload.return_url.trim().is_empty() {
        return Err(ApiError::BadRequest("Return URL is required".into()));
    }

    // Display prices are recomputed here at charge time — the catalog
    // is the only source of pricing truth.
    let mut amount_cents = 0_i64;
    for panel_id in &payload.panel_ids {
        let priced = ctx
            .state
            .catalog
            .priced_panel(panel_id)
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown panel: {panel_id}")))?;
        amount_cents += priced.price_cents;
    }

    let order = Order::new(
        auth.profile_id,
        payload.panel_ids,
        amount_cents,
        payload.return_url.trim(),
    );
    let conn = ctx.state.open_db()?;
    insert_order(&conn, &order)?;

    let session = ctx
        .state
        .checkout
        .create_session(
            &order.id.to_string(),
            order.amount_cents,
            ctx.state.catalog.currency(),
            &order.return_url,
        )
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;

    tracing::info!(order_id = %order.id, amount_cents, "Checkout session created");

    Ok(Json(CheckoutResponse {
        order_id: order.id,
        amount_cents,
        checkout_url: session.checkout_url,
    }))
}

/// `POST /api/orders/:id/confirm` — the return-redirect confirmation.
pub async fn confirm(
    State(ctx): State<ApiContext>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    let conn = ctx.state.open_db()?;
    let order = get_order(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound("Order not found".into()))?;
    if order.profile_id != auth.profile_id {
        return Err(ApiError::NotFound("Order not found".into()));
    }

    let paid = mark_order_paid(&conn, &id)?;
    tracing::info!(order_id = %id, "Order marked paid");
    Ok(Json(paid))
}
