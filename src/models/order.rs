use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::OrderStatus;

/// A panel purchase referenced by the external checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub panel_ids: Vec<String>,
    /// Total in minor currency units, computed by the pricing engine
    /// at order creation. Display prices are never persisted as
    /// authoritative; this is the amount actually charged.
    pub amount_cents: i64,
    pub status: OrderStatus,
    pub return_url: String,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn new(profile_id: Uuid, panel_ids: Vec<String>, amount_cents: i64, return_url: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            profile_id,
            panel_ids,
            amount_cents,
            status: OrderStatus::Created,
            return_url: return_url.to_string(),
            created_at: Utc::now(),
        }
    }
}
