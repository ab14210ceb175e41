use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::SubscriptionStatus;

/// A white-labeled portal instance, scoped by a URL slug.
///
/// Created by the clinic signup flow, mutated by the clinic admin,
/// drives feature gating for every request under its slug.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clinic {
    pub id: Uuid,
    /// Routing key. Lowercase letters, digits and hyphens only.
    pub slug: String,
    pub name: String,
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
    pub accent_color: Option<String>,
    pub subscription_status: SubscriptionStatus,
    /// Affiliate storefront URL, when the clinic has linked one.
    pub dispensary_url: Option<String>,
    /// Profile that administers this clinic.
    pub admin_profile_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Clinic {
    /// Dispensary access derived once at the tenant boundary:
    /// entitled subscription and a linked storefront, nothing else.
    pub fn has_dispensary_access(&self) -> bool {
        self.subscription_status.entitled() && self.dispensary_url.is_some()
    }
}
