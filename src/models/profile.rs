use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row per authenticated user, optionally linked to a clinic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    /// PBKDF2 PHC string. Never serialized into API responses.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub clinic_id: Option<Uuid>,
    pub terms_accepted: bool,
    pub data_consent: bool,
    /// External account id issued by the dispensary platform.
    pub dispensary_account_id: Option<String>,
    pub dispensary_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Uploads require both consent flags. Checked once at the
    /// upload boundary, not re-derived per view.
    pub fn consented(&self) -> bool {
        self.terms_accepted && self.data_consent
    }
}
