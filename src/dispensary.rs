//! Dispensary account provisioning client.
//!
//! Creates an affiliate storefront account for a user and returns the
//! external account id plus the storefront URL, which the caller
//! persists onto the profile row.

use serde::{Deserialize, Serialize};

use crate::models::DispensaryAccountType;

#[derive(Debug, thiserror::Error)]
pub enum DispensaryError {
    #[error("Cannot reach dispensary service at {0}")]
    Connection(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Dispensary service returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Failed to parse dispensary response: {0}")]
    ResponseParsing(String),
}

#[derive(Debug, Serialize)]
struct ProvisionRequest<'a> {
    user_id: &'a str,
    email: &'a str,
    name: &'a str,
    account_type: DispensaryAccountType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DispensaryAccount {
    pub account_id: String,
    pub dispensary_url: String,
}

pub struct DispensaryClient {
    base_url: String,
    client: reqwest::Client,
}

impl DispensaryClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub async fn provision_account(
        &self,
        user_id: &str,
        email: &str,
        name: &str,
        account_type: DispensaryAccountType,
    ) -> Result<DispensaryAccount, DispensaryError> {
        let url = format!("{}/v1/accounts", self.base_url);
        let body = ProvisionRequest {
            user_id,
            email,
            name,
            account_type,
        };

        let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
            if e.is_connect() {
                DispensaryError::Connection(self.base_url.clone())
            } else {
                DispensaryError::HttpClient(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DispensaryError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| DispensaryError::ResponseParsing(e.to_string()))
    }
}
