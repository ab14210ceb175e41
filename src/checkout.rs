//! Payment checkout client. One call: order in, redirect URL out.

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("Cannot reach payment service at {0}")]
    Connection(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Payment service returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Failed to parse checkout response: {0}")]
    ResponseParsing(String),
}

#[derive(Debug, Serialize)]
struct CheckoutSessionRequest<'a> {
    order_id: &'a str,
    amount_cents: i64,
    currency: &'a str,
    return_url: &'a str,
}

/// The external checkout page to redirect the user to.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub checkout_url: String,
}

pub struct CheckoutClient {
    base_url: String,
    client: reqwest::Client,
}

impl CheckoutClient {
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

    pub async fn create_session(
        &self,
        order_id: &str,
        amount_cents: i64,
        currency: &str,
        return_url: &str,
    ) -> Result<CheckoutSession, CheckoutError> {
        let url = format!("{}/v1/checkout/sessions", self.base_url);
        let body = CheckoutSessionRequest {
            order_id,
            amount_cents,
            currency,
            return_url,
        };

        let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
            if e.is_connect() {
                CheckoutError::Connection(self.base_url.clone())
            } else {
                CheckoutError::HttpClient(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CheckoutError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| CheckoutError::ResponseParsing(e.to_string()))
    }
}
