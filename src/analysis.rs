//! Remote lab-report analysis client.
//!
//! Sends the report's observations plus the patient profile to the
//! external completion endpoint and returns its free-text/JSON-hybrid
//! payload. Fire-once: no retry, no backoff — a transport failure or
//! non-2xx moves the triggering report to `failed`.

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Cannot reach analysis service at {0}")]
    Connection(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Analysis service returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Failed to parse analysis response: {0}")]
    ResponseParsing(String),
}

/// Patient context sent alongside the observations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientProfile {
    pub age: u32,
    pub sex: String,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub medications: Vec<String>,
    #[serde(default)]
    pub goals: Vec<String>,
}

/// One lab result observation as parsed from the uploaded report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub name: String,
    pub value: f64,
    pub units: String,
    pub ref_low: Option<f64>,
    pub ref_high: Option<f64>,
    pub collected_at: Option<String>,
    pub lab: Option<String>,
}

/// Optional functional (narrower-than-clinical) reference range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionalRange {
    pub name: String,
    pub low: f64,
    pub high: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub report_id: String,
    pub patient: PatientProfile,
    pub observations: Vec<Observation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub functional_ranges: Vec<FunctionalRange>,
}

/// Response from the analysis endpoint: a status flag plus the payload.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisOutcome {
    pub status: String,
    pub analysis: serde_json::Value,
}

impl AnalysisOutcome {
    pub fn is_success(&self) -> bool {
        self.status == "ok"
    }
}

/// HTTP client for the analysis service.
pub struct AnalysisClient {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl AnalysisClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit a report for analysis. One request, one answer.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisOutcome, AnalysisError> {
        let url = format!("{}/v1/analyze", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    AnalysisError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    AnalysisError::HttpClient(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    AnalysisError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| AnalysisError::ResponseParsing(e.to_string()))
    }
}
