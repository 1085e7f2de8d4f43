//! HTTP client for the tower calculator service

use serde_json::Value;

use super::{classify_failure, unwrap_geometry, CalculatorTransport, HealthResponse, RecalculationRequest};
use crate::assignment::AssignmentPayload;
use crate::config::ViewerConfig;
use crate::error::ViewerResult;
use crate::input::TowerInput;
use crate::library::ProfileLibrary;

/// Client for the remote calculator
pub struct HttpCalculator {
    base_url: String,
    client: reqwest::Client,
}

impl HttpCalculator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Client with the configured base URL and request timeout
    pub fn from_config(config: &ViewerConfig) -> ViewerResult<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            base_url: config.api_url.clone(),
            client,
        })
    }

    /// Get the base URL for the client
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if the service is healthy
    pub async fn health_check(&self) -> ViewerResult<HealthResponse> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        read_json(response).await
    }
}

impl CalculatorTransport for HttpCalculator {
    async fn fetch_profile_library(&self) -> ViewerResult<ProfileLibrary> {
        let url = format!("{}/api/section-library", self.base_url);
        let response = self.client.get(&url).send().await?;
        read_json(response).await
    }

    async fn recalculate(&self, input: &TowerInput, assignments: &AssignmentPayload) -> ViewerResult<Value> {
        let url = format!("{}/api/calculate/section-json", self.base_url);
        let request = RecalculationRequest {
            tower: input.clone(),
            element_sections: assignments.clone(),
        };
        log::info!("Requesting geometry for '{}' from {}", input.tower_id, url);

        let response = self.client.post(&url).json(&request).send().await?;
        read_json::<Value>(response).await.map(unwrap_geometry)
    }

    async fn fetch_geometry(&self, tower_id: &str) -> ViewerResult<Value> {
        let url = format!("{}/api/download_json/{}", self.base_url, tower_id);
        let response = self.client.get(&url).send().await?;
        read_json::<Value>(response).await.map(unwrap_geometry)
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> ViewerResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await?;
        log::warn!("Calculator responded {}: {}", status, body);
        return Err(classify_failure(status.as_u16(), &body));
    }
    Ok(response.json().await?)
}
