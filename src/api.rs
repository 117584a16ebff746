//! Upstream telemetry network client.
//!
//! The network exposes device groups, the devices in each group and the
//! stored messages per device. Every list endpoint wraps its payload in a
//! `{"data": [...]}` envelope. Messages come back newest first; the
//! ingestion pipeline relies on that ordering to pick the latest-state
//! candidate.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::{ApiConfig, Credential};
use crate::errors::RecorderError;
use crate::models::RawMessage;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Envelope used by every list endpoint.
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct IdEntry {
    id: String,
}

/// HTTP client for one credential set.
pub struct ApiClient {
    http: Client,
    base_url: String,
    username: String,
    password: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, credential: &Credential) -> Result<Self, RecorderError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: credential.username.clone(),
            password: credential.password.clone(),
        })
    }

    /// List device group ids visible to the credential set.
    pub async fn device_groups(&self) -> Result<Vec<String>, RecorderError> {
        let url = format!("{}/devicetypes/", self.base_url);
        let envelope: DataEnvelope<IdEntry> = self.get_json(&url).await?;
        Ok(envelope.data.into_iter().map(|entry| entry.id).collect())
    }

    /// List device external ids in a group.
    pub async fn devices(&self, group_id: &str) -> Result<Vec<String>, RecorderError> {
        let url = format!("{}/devicetypes/{}/devices", self.base_url, group_id);
        let envelope: DataEnvelope<IdEntry> = self.get_json(&url).await?;
        Ok(envelope.data.into_iter().map(|entry| entry.id).collect())
    }

    /// List stored messages for a device, newest first.
    pub async fn messages(&self, device_id: &str) -> Result<Vec<RawMessage>, RecorderError> {
        let url = format!("{}/devices/{}/messages/", self.base_url, device_id);
        let envelope: DataEnvelope<RawMessage> = self.get_json(&url).await?;
        Ok(envelope.data)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, RecorderError> {
        let response = self
            .http
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RecorderError::ApiStatusError {
                status,
                context: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response.json().await?)
    }
}
