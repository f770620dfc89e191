//! REST client for the devices' local HTTP API.

use std::collections::HashMap;

use async_trait::async_trait;
use nodedeck_core::{DeviceId, FetchError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::config::TuiConfig;
use crate::panels::{EnvironmentSensors, PowerRanking, SettingsUpdate, SystemSettings, WebhookList};

const SETTINGS_PATH: &str = "/api/v1/system/settings";
const WEBHOOKS_PATH: &str = "/api/v1/webhooks";
const POWER_RANKING_PATH: &str = "/api/v1/power/ranking";
const SENSORS_PATH: &str = "/api/v1/sensors/environment";

/// Longest error body carried into a [`FetchError::Status`] message.
const MAX_ERROR_BODY: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Config error: {0}")]
    Config(String),
}

/// Remote reads and writes against one device. Every call resolves within
/// the client's own timeout.
#[async_trait]
pub trait DeviceClient: Send + Sync {
    async fn system_settings(&self, device: &DeviceId) -> Result<SystemSettings, FetchError>;
    async fn update_system_settings(
        &self,
        device: &DeviceId,
        update: &SettingsUpdate,
    ) -> Result<(), FetchError>;
    async fn webhooks(&self, device: &DeviceId) -> Result<WebhookList, FetchError>;
    async fn power_ranking(&self, device: &DeviceId) -> Result<PowerRanking, FetchError>;
    async fn environment_sensors(&self, device: &DeviceId)
        -> Result<EnvironmentSensors, FetchError>;
}

#[derive(Clone)]
pub struct HttpDeviceClient {
    client: reqwest::Client,
    base_urls: HashMap<DeviceId, String>,
    auth_header: HeaderMap,
}

impl HttpDeviceClient {
    pub fn new(config: &TuiConfig) -> Result<Self, ApiClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        let base_urls = config
            .devices
            .iter()
            .filter_map(|d| {
                DeviceId::new(d.id.as_str())
                    .map(|id| (id, d.base_url.trim_end_matches('/').to_string()))
            })
            .collect();

        let auth_header = build_auth_headers(config.auth.bearer_token.as_deref())?;
        Ok(Self {
            client,
            base_urls,
            auth_header,
        })
    }

    fn url(&self, device: &DeviceId, path: &str) -> Result<String, FetchError> {
        let base = self
            .base_urls
            .get(device)
            .ok_or_else(|| FetchError::Rejected {
                reason: format!("unknown device {}", device),
            })?;
        Ok(format!("{}{}", base, path))
    }

    async fn get_json<T>(&self, device: &DeviceId, path: &str) -> Result<T, FetchError>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = self.url(device, path)?;
        let response = self
            .client
            .get(url)
            .headers(self.auth_header.clone())
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response).await?;
        response.json::<T>().await.map_err(transport_error)
    }

    async fn put_json<B>(&self, device: &DeviceId, path: &str, body: &B) -> Result<(), FetchError>
    where
        B: serde::Serialize + ?Sized,
    {
        let url = self.url(device, path)?;
        let response = self
            .client
            .put(url)
            .headers(self.auth_header.clone())
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response).await?;
        Ok(())
    }
}

#[async_trait]
impl DeviceClient for HttpDeviceClient {
    async fn system_settings(&self, device: &DeviceId) -> Result<SystemSettings, FetchError> {
        self.get_json(device, SETTINGS_PATH).await
    }

    async fn update_system_settings(
        &self,
        device: &DeviceId,
        update: &SettingsUpdate,
    ) -> Result<(), FetchError> {
        update.validate()?;
        self.put_json(device, SETTINGS_PATH, update).await
    }

    async fn webhooks(&self, device: &DeviceId) -> Result<WebhookList, FetchError> {
        self.get_json(device, WEBHOOKS_PATH).await
    }

    async fn power_ranking(&self, device: &DeviceId) -> Result<PowerRanking, FetchError> {
        self.get_json(device, POWER_RANKING_PATH).await
    }

    async fn environment_sensors(
        &self,
        device: &DeviceId,
    ) -> Result<EnvironmentSensors, FetchError> {
        self.get_json(device, SENSORS_PATH).await
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    Err(status_error(status.as_u16(), &text))
}

fn status_error(code: u16, body: &str) -> FetchError {
    let mut message: String = body.trim().chars().take(MAX_ERROR_BODY).collect();
    if message.is_empty() {
        message = "no response body".to_string();
    }
    FetchError::Status { code, message }
}

fn transport_error(err: reqwest::Error) -> FetchError {
    if err.is_decode() {
        FetchError::Decode {
            reason: err.to_string(),
        }
    } else {
        FetchError::Transport {
            reason: err.to_string(),
        }
    }
}

fn build_auth_headers(bearer_token: Option<&str>) -> Result<HeaderMap, ApiClientError> {
    let mut headers = HeaderMap::new();
    if let Some(token) = bearer_token {
        let value = format!("Bearer {}", token);
        headers.insert(
            HeaderName::from_static("authorization"),
            HeaderValue::from_str(&value).map_err(|e| ApiClientError::Config(e.to_string()))?,
        );
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TuiConfig {
        TuiConfig::from_toml(
            r#"
request_timeout_ms = 1000
tick_interval_ms = 250
persistence_path = "/tmp/nodedeck/state.json"
log_path = "/tmp/nodedeck/nodedeck.log"

[[devices]]
id = "plug-1"
name = "Plug"
base_url = "http://192.0.2.10/"

[auth]
bearer_token = "abc"

[cache]
enabled = false
path = "/tmp/nodedeck/cache"
max_size_mb = 8
"#,
        )
        .expect("config parses")
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let client = HttpDeviceClient::new(&config()).expect("client");
        let device = DeviceId::new("plug-1").expect("valid");
        assert_eq!(
            client.url(&device, WEBHOOKS_PATH).expect("known device"),
            "http://192.0.2.10/api/v1/webhooks"
        );
    }

    #[tokio::test]
    async fn test_unknown_device_is_rejected_without_network() {
        let client = HttpDeviceClient::new(&config()).expect("client");
        let device = DeviceId::new("ghost").expect("valid");
        assert!(matches!(
            client.power_ranking(&device).await,
            Err(FetchError::Rejected { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_update_is_rejected_before_sending() {
        let client = HttpDeviceClient::new(&config()).expect("client");
        let device = DeviceId::new("plug-1").expect("valid");
        let update = SettingsUpdate {
            hostname: String::new(),
            timezone: "UTC".to_string(),
            reporting_interval_secs: 10,
        };
        assert!(matches!(
            client.update_system_settings(&device, &update).await,
            Err(FetchError::Rejected { .. })
        ));
    }

    #[test]
    fn test_status_error_truncates_body() {
        let body = "x".repeat(500);
        match status_error(503, &body) {
            FetchError::Status { code, message } => {
                assert_eq!(code, 503);
                assert_eq!(message.len(), MAX_ERROR_BODY);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            status_error(404, "  "),
            FetchError::Status { message, .. } if message == "no response body"
        ));
    }

    #[test]
    fn test_bearer_header() {
        let headers = build_auth_headers(Some("abc")).expect("valid");
        assert_eq!(
            headers.get("authorization").and_then(|v| v.to_str().ok()),
            Some("Bearer abc")
        );
        assert!(build_auth_headers(None).expect("valid").is_empty());
        assert!(build_auth_headers(Some("bad\ntoken")).is_err());
    }
}
