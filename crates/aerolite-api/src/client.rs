// Readings API HTTP client.
//
// One batched endpoint matters: latest readings for every device the
// account can see. The bearer token is swappable because the polling
// layer refreshes it between cycles and pushes the new one in.

use std::sync::RwLock;

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::DeviceReading;
use crate::transport::TransportConfig;

/// Default cloud API base.
pub const DEFAULT_API_BASE: &str = "https://api.aerolite.io";

/// HTTP client for the Aerolite readings API.
///
/// Construction builds the underlying TLS stack, which blocks; on an
/// async runtime, create the client inside `spawn_blocking`.
pub struct AeroliteClient {
    http: reqwest::Client,
    base_url: Url,
    token: RwLock<SecretString>,
}

impl AeroliteClient {
    /// Create a new client against `base_url`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            token: RwLock::new(SecretString::from(String::new())),
        }
    }

    /// The API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Swap the bearer token used for subsequent requests.
    pub fn set_token(&self, token: SecretString) {
        if let Ok(mut guard) = self.token.write() {
            *guard = token;
        }
    }

    /// Latest readings for all devices, in one batched call.
    ///
    /// `GET /v1/devices/readings/latest`
    pub async fn list_device_readings(&self) -> Result<Vec<DeviceReading>, Error> {
        let url = self.api_url("v1/devices/readings/latest")?;
        debug!("listing device readings");
        self.get(url).await
    }

    // ── Request plumbing ─────────────────────────────────────────────

    fn api_url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    fn bearer(&self) -> String {
        self.token
            .read()
            .map(|t| t.expose_secret().to_owned())
            .unwrap_or_default()
    }

    /// Send a GET request and decode the JSON body.
    ///
    /// Non-success responses are captured with their status and raw
    /// body so callers can attach full diagnostic detail.
    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .bearer_auth(self.bearer())
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}
