// ── Polling capability interfaces ──
//
// The coordinator depends on these two seams instead of concrete API
// types: a token provider (refresh-on-demand) and a readings source
// (batched fetch). The api crate's types implement them below; tests
// substitute fakes.

use std::future::Future;

use secrecy::SecretString;

use aerolite_api::{AeroliteClient, DeviceReading, TokenSession};

use crate::error::CoreError;

/// Refresh-on-demand access to a bearer token.
pub trait TokenProvider: Send + Sync {
    /// Ensure the current token is valid, refreshing if expired.
    /// Returns the bearer to push into the readings source.
    fn ensure_token_valid(
        &self,
    ) -> impl Future<Output = Result<SecretString, CoreError>> + Send;
}

/// Batched access to every device's latest readings.
pub trait ReadingsSource: Send + Sync {
    /// Swap the bearer used for subsequent fetches.
    fn set_token(&self, token: SecretString);

    /// Fetch all devices' latest readings in one call.
    fn fetch_all_device_readings(
        &self,
    ) -> impl Future<Output = Result<Vec<DeviceReading>, CoreError>> + Send;
}

impl TokenProvider for TokenSession {
    async fn ensure_token_valid(&self) -> Result<SecretString, CoreError> {
        TokenSession::ensure_token_valid(self).await.map_err(Into::into)
    }
}

impl ReadingsSource for AeroliteClient {
    fn set_token(&self, token: SecretString) {
        AeroliteClient::set_token(self, token);
    }

    async fn fetch_all_device_readings(&self) -> Result<Vec<DeviceReading>, CoreError> {
        self.list_device_readings().await.map_err(Into::into)
    }
}
