// ── Entry registry ──
//
// Application-scoped registry of polled account entries. Owned by the
// setup/teardown boundary and injected into consumers -- there is no
// ambient global state. Each entry bundles a running coordinator with
// the entity set projected from its first successful cycle.

use std::sync::Arc;

use dashmap::DashMap;
use secrecy::SecretString;
use tracing::{debug, info};

use aerolite_api::{AeroliteClient, OAuthConfig, TokenSession, TransportConfig};

use crate::config::PollerConfig;
use crate::coordinator::Coordinator;
use crate::entity::{SensorEntity, project_entities};
use crate::error::CoreError;

/// Concrete coordinator wiring for the Aerolite cloud.
pub type CloudCoordinator = Coordinator<TokenSession, AeroliteClient>;

/// One polled account with its projected entities.
pub struct AccountEntry {
    pub entry_id: String,
    pub title: String,
    pub coordinator: CloudCoordinator,
    /// Entity set fixed at the first successful cycle.
    pub entities: Vec<SensorEntity>,
}

impl std::fmt::Debug for AccountEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountEntry")
            .field("entry_id", &self.entry_id)
            .field("title", &self.title)
            .field("entities", &self.entities)
            .finish_non_exhaustive()
    }
}

/// Registry of live entries, keyed by entry id.
#[derive(Default)]
pub struct Registry {
    entries: DashMap<String, Arc<AccountEntry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set up one account entry: validate the token, build the client
    /// off the event loop, run the first cycle, project entities, and
    /// start the poller.
    ///
    /// Fails with [`CoreError::AuthRefreshFailed`] when the stored
    /// refresh token is rejected, so callers can re-run authorization.
    pub async fn setup_entry(
        &self,
        entry_id: &str,
        title: &str,
        config: PollerConfig,
        oauth: OAuthConfig,
        refresh_token: SecretString,
    ) -> Result<Arc<AccountEntry>, CoreError> {
        // Client construction performs TLS setup, which blocks; keep it
        // off the async runtime.
        let transport = TransportConfig {
            timeout: config.timeout,
            extra_ca_cert: None,
        };
        let api_base = config.api_base.clone();
        let (http, client) = tokio::task::spawn_blocking(move || {
            let http = transport.build_client()?;
            let client = AeroliteClient::with_client(http.clone(), api_base);
            Ok::<_, aerolite_api::Error>((http, client))
        })
        .await
        .map_err(|e| CoreError::Internal(format!("client construction task failed: {e}")))??;

        // Validate token material before wiring anything up.
        let session = TokenSession::from_refresh_token(oauth, http, refresh_token);
        session.ensure_token_valid().await.map_err(CoreError::from)?;
        debug!(entry_id, "token validated");

        let coordinator = Coordinator::new(session, client, config.scan_interval);

        // First cycle must succeed before the entry exists; its error
        // propagates to the caller instead of being retried silently.
        coordinator.refresh().await?;
        let snapshot = coordinator
            .snapshot()
            .ok_or_else(|| CoreError::SetupFailed {
                message: "first refresh published no snapshot".into(),
            })?;
        let entities = project_entities(&snapshot);

        coordinator.start().await;

        let entry = Arc::new(AccountEntry {
            entry_id: entry_id.to_owned(),
            title: title.to_owned(),
            coordinator,
            entities,
        });
        self.entries.insert(entry_id.to_owned(), Arc::clone(&entry));

        info!(
            entry_id,
            devices = snapshot.device_count(),
            entities = entry.entities.len(),
            "entry set up"
        );
        Ok(entry)
    }

    /// Tear down one entry: remove it from the registry and stop its
    /// poller. An in-flight cycle is abandoned; nothing partial was
    /// published.
    pub async fn teardown_entry(&self, entry_id: &str) -> Result<(), CoreError> {
        let (_, entry) = self
            .entries
            .remove(entry_id)
            .ok_or_else(|| CoreError::EntryNotFound {
                entry_id: entry_id.to_owned(),
            })?;

        entry.coordinator.shutdown().await;
        debug!(entry_id, "entry torn down");
        Ok(())
    }

    pub fn get(&self, entry_id: &str) -> Option<Arc<AccountEntry>> {
        self.entries.get(entry_id).map(|e| Arc::clone(e.value()))
    }

    pub fn entry_ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
