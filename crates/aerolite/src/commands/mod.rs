//! Command dispatch: bridges CLI args -> core calls -> output formatting.

pub mod auth;
pub mod config_cmd;
pub mod devices;
pub mod diagnostics;
pub mod telemetry;
pub mod watch;

use aerolite_api::{AeroliteClient, DeviceReading, TokenSession, TransportConfig};
use aerolite_core::{CoreError, PollerConfig};

use crate::cli::{Command, GlobalOpts};
use crate::config;
use crate::error::CliError;

/// Dispatch a cloud-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Devices(args) => devices::handle(args, global).await,
        Command::Telemetry(args) => telemetry::handle(args, global).await,
        Command::Watch(args) => watch::handle(args, global).await,
        Command::Diagnostics => diagnostics::handle(global).await,
        // Auth, Config, and Completions are handled before dispatch
        Command::Auth(_) | Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}

// ── Shared cloud context ─────────────────────────────────────────────

/// Everything a one-shot cloud command needs: resolved profile config,
/// a token session seeded from the stored refresh token, and a client.
pub struct CloudContext {
    pub profile_name: String,
    pub poller: PollerConfig,
    pub session: TokenSession,
    pub client: AeroliteClient,
}

/// Resolve the active profile and build the session + client pair.
pub fn build_context(global: &GlobalOpts) -> Result<CloudContext, CliError> {
    let cfg = config::load_config_or_default();
    let (profile_name, profile) = config::active_profile(global, &cfg)?;

    let poller = config::resolve_poller_config(&profile, global)?;
    let oauth = config::resolve_oauth_config(&profile)?;
    let refresh_token = config::resolve_refresh_token(&profile, &profile_name, global)?;

    let transport = TransportConfig {
        timeout: poller.timeout,
        extra_ca_cert: None,
    };
    let http = transport.build_client().map_err(api_err)?;
    let client = AeroliteClient::with_client(http.clone(), poller.api_base.clone());
    let session = TokenSession::from_refresh_token(oauth, http, refresh_token);

    Ok(CloudContext {
        profile_name,
        poller,
        session,
        client,
    })
}

impl CloudContext {
    /// Refresh the access token if needed and fetch all device readings.
    pub async fn fetch_readings(&self) -> Result<Vec<DeviceReading>, CliError> {
        let token = self.session.ensure_token_valid().await.map_err(api_err)?;
        self.client.set_token(token);
        self.client.list_device_readings().await.map_err(api_err)
    }
}

/// Route API-layer errors through the core taxonomy so auth failures
/// and fetch failures carry the same messages everywhere.
pub(crate) fn api_err(e: aerolite_api::Error) -> CliError {
    CliError::from(CoreError::from(e))
}
