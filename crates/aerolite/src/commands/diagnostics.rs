//! Diagnostics command handler: redacted support bundle as JSON.

use aerolite_core::{Registry, entry_diagnostics};

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output;

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let (profile_name, profile) = config::active_profile(global, &cfg)?;

    let poller = config::resolve_poller_config(&profile, global)?;
    let oauth = config::resolve_oauth_config(&profile)?;
    let refresh_token = config::resolve_refresh_token(&profile, &profile_name, global)?;

    // One full setup cycle gives the bundle real coordinator state.
    let registry = Registry::new();
    let entry = registry
        .setup_entry(&profile_name, &profile_name, poller, oauth, refresh_token)
        .await?;

    let report = entry_diagnostics(&entry);
    output::emit(&output::json(&report, true), global.quiet);

    registry.teardown_entry(&profile_name).await?;
    Ok(())
}
