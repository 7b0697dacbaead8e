//! Auth command handlers: PKCE login, status, logout.

use dialoguer::{Input, Select};
use owo_colors::OwoColorize;
use secrecy::ExposeSecret;

use aerolite_api::{PkcePair, TokenSession, TransportConfig};

use crate::cli::{AuthArgs, AuthCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;

use super::api_err;

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

pub async fn handle(args: AuthArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        AuthCommand::Login => login(global).await,
        AuthCommand::Status => status(global).await,
        AuthCommand::Logout => logout(global),
    }
}

// ── Login ───────────────────────────────────────────────────────────

async fn login(global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load_config_or_default();
    let (profile_name, profile) = config::active_profile(global, &cfg)?;
    let oauth = config::resolve_oauth_config(&profile)?;

    let transport = TransportConfig::default();
    let http = transport.build_client().map_err(api_err)?;
    let session = TokenSession::new(oauth, http);

    // 1. Authorization URL with a fresh PKCE challenge
    let pkce = PkcePair::generate();
    let url = session.authorize_url(&pkce);
    eprintln!("Open this URL in a browser and approve access:\n");
    eprintln!("  {}\n", url.as_str().cyan());

    // 2. Paste the code shown after approval
    let code: String = Input::new()
        .with_prompt("Authorization code")
        .interact_text()
        .map_err(prompt_err)?;

    // 3. Exchange it for tokens
    let tokens = session
        .exchange_code(code.trim(), &pkce)
        .await
        .map_err(api_err)?;

    // 4. Store the refresh token
    let store_choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let choice = Select::new()
        .with_prompt("Where should the refresh token be stored?")
        .items(store_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let refresh_token = tokens.refresh_token.expose_secret();
    let mut stored_profile = profile;
    if choice == 0 {
        config::store_refresh_token(&profile_name, refresh_token)?;
        stored_profile.refresh_token = None;
    } else {
        stored_profile.refresh_token = Some(refresh_token.to_owned());
    }

    // 5. Persist the profile
    cfg.profiles.insert(profile_name.clone(), stored_profile);
    if cfg.default_profile.is_none() {
        cfg.default_profile = Some(profile_name.clone());
    }
    config::save_config(&cfg)?;

    if !global.quiet {
        eprintln!(
            "{} profile '{profile_name}' authorized",
            "success:".green()
        );
    }
    Ok(())
}

// ── Status ──────────────────────────────────────────────────────────

async fn status(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let (profile_name, profile) = config::active_profile(global, &cfg)?;
    let oauth = config::resolve_oauth_config(&profile)?;
    let refresh_token = config::resolve_refresh_token(&profile, &profile_name, global)?;

    let transport = TransportConfig::default();
    let http = transport.build_client().map_err(api_err)?;
    let session = TokenSession::from_refresh_token(oauth, http, refresh_token);

    // A successful refresh proves the stored token is still accepted.
    match session.ensure_token_valid().await {
        Ok(_) => {
            if !global.quiet {
                eprintln!("{} credentials for '{profile_name}' are valid", "ok:".green());
            }
            Ok(())
        }
        Err(e) if e.is_auth_expired() => Err(CliError::AuthExpired {
            profile: profile_name,
        }),
        Err(e) => Err(api_err(e)),
    }
}

// ── Logout ──────────────────────────────────────────────────────────

fn logout(global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load_config_or_default();
    let (profile_name, _) = config::active_profile(global, &cfg)?;

    config::delete_refresh_token(&profile_name)?;

    // Also scrub any plaintext token from the config file.
    if let Some(profile) = cfg.profiles.get_mut(&profile_name) {
        if profile.refresh_token.take().is_some() {
            config::save_config(&cfg)?;
        }
    }

    if !global.quiet {
        eprintln!("Credentials for '{profile_name}' removed");
    }
    Ok(())
}
