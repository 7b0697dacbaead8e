//! Config subcommand handlers.

use dialoguer::Input;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Profile};
use crate::error::CliError;
use crate::output;

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("Aerolite CLI — configuration wizard");
            eprintln!("  Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let api_base: String = Input::new()
                .with_prompt("API base URL")
                .default(aerolite_api::client::DEFAULT_API_BASE.into())
                .interact_text()
                .map_err(prompt_err)?;

            let scan_interval: u64 = Input::new()
                .with_prompt("Watch interval (seconds)")
                .default(aerolite_core::DEFAULT_SCAN_INTERVAL.as_secs())
                .interact_text()
                .map_err(prompt_err)?;

            let mut cfg = config::load_config_or_default();
            cfg.profiles.insert(
                profile_name.clone(),
                Profile {
                    api_base: Some(api_base),
                    scan_interval: Some(scan_interval),
                    ..Profile::default()
                },
            );
            if cfg.default_profile.is_none() {
                cfg.default_profile = Some(profile_name.clone());
            }
            config::save_config(&cfg)?;

            eprintln!(
                "\nProfile '{profile_name}' saved. Authorize it with: aerolite auth login"
            );
            Ok(())
        }

        // ── Show: resolved config, tokens redacted ───────────────────
        ConfigCommand::Show => {
            let mut cfg = config::load_config_or_default();
            for profile in cfg.profiles.values_mut() {
                if profile.refresh_token.is_some() {
                    profile.refresh_token = Some("**REDACTED**".into());
                }
            }
            let toml_str = toml::to_string_pretty(&cfg).map_err(|e| CliError::Validation {
                field: "config".into(),
                reason: format!("failed to serialize config: {e}"),
            })?;
            output::emit(&toml_str, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::emit(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }
    }
}
