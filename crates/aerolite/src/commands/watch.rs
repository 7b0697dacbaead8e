//! Watch command handler: continuous polling via the core registry.

use std::time::Duration;

use chrono::Utc;
use owo_colors::OwoColorize;

use aerolite_core::{CycleSnapshot, Registry};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

/// Floor for `--interval`; the cloud rate-limits aggressive pollers.
const MIN_INTERVAL_SECS: u64 = 30;

pub async fn handle(args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let (profile_name, profile) = config::active_profile(global, &cfg)?;

    let mut poller = config::resolve_poller_config(&profile, global)?;
    if let Some(secs) = args.interval {
        if secs < MIN_INTERVAL_SECS {
            return Err(CliError::Validation {
                field: "interval".into(),
                reason: format!("must be at least {MIN_INTERVAL_SECS} seconds"),
            });
        }
        poller.scan_interval = Duration::from_secs(secs);
    }
    let oauth = config::resolve_oauth_config(&profile)?;
    let refresh_token = config::resolve_refresh_token(&profile, &profile_name, global)?;

    let registry = Registry::new();
    let entry = registry
        .setup_entry(&profile_name, &profile_name, poller, oauth, refresh_token)
        .await?;

    let mut snapshots = entry.coordinator.subscribe();
    let mut statuses = entry.coordinator.subscribe_status();
    let mut printed: u64 = 0;

    // The first cycle already ran during setup.
    if let Some(snapshot) = snapshots.borrow_and_update().clone() {
        print_cycle(&snapshot, global);
        printed += 1;
    }
    statuses.mark_unchanged();

    // Failed cycles retain the previous snapshot, so failures are only
    // visible through the status channel.
    let limit = args.cycles.unwrap_or(u64::MAX);
    while printed < limit {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(snapshot) = snapshots.borrow_and_update().clone() {
                    print_cycle(&snapshot, global);
                    printed += 1;
                }
            }
            changed = statuses.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = statuses.borrow_and_update().clone();
                if !status.last_update_succeeded {
                    if let Some(err) = status.last_error {
                        if output::use_color(&global.color) {
                            eprintln!("{} {err}", "cycle failed:".red());
                        } else {
                            eprintln!("cycle failed: {err}");
                        }
                    }
                    printed += 1;
                }
            }
        }
    }

    registry.teardown_entry(&profile_name).await?;
    Ok(())
}

fn print_cycle(snapshot: &CycleSnapshot, global: &GlobalOpts) {
    if global.quiet {
        return;
    }
    let stamp = Utc::now().format("%Y-%m-%d %H:%M:%S");
    let mut lines = vec![format!(
        "── {stamp} ── {} device(s)",
        snapshot.device_count()
    )];
    for (device_id, dev) in &snapshot.devices {
        for (sensor, value) in &dev.telemetry {
            let unit = value.unit.as_deref().unwrap_or("");
            lines.push(format!(
                "{device_id}  {sensor:<16} {:>10} {unit}",
                value.value
            ));
        }
    }
    output::emit(&lines.join("\n"), global.quiet);
}
