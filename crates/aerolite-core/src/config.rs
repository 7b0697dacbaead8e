// ── Runtime polling configuration ──
//
// Describes *how* to poll the Aerolite cloud. Built by the outer
// surface (CLI) and handed in -- core never reads config files.

use std::time::Duration;

use url::Url;

/// Default polling interval: one cycle every three minutes.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(180);

/// Configuration for one polled account entry.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Cloud API base URL.
    pub api_base: Url,
    /// Fixed interval between cycles.
    pub scan_interval: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            api_base: aerolite_api::client::DEFAULT_API_BASE
                .parse()
                .expect("static URL"),
            scan_interval: DEFAULT_SCAN_INTERVAL,
            timeout: Duration::from_secs(30),
        }
    }
}
