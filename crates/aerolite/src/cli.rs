//! Clap derive structures for the `aerolite` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// aerolite -- CLI for Aerolite air quality monitors
#[derive(Debug, Parser)]
#[command(
    name = "aerolite",
    version,
    about = "Read Aerolite air quality monitors from the command line",
    long_about = "Query and watch Aerolite air quality monitors through the cloud API.\n\n\
        Authorize once with `aerolite auth login`; the refresh token is stored\n\
        in the system keyring and access tokens are renewed automatically.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Account profile to use
    #[arg(long, short = 'p', env = "AEROLITE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API base URL (overrides profile)
    #[arg(long, env = "AEROLITE_API_BASE", global = true)]
    pub api_base: Option<String>,

    /// Refresh token (overrides keyring and profile)
    #[arg(long, env = "AEROLITE_REFRESH_TOKEN", global = true, hide_env = true)]
    pub refresh_token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "AEROLITE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds
    #[arg(long, env = "AEROLITE_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Authorize the CLI against the Aerolite cloud
    Auth(AuthArgs),

    /// List monitors on the account
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Show current sensor values
    #[command(alias = "t")]
    Telemetry(TelemetryArgs),

    /// Poll continuously and print each cycle
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Produce a redacted support bundle
    Diagnostics,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  AUTH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Run the PKCE authorization flow and store the refresh token
    Login,

    /// Show whether stored credentials are usable
    Status,

    /// Remove the stored refresh token
    Logout,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEVICES / TELEMETRY / WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List monitors with status and firmware
    #[command(alias = "ls")]
    List,

    /// Get one monitor's details
    Get {
        /// Device id or name
        device: String,
    },
}

#[derive(Debug, Args)]
pub struct TelemetryArgs {
    /// Restrict to one device (id or name)
    #[arg(long, short = 'd')]
    pub device: Option<String>,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between cycles (default from profile, minimum 30)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,

    /// Stop after this many cycles (default: run until interrupted)
    #[arg(long, short = 'n')]
    pub cycles: Option<u64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive setup wizard
    Init,

    /// Print the resolved configuration (tokens redacted)
    Show,

    /// Print the config file path
    Path,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
