//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use aerolite_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Authentication ───────────────────────────────────────────────

    #[error("Authorization expired for profile '{profile}'")]
    #[diagnostic(
        code(aerolite::auth_expired),
        help(
            "The stored refresh token was rejected by the authorization server.\n\
             Re-authorize with: aerolite auth login"
        )
    )]
    AuthExpired { profile: String },

    #[error("No credentials stored for profile '{profile}'")]
    #[diagnostic(
        code(aerolite::no_credentials),
        help(
            "Run: aerolite auth login\n\
             Or set the AEROLITE_REFRESH_TOKEN environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Cloud API ────────────────────────────────────────────────────

    #[error("Could not reach the Aerolite cloud")]
    #[diagnostic(
        code(aerolite::fetch_failed),
        help("Check network connectivity and https://status.aerolite.io")
    )]
    FetchFailed {
        #[source]
        source: Box<CoreError>,
    },

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(aerolite::not_found),
        help("Run: aerolite {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(aerolite::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(aerolite::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: aerolite config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(aerolite::config))]
    Config(Box<figment::Error>),

    #[error("Keyring operation failed: {reason}")]
    #[diagnostic(
        code(aerolite::keyring),
        help(
            "The system keyring was unavailable.\n\
             You can store the token in the config file instead (plaintext)."
        )
    )]
    Keyring { reason: String },

    // ── Internal ─────────────────────────────────────────────────────

    #[error("{message}")]
    #[diagnostic(code(aerolite::internal))]
    Internal { message: String },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(aerolite::json))]
    Json(#[from] serde_json::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AuthExpired { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::FetchFailed { .. } => exit_code::CONNECTION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AuthRefreshFailed { .. } => CliError::AuthExpired {
                profile: "current".into(),
            },

            CoreError::FetchFailed { .. } => CliError::FetchFailed {
                source: Box::new(err),
            },

            CoreError::EntryNotFound { entry_id } => CliError::NotFound {
                resource_type: "entry".into(),
                identifier: entry_id,
                list_command: "devices list".into(),
            },

            CoreError::SetupFailed { message } | CoreError::Internal(message) => {
                CliError::Internal { message }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rejected_refresh_maps_to_auth_exit_code() {
        let err = CliError::from(CoreError::AuthRefreshFailed {
            message: "invalid_grant".into(),
        });
        assert!(matches!(err, CliError::AuthExpired { .. }));
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }

    #[test]
    fn fetch_failure_maps_to_connection_exit_code() {
        let err = CliError::from(CoreError::FetchFailed {
            message: "HTTP 503: maintenance".into(),
            status: Some(503),
            body: None,
        });
        assert!(matches!(err, CliError::FetchFailed { .. }));
        assert_eq!(err.exit_code(), exit_code::CONNECTION);
    }

    #[test]
    fn setup_and_internal_failures_are_general_errors() {
        let setup = CliError::from(CoreError::SetupFailed {
            message: "first refresh published no snapshot".into(),
        });
        let internal = CliError::from(CoreError::Internal("task join failed".into()));
        assert_eq!(setup.exit_code(), exit_code::GENERAL);
        assert_eq!(internal.exit_code(), exit_code::GENERAL);
    }

    #[test]
    fn missing_entry_maps_to_not_found() {
        let err = CliError::from(CoreError::EntryNotFound {
            entry_id: "lab".into(),
        });
        assert!(matches!(err, CliError::NotFound { .. }));
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
    }
}
