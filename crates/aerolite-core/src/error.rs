// ── Core error types ──
//
// Cycle-level errors from aerolite-core. Per-metric shaping failures
// never appear here: they are recovered inside the shaping pass. The
// `From<aerolite_api::Error>` impl folds transport detail (HTTP status,
// response body) into the failure message so the host surface can show
// it without reaching into the API layer.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Token refresh was rejected. Distinguished from generic fetch
    /// failures so callers can re-trigger the authorization flow
    /// instead of retrying on the next tick.
    #[error("Authentication refresh failed: {message}")]
    AuthRefreshFailed { message: String },

    /// The batched readings fetch failed. Retried automatically on the
    /// next scheduled cycle; no backoff beyond the fixed interval.
    #[error("Error communicating with API: {message}")]
    FetchFailed {
        message: String,
        /// HTTP status code, when the underlying error exposed one.
        status: Option<u16>,
        /// Raw response body, when the underlying error exposed one.
        body: Option<String>,
    },

    /// Entry setup failed before the first successful cycle.
    #[error("Setup failed: {message}")]
    SetupFailed { message: String },

    /// No entry registered under the given id.
    #[error("Entry not found: {entry_id}")]
    EntryNotFound { entry_id: String },

    /// Internal error (task join failures and the like).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` if re-authorization is required to make progress.
    pub fn requires_reauth(&self) -> bool {
        matches!(self, Self::AuthRefreshFailed { .. })
    }
}

// ── Conversion from API-layer errors ─────────────────────────────────

impl From<aerolite_api::Error> for CoreError {
    fn from(err: aerolite_api::Error) -> Self {
        // Only token-session failures become AuthRefreshFailed. A 401
        // on the readings fetch is a cycle failure like any other; the
        // next refresh attempt decides whether re-auth is needed.
        if matches!(
            err,
            aerolite_api::Error::NotAuthorized
                | aerolite_api::Error::AuthorizationExpired
                | aerolite_api::Error::TokenEndpoint { .. }
                | aerolite_api::Error::StateMismatch
        ) {
            return CoreError::AuthRefreshFailed {
                message: err.to_string(),
            };
        }

        let status = err.status_code();
        let body = err.response_body().map(str::to_owned);

        // Fold available detail into the message, the way the host
        // surface expects to display it.
        let mut message = match status {
            Some(code) => format!("HTTP {code}: {err}"),
            None => err.to_string(),
        };
        if let Some(ref b) = body {
            if !b.is_empty() {
                message = format!("{message} | Response: {b}");
            }
        }

        CoreError::FetchFailed {
            message,
            status,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_failure_message_includes_http_status() {
        let api_err = aerolite_api::Error::Api {
            status: 503,
            body: "upstream down".into(),
        };
        let err = CoreError::from(api_err);

        let CoreError::FetchFailed {
            message,
            status,
            body,
        } = &err
        else {
            panic!("expected FetchFailed, got: {err:?}");
        };
        assert!(message.contains("HTTP 503"));
        assert!(message.contains("upstream down"));
        assert_eq!(*status, Some(503));
        assert_eq!(body.as_deref(), Some("upstream down"));
    }

    #[test]
    fn unauthorized_fetch_is_a_fetch_failure_with_status() {
        let api_err = aerolite_api::Error::Api {
            status: 401,
            body: String::new(),
        };
        let err = CoreError::from(api_err);

        let CoreError::FetchFailed {
            message,
            status: Some(401),
            ..
        } = &err
        else {
            panic!("expected FetchFailed with status 401, got: {err:?}");
        };
        assert!(message.contains("HTTP 401"));
        assert!(!err.requires_reauth());
    }

    #[test]
    fn expired_authorization_maps_to_auth_refresh_failed() {
        let err = CoreError::from(aerolite_api::Error::AuthorizationExpired);
        assert!(matches!(err, CoreError::AuthRefreshFailed { .. }));
    }
}
