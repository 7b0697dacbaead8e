use thiserror::Error;

/// Top-level error type for the `aerolite-api` crate.
///
/// Covers every failure mode across the token session and the readings
/// client. `aerolite-core` maps these into its cycle-level taxonomy;
/// consumers there never see raw reqwest errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authorization ───────────────────────────────────────────────
    /// No refresh token stored for this session.
    #[error("Not authorized -- run the authorization flow first")]
    NotAuthorized,

    /// The refresh token was rejected; the user must re-authorize.
    #[error("Authorization expired -- re-authorization required")]
    AuthorizationExpired,

    /// The token endpoint returned an error response.
    #[error("Token endpoint rejected the request (HTTP {status}): {body}")]
    TokenEndpoint { status: u16, body: String },

    /// The PKCE state returned by the authorization server did not match.
    #[error("Authorization state mismatch")]
    StateMismatch,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── API ─────────────────────────────────────────────────────────
    /// Non-success response from the readings API, with the raw body.
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates the authorization has
    /// expired and re-authorizing might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        match self {
            Self::NotAuthorized | Self::AuthorizationExpired => true,
            Self::TokenEndpoint { status, .. } => matches!(status, 400 | 401 | 403),
            Self::Api { status, .. } => *status == 401,
            _ => false,
        }
    }

    /// The HTTP status code carried by this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } | Self::TokenEndpoint { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The raw response body carried by this error, if any.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            Self::Api { body, .. }
            | Self::TokenEndpoint { body, .. }
            | Self::Deserialization { body, .. } => Some(body),
            _ => None,
        }
    }
}
