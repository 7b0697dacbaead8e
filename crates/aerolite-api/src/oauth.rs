// OAuth2 token session (authorization code + PKCE, refresh on demand).
//
// The Aerolite cloud is a public OAuth2 client: no client secret, PKCE
// S256 challenge on the authorization request, refresh tokens for
// long-lived access. Endpoints and scopes are fixed configuration
// constants, not negotiated.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use crate::error::Error;

/// Refresh this long before the recorded expiry, to absorb clock skew
/// and request latency.
const EXPIRY_LEEWAY_SECS: i64 = 30;

/// Fallback lifetime when the token endpoint omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

// ── Configuration ───────────────────────────────────────────────────

/// OAuth2 endpoints and client parameters.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// Public client id (safe to embed; PKCE replaces the secret).
    pub client_id: String,
    pub authorize_url: Url,
    pub token_url: Url,
    /// API audience requested on the authorization call.
    pub audience: String,
    pub scopes: Vec<String>,
    pub redirect_uri: String,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: "aerolite-cli".into(),
            // Compiled-in constants; parsing cannot fail.
            authorize_url: "https://auth.aerolite.io/authorize"
                .parse()
                .expect("static URL"),
            token_url: "https://auth.aerolite.io/oauth/token"
                .parse()
                .expect("static URL"),
            audience: "https://api.aerolite.io".into(),
            scopes: ["openid", "profile", "email", "offline_access"]
                .map(String::from)
                .to_vec(),
            redirect_uri: "urn:ietf:wg:oauth:2.0:oob".into(),
        }
    }
}

// ── PKCE ────────────────────────────────────────────────────────────

/// A PKCE code verifier with its derived S256 challenge and CSRF state.
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
    pub state: String,
}

impl PkcePair {
    /// Generate a fresh verifier, challenge, and state.
    pub fn generate() -> Self {
        let verifier = random_token(64);
        let state = random_token(16);
        let challenge = Self::challenge_for(&verifier);
        Self {
            verifier,
            challenge,
            state,
        }
    }

    /// `BASE64URL(SHA256(verifier))` without padding, per RFC 7636.
    pub fn challenge_for(verifier: &str) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
    }
}

fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

// ── Token material ──────────────────────────────────────────────────

/// A bearer token with its refresh token and expiry.
#[derive(Debug, Clone)]
pub struct TokenSet {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    pub expires_at: DateTime<Utc>,
}

impl TokenSet {
    /// Whether the access token is still usable (with leeway).
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - ChronoDuration::seconds(EXPIRY_LEEWAY_SECS) > now
    }
}

/// Wire shape of a token endpoint success response.
#[derive(Debug, Deserialize)]
struct TokenPayload {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

// ── Session ─────────────────────────────────────────────────────────

/// Holds the current token set and refreshes it on demand.
///
/// Single owner of the token material: the coordinator calls
/// [`ensure_token_valid`](Self::ensure_token_valid) at the top of every
/// cycle and pushes the returned bearer into the readings client.
pub struct TokenSession {
    http: reqwest::Client,
    config: OAuthConfig,
    tokens: RwLock<Option<TokenSet>>,
}

impl TokenSession {
    /// Create a session with no token material (authorization required).
    pub fn new(config: OAuthConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            config,
            tokens: RwLock::new(None),
        }
    }

    /// Create a session from a stored refresh token. The first
    /// `ensure_token_valid` call performs the initial refresh.
    pub fn from_refresh_token(
        config: OAuthConfig,
        http: reqwest::Client,
        refresh_token: SecretString,
    ) -> Self {
        let tokens = TokenSet {
            access_token: SecretString::from(String::new()),
            refresh_token,
            // Forces a refresh on first use.
            expires_at: DateTime::<Utc>::MIN_UTC,
        };
        Self {
            http,
            config,
            tokens: RwLock::new(Some(tokens)),
        }
    }

    /// Restore a session from a full token set.
    pub fn restore(config: OAuthConfig, http: reqwest::Client, tokens: TokenSet) -> Self {
        Self {
            http,
            config,
            tokens: RwLock::new(Some(tokens)),
        }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Build the authorization URL for the PKCE flow.
    pub fn authorize_url(&self, pkce: &PkcePair) -> Url {
        let mut url = self.config.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("audience", &self.config.audience)
            .append_pair("state", &pkce.state)
            .append_pair("code_challenge", &pkce.challenge)
            .append_pair("code_challenge_method", "S256");
        url
    }

    /// Exchange an authorization code for tokens and store them.
    pub async fn exchange_code(&self, code: &str, pkce: &PkcePair) -> Result<TokenSet, Error> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", &self.config.client_id),
            ("code", code),
            ("code_verifier", &pkce.verifier),
            ("redirect_uri", &self.config.redirect_uri),
        ];

        let tokens = self.request_tokens(&params, None).await?;
        *self.tokens.write().await = Some(tokens.clone());
        debug!("authorization code exchanged");
        Ok(tokens)
    }

    /// Ensure the current access token is valid, refreshing if needed.
    ///
    /// Returns the bearer to use for API calls. Fails with an
    /// auth-expired error when no usable refresh token exists.
    pub async fn ensure_token_valid(&self) -> Result<SecretString, Error> {
        {
            let guard = self.tokens.read().await;
            match guard.as_ref() {
                None => return Err(Error::NotAuthorized),
                Some(tokens) if tokens.is_valid(Utc::now()) => {
                    return Ok(tokens.access_token.clone());
                }
                Some(_) => {}
            }
        }

        self.refresh().await
    }

    /// The current bearer, without refreshing. `None` before the first
    /// successful exchange or refresh.
    pub async fn current_token(&self) -> Option<SecretString> {
        self.tokens
            .read()
            .await
            .as_ref()
            .map(|t| t.access_token.clone())
    }

    /// The full token set, for persistence by the caller.
    pub async fn token_set(&self) -> Option<TokenSet> {
        self.tokens.read().await.clone()
    }

    /// Force a refresh using the stored refresh token.
    pub async fn refresh(&self) -> Result<SecretString, Error> {
        let mut guard = self.tokens.write().await;

        // Another caller may have refreshed while we waited for the lock.
        if let Some(tokens) = guard.as_ref() {
            if tokens.is_valid(Utc::now()) {
                return Ok(tokens.access_token.clone());
            }
        }

        let refresh_token = guard
            .as_ref()
            .map(|t| t.refresh_token.clone())
            .ok_or(Error::NotAuthorized)?;

        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", &self.config.client_id),
            ("refresh_token", refresh_token.expose_secret()),
        ];

        let tokens = self.request_tokens(&params, Some(&refresh_token)).await?;
        let access = tokens.access_token.clone();
        *guard = Some(tokens);
        debug!("access token refreshed");
        Ok(access)
    }

    /// POST to the token endpoint and parse the payload.
    ///
    /// `previous_refresh` is kept when the server does not rotate the
    /// refresh token.
    async fn request_tokens(
        &self,
        params: &[(&str, &str)],
        previous_refresh: Option<&SecretString>,
    ) -> Result<TokenSet, Error> {
        let resp = self
            .http
            .post(self.config.token_url.clone())
            .form(params)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            if matches!(status.as_u16(), 400 | 401 | 403) && previous_refresh.is_some() {
                debug!(status = status.as_u16(), "refresh token rejected");
                return Err(Error::AuthorizationExpired);
            }
            return Err(Error::TokenEndpoint {
                status: status.as_u16(),
                body,
            });
        }

        let payload: TokenPayload =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body,
            })?;

        let refresh_token = match (payload.refresh_token, previous_refresh) {
            (Some(rotated), _) => SecretString::from(rotated),
            (None, Some(previous)) => previous.clone(),
            (None, None) => return Err(Error::AuthorizationExpired),
        };

        let lifetime = payload.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);

        Ok(TokenSet {
            access_token: SecretString::from(payload.access_token),
            refresh_token,
            expires_at: Utc::now() + ChronoDuration::seconds(lifetime),
        })
    }
}
