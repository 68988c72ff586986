//! External identity provider.
//!
//! The sign-in routes only need two things from a provider: an
//! authorization URL to redirect the browser to, and a way to turn the
//! returned authorization code into a verified email address. The
//! [`IdentityProvider`] trait captures exactly that; [`GoogleProvider`]
//! implements it against Google's OAuth 2.0 endpoints (authorization code
//! + PKCE, scopes `profile email`).

use base64::Engine as _;
use sha2::{Digest, Sha256};

/// Scopes requested from the provider.
pub const SCOPES: &str = "profile email";

/// Sign-in failed at the provider. The message is shown to the user as-is.
#[derive(Debug, thiserror::Error)]
pub enum ExternalAuthError {
    /// The provider reported an error (denied consent, bad code, ...).
    #[error("{0}")]
    Provider(String),
    /// The token endpoint could not be reached or answered garbage.
    #[error("token exchange failed: {0}")]
    TokenExchange(String),
    /// The profile could not be fetched or had no usable email.
    #[error("profile fetch failed: {0}")]
    Profile(String),
}

/// An OAuth 2.0 identity provider.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// URL of the provider's consent page for this sign-in attempt.
    fn authorize_url(&self, csrf_state: &str, code_challenge: &str) -> String;

    /// Exchange an authorization code and return the account's email.
    ///
    /// # Errors
    ///
    /// Returns [`ExternalAuthError`] if the exchange or profile fetch fails.
    async fn fetch_email(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<String, ExternalAuthError>;
}

/// PKCE verifier: 64 hex chars from two UUIDs.
#[must_use]
pub fn new_code_verifier() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

/// S256 code challenge = BASE64URL(SHA256(code_verifier)).
#[must_use]
pub fn code_challenge(code_verifier: &str) -> String {
    let hash = Sha256::digest(code_verifier.as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(hash)
}

#[cfg(feature = "google-oauth")]
pub use google::GoogleProvider;

#[cfg(feature = "google-oauth")]
mod google {
    use serde::Deserialize;
    use tracing::warn;

    use super::{ExternalAuthError, IdentityProvider, SCOPES};
    use crate::config::GoogleOAuthConfig;

    /// Token endpoint response.
    #[derive(Debug, Deserialize)]
    struct TokenResponse {
        access_token: String,
    }

    /// OAuth error body (token endpoint).
    #[derive(Debug, Deserialize)]
    struct OAuthErrorBody {
        error: Option<String>,
        error_description: Option<String>,
    }

    /// Userinfo endpoint response.
    #[derive(Debug, Deserialize)]
    struct UserInfo {
        email: Option<String>,
        email_verified: Option<bool>,
    }

    /// Google OAuth 2.0 client.
    #[derive(Debug, Clone)]
    pub struct GoogleProvider {
        config: GoogleOAuthConfig,
        http: reqwest::Client,
    }

    impl GoogleProvider {
        /// Create a provider for the given client registration.
        #[must_use]
        pub fn new(config: GoogleOAuthConfig) -> Self {
            Self {
                config,
                http: reqwest::Client::new(),
            }
        }
    }

    #[async_trait::async_trait]
    impl IdentityProvider for GoogleProvider {
        fn authorize_url(&self, csrf_state: &str, code_challenge: &str) -> String {
            format!(
                "{}?response_type=code\
                 &client_id={}\
                 &redirect_uri={}\
                 &scope={}\
                 &state={}\
                 &code_challenge={}\
                 &code_challenge_method=S256",
                self.config.auth_url,
                urlencoding::encode(&self.config.client_id),
                urlencoding::encode(&self.config.redirect_uri),
                urlencoding::encode(SCOPES),
                urlencoding::encode(csrf_state),
                urlencoding::encode(code_challenge),
            )
        }

        async fn fetch_email(
            &self,
            code: &str,
            code_verifier: &str,
        ) -> Result<String, ExternalAuthError> {
            let token_resp = self
                .http
                .post(&self.config.token_url)
                .form(&[
                    ("grant_type", "authorization_code"),
                    ("code", code),
                    ("redirect_uri", &self.config.redirect_uri),
                    ("client_id", &self.config.client_id),
                    ("client_secret", &self.config.client_secret),
                    ("code_verifier", code_verifier),
                ])
                .send()
                .await
                .map_err(|e| ExternalAuthError::TokenExchange(e.to_string()))?;

            if !token_resp.status().is_success() {
                let status = token_resp.status();
                let body: Option<OAuthErrorBody> = token_resp.json().await.ok();
                warn!(status = %status, "google token exchange rejected");
                let message = body
                    .and_then(|b| b.error_description.or(b.error))
                    .unwrap_or_else(|| format!("token endpoint returned {status}"));
                return Err(ExternalAuthError::Provider(message));
            }

            let tokens: TokenResponse = token_resp
                .json()
                .await
                .map_err(|e| ExternalAuthError::TokenExchange(e.to_string()))?;

            let userinfo_resp = self
                .http
                .get(&self.config.userinfo_url)
                .bearer_auth(&tokens.access_token)
                .send()
                .await
                .map_err(|e| ExternalAuthError::Profile(e.to_string()))?;

            if !userinfo_resp.status().is_success() {
                return Err(ExternalAuthError::Profile(format!(
                    "userinfo endpoint returned {}",
                    userinfo_resp.status()
                )));
            }

            let userinfo: UserInfo = userinfo_resp
                .json()
                .await
                .map_err(|e| ExternalAuthError::Profile(e.to_string()))?;

            if userinfo.email_verified == Some(false) {
                return Err(ExternalAuthError::Profile(
                    "email address is not verified".to_owned(),
                ));
            }

            userinfo
                .email
                .ok_or_else(|| ExternalAuthError::Profile("profile has no email".to_owned()))
        }
    }

}
