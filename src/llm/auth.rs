//! Service-account authentication
//!
//! Signs a short-lived RS256 assertion with the account's private key and trades it
//! for an OAuth access token at the account's token endpoint. Tokens are not cached:
//! every run mints a fresh one.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Covers both the regional (aiplatform) and global (generativelanguage) endpoints
pub const TOKEN_SCOPES: &str = "https://www.googleapis.com/auth/cloud-platform https://www.googleapis.com/auth/generative-language";

pub const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("failed to parse service account credentials: {0}")]
    InvalidCredentials(#[source] serde_json::Error),

    #[error("service account credentials are missing `{0}`")]
    MissingField(&'static str),

    #[error("failed to parse private key: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),

    #[error("failed to sign assertion: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("failed to exchange assertion for access token: {0}")]
    Exchange(#[source] reqwest::Error),

    #[error("token exchange failed with status {status}: {body}")]
    TokenEndpoint { status: u16, body: String },

    #[error("failed to parse token response: {0}")]
    InvalidTokenResponse(String),
}

/// The parts of a service-account JSON key file this crate uses
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    pub token_uri: String,
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        let key: ServiceAccountKey =
            serde_json::from_str(json).map_err(AuthError::InvalidCredentials)?;

        if key.client_email.is_empty() {
            return Err(AuthError::MissingField("client_email"));
        }
        if key.private_key.is_empty() {
            return Err(AuthError::MissingField("private_key"));
        }
        if key.token_uri.is_empty() {
            return Err(AuthError::MissingField("token_uri"));
        }

        Ok(key)
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"***")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

/// Claims of the assertion sent to the token endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl AssertionClaims {
    pub fn new(key: &ServiceAccountKey, scope: &str, issued_at: DateTime<Utc>) -> Self {
        Self {
            iss: key.client_email.clone(),
            scope: scope.to_string(),
            aud: key.token_uri.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + Duration::seconds(ASSERTION_LIFETIME_SECS)).timestamp(),
        }
    }
}

/// Encode and sign `claims` as `header.claims.signature` with RS256
pub fn sign_assertion(private_key_pem: &str, claims: &AssertionClaims) -> Result<String, AuthError> {
    let encoding_key =
        EncodingKey::from_rsa_pem(private_key_pem.as_bytes()).map_err(AuthError::InvalidKey)?;

    jsonwebtoken::encode(&Header::new(Algorithm::RS256), claims, &encoding_key)
        .map_err(AuthError::Signing)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    token_type: String,
    #[serde(default)]
    expires_in: u64,
}

/// Mints bearer tokens for one service account
#[derive(Debug, Clone)]
pub struct ServiceAccountAuthenticator {
    key: ServiceAccountKey,
    scope: String,
}

impl ServiceAccountAuthenticator {
    pub fn new(key: ServiceAccountKey) -> Self {
        Self {
            key,
            scope: TOKEN_SCOPES.to_string(),
        }
    }

    /// Parse the raw service-account JSON
    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        Ok(Self::new(ServiceAccountKey::from_json(json)?))
    }

    /// The signed assertion for `now`
    pub fn assertion(&self, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = AssertionClaims::new(&self.key, &self.scope, now);
        sign_assertion(&self.key.private_key, &claims)
    }

    /// Sign an assertion and exchange it for an access token
    pub async fn access_token(&self, http_client: &Client) -> Result<String, AuthError> {
        let assertion = self.assertion(Utc::now())?;

        tracing::debug!(
            token_uri = %self.key.token_uri,
            issuer = %self.key.client_email,
            "exchanging service account assertion"
        );

        let response = http_client
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", JWT_BEARER_GRANT_TYPE),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(AuthError::Exchange)?;

        let status = response.status();
        let body = response.text().await.map_err(AuthError::Exchange)?;

        if !status.is_success() {
            return Err(AuthError::TokenEndpoint {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| AuthError::InvalidTokenResponse(e.to_string()))?;

        if token.access_token.is_empty() {
            return Err(AuthError::InvalidTokenResponse(
                "response has no access_token".to_string(),
            ));
        }

        tracing::debug!(
            token_type = %token.token_type,
            expires_in = token.expires_in,
            "access token obtained"
        );

        Ok(token.access_token)
    }
}
