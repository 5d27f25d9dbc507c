//! Service-account OAuth: RS256-signed assertion exchanged for a bearer token.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::credentials::ServiceAccountKey;
use crate::error::GoogleApiError;

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for each assertion (Google's maximum).
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Refresh this long before the token's reported expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Claims of the signed assertion posted to the token endpoint.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AssertionClaims {
    /// Issuer: the service account's email.
    pub iss: String,
    /// Space-separated OAuth scopes.
    pub scope: String,
    /// Audience: the token endpoint.
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl AssertionClaims {
    pub fn new(key: &ServiceAccountKey, scopes: &[&str], now: DateTime<Utc>) -> Self {
        let iat = now.timestamp();
        Self {
            iss: key.client_email.clone(),
            scope: scopes.join(" "),
            aud: key.token_uri.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Signs assertions for one service account and caches the access token.
pub struct ServiceAccountAuth {
    client: reqwest::Client,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    scopes: Vec<String>,
    token: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    /// Fails when the private key is not a valid RSA PEM.
    pub fn new(key: ServiceAccountKey, scopes: &[&str]) -> Result<Self, GoogleApiError> {
        Self::with_client(reqwest::Client::new(), key, scopes)
    }

    pub fn with_client(
        client: reqwest::Client,
        key: ServiceAccountKey,
        scopes: &[&str],
    ) -> Result<Self, GoogleApiError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
        Ok(Self {
            client,
            key,
            encoding_key,
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            token: Mutex::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Signed RS256 assertion for the configured scopes.
    pub fn assertion(&self, now: DateTime<Utc>) -> Result<String, GoogleApiError> {
        let scopes: Vec<&str> = self.scopes.iter().map(String::as_str).collect();
        let claims = AssertionClaims::new(&self.key, &scopes, now);
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();
        Ok(encode(&header, &claims, &self.encoding_key)?)
    }

    /// Current bearer token, exchanging a fresh assertion when needed.
    pub async fn bearer(&self) -> Result<String, GoogleApiError> {
        let mut cached = self.token.lock().await;
        let now = Utc::now();
        if let Some(token) = cached.as_ref().filter(|t| now < t.expires_at) {
            return Ok(token.value.clone());
        }

        let assertion = self.assertion(now)?;
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GoogleApiError::Auth(format!("{}: {body}", status.as_u16())));
        }

        let issued: TokenResponse = response.json().await?;
        let token = CachedToken {
            value: issued.access_token,
            expires_at: now + Duration::seconds(issued.expires_in - EXPIRY_MARGIN_SECS),
        };
        let value = token.value.clone();
        *cached = Some(token);
        tracing::info!(account = %self.key.client_email, "Google access token refreshed");
        Ok(value)
    }
}
