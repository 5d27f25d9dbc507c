//! Script-credential access tokens.

use std::time::{Duration, Instant};

use serde::Deserialize;

/// Refresh this long before the server-side expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// API script name and key, as configured on the ShotGrid site.
#[derive(Debug, Clone)]
pub struct ScriptCredentials {
    pub script_name: String,
    pub api_key: String,
}

impl ScriptCredentials {
    /// Form body for `POST /api/v1/auth/access_token`.
    pub fn token_form(&self) -> [(&'static str, &str); 3] {
        [
            ("grant_type", "client_credentials"),
            ("client_id", &self.script_name),
            ("client_secret", &self.api_key),
        ]
    }
}

/// Body of a successful token exchange.
#[derive(Debug, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    /// Lifetime in seconds.
    pub expires_in: u64,
}

/// A bearer token with its local expiry.
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub value: String,
    expires_at: Instant,
}

impl CachedToken {
    pub fn issued(response: AccessTokenResponse, now: Instant) -> Self {
        let lifetime = Duration::from_secs(response.expires_in).saturating_sub(EXPIRY_MARGIN);
        Self {
            value: response.access_token,
            expires_at: now + lifetime,
        }
    }

    pub fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_carries_script_identity() {
        let creds = ScriptCredentials {
            script_name: "notes_bridge".to_string(),
            api_key: "secret".to_string(),
        };
        let form = creds.token_form();
        assert_eq!(form[0], ("grant_type", "client_credentials"));
        assert_eq!(form[1], ("client_id", "notes_bridge"));
        assert_eq!(form[2], ("client_secret", "secret"));
    }

    #[test]
    fn token_expires_before_server_deadline() {
        let now = Instant::now();
        let token = CachedToken::issued(
            AccessTokenResponse {
                access_token: "abc".to_string(),
                expires_in: 600,
            },
            now,
        );
        assert!(token.is_fresh(now + Duration::from_secs(500)));
        assert!(!token.is_fresh(now + Duration::from_secs(545)));
    }

    #[test]
    fn very_short_lifetimes_are_never_fresh() {
        let now = Instant::now();
        let token = CachedToken::issued(
            AccessTokenResponse {
                access_token: "abc".to_string(),
                expires_in: 30,
            },
            now,
        );
        assert!(!token.is_fresh(now));
    }
}
