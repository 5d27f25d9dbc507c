use notebridge_core::error::RemoteError;

/// Errors from the Google REST layer.
#[derive(Debug, thiserror::Error)]
pub enum GoogleApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Google returned a non-2xx status code.
    #[error("Google API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A request URL could not be built.
    #[error("Invalid request URL: {0}")]
    Url(#[from] url::ParseError),

    /// The service-account key could not be used to sign an assertion.
    #[error("Invalid service-account key: {0}")]
    Key(#[from] jsonwebtoken::errors::Error),

    /// The token endpoint refused the assertion.
    #[error("Token exchange failed: {0}")]
    Auth(String),

    /// The response parsed as JSON but not in the expected shape.
    #[error("Unexpected response: {0}")]
    Payload(String),
}

impl GoogleApiError {
    /// Convert at the trait seam, naming the calling service.
    pub fn into_remote(self, service: &'static str) -> RemoteError {
        match self {
            Self::Request(e) => RemoteError::Request {
                service,
                message: e.to_string(),
            },
            Self::ApiError { status, body } => RemoteError::Api {
                service,
                status,
                body,
            },
            Self::Url(e) => RemoteError::Request {
                service,
                message: e.to_string(),
            },
            Self::Key(e) => RemoteError::Auth {
                service,
                message: e.to_string(),
            },
            Self::Auth(message) => RemoteError::Auth { service, message },
            Self::Payload(message) => RemoteError::Decode {
                entity: service,
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn api_error_keeps_service_and_status() {
        let remote = GoogleApiError::ApiError {
            status: 404,
            body: "Requested entity was not found.".into(),
        }
        .into_remote("Google Drive");
        assert_matches!(remote, RemoteError::Api { service: "Google Drive", status: 404, .. });
    }

    #[test]
    fn token_failures_become_auth_errors() {
        let remote = GoogleApiError::Auth("invalid_grant".into()).into_remote("Google Sheets");
        assert_matches!(remote, RemoteError::Auth { ref message, .. } if message == "invalid_grant");
    }
}
