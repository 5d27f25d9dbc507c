use notebridge_core::error::RemoteError;

const SERVICE: &str = "ShotGrid";

/// Errors from the ShotGrid REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ShotgridError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// ShotGrid returned a non-2xx status code.
    #[error("ShotGrid API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The access-token exchange was refused.
    #[error("ShotGrid authentication failed: {0}")]
    Auth(String),

    /// No REST collection is known for this entity type.
    #[error("Unsupported ShotGrid entity type: {0}")]
    UnknownEntity(String),

    /// The response parsed as JSON but not in the expected shape.
    #[error("Unexpected ShotGrid payload: {0}")]
    Payload(String),
}

impl From<ShotgridError> for RemoteError {
    fn from(err: ShotgridError) -> Self {
        match err {
            ShotgridError::Request(e) => RemoteError::Request {
                service: SERVICE,
                message: e.to_string(),
            },
            ShotgridError::ApiError { status, body } => RemoteError::Api {
                service: SERVICE,
                status,
                body,
            },
            ShotgridError::Auth(message) => RemoteError::Auth {
                service: SERVICE,
                message,
            },
            ShotgridError::UnknownEntity(entity_type) => RemoteError::Request {
                service: SERVICE,
                message: format!("unsupported entity type {entity_type}"),
            },
            ShotgridError::Payload(message) => RemoteError::Decode {
                entity: "ShotGrid response",
                message,
            },
        }
    }
}
