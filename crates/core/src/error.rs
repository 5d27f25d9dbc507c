/// Failure reported by a remote collaborator (review system, spreadsheet
/// service, or file store).
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The request never produced a response (network, DNS, TLS, etc.).
    #[error("{service} request failed: {message}")]
    Request {
        service: &'static str,
        message: String,
    },

    /// The service answered with a non-2xx status.
    #[error("{service} API error ({status}): {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// Obtaining or refreshing an access token failed.
    #[error("{service} authentication failed: {message}")]
    Auth {
        service: &'static str,
        message: String,
    },

    /// A response body could not be mapped onto the expected record shape.
    #[error("Unexpected {entity} payload: {message}")]
    Decode {
        entity: &'static str,
        message: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Missing required column headers in sheet '{sheet}': {}", missing.join(", "))]
    Schema { sheet: String, missing: Vec<String> },

    #[error("{0}")]
    Data(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}
