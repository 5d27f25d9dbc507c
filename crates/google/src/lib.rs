//! Google Sheets v4 and Drive v3 clients authenticated as a service account.
//!
//! [`SheetsClient`] implements [`notebridge_core::remote::SpreadsheetService`]
//! and [`DriveClient`] implements [`notebridge_core::remote::FileStore`].
//! Both share one [`ServiceAccountAuth`], which signs an RS256 assertion and
//! caches the exchanged access token.

pub mod auth;
pub mod credentials;
pub mod drive;
pub mod error;
pub mod sheets;

pub use auth::ServiceAccountAuth;
pub use credentials::ServiceAccountKey;
pub use drive::DriveClient;
pub use error::GoogleApiError;
pub use sheets::SheetsClient;
