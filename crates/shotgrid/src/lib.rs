//! ShotGrid REST API v1 client.
//!
//! Authenticates with script credentials, searches entities with the
//! array filter syntax and flattens JSON:API resources into the flat
//! records the rest of the bridge works with. [`ShotgridClient`]
//! implements [`notebridge_core::remote::ReviewSystem`].

pub mod auth;
pub mod client;
pub mod entity;
pub mod error;

pub use client::ShotgridClient;
pub use error::ShotgridError;
