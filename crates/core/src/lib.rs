//! Core types and pure mapping logic for the review-system ↔ spreadsheet bridge.
//!
//! Holds the record types read from the review system, the two status
//! translation tables, the export and import row mappings, A1 range
//! helpers, the sheet-prep transforms, and the async traits every remote
//! collaborator is accessed through.

pub mod error;
pub mod export;
pub mod import;
pub mod matching;
pub mod prep;
pub mod remote;
pub mod schema;
pub mod sheet;
pub mod status;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
