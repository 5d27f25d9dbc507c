//! Orchestration of the bridge's workflows over the remote-service traits.
//!
//! Each workflow is one sequential chain of awaited calls against
//! [`ReviewSystem`](notebridge_core::remote::ReviewSystem),
//! [`SpreadsheetService`](notebridge_core::remote::SpreadsheetService) and
//! [`FileStore`](notebridge_core::remote::FileStore); all mapping decisions
//! live in `notebridge-core`.

pub mod export;
pub mod import;
pub mod prep;
pub mod review;

pub use export::{ExportSettings, PlaylistExporter};
pub use import::NotesImporter;
pub use prep::SheetPrep;
