use std::sync::Arc;

use notebridge_core::remote::{FileStore, ReviewSystem, SpreadsheetService};
use notebridge_core::sheet::spreadsheet_id_from;
use notebridge_pipeline::{ExportSettings, NotesImporter, PlaylistExporter, SheetPrep};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; the remote clients are built once in `main` (or
/// replaced by in-memory fakes in tests).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub review: Arc<dyn ReviewSystem>,
    pub sheets: Arc<dyn SpreadsheetService>,
    pub files: Arc<dyn FileStore>,
}

impl AppState {
    pub fn exporter(&self) -> PlaylistExporter {
        PlaylistExporter::new(
            self.review.clone(),
            self.sheets.clone(),
            self.files.clone(),
            ExportSettings {
                template_file_id: spreadsheet_id_from(&self.config.template_spreadsheet_id)
                    .to_string(),
                share_domain: self.config.share_domain.clone(),
            },
        )
    }

    pub fn importer(&self) -> NotesImporter {
        NotesImporter::new(self.review.clone(), self.sheets.clone())
    }

    pub fn sheet_prep(&self) -> SheetPrep {
        SheetPrep::new(self.sheets.clone())
    }
}
