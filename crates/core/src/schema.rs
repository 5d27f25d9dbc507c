//! Header-driven column resolution for the "Notes Back" sheet.
//!
//! Columns are located by header text once per import instead of being
//! assumed at fixed positions, so reordered or inserted template columns
//! keep working.

use crate::error::CoreError;

/// Logical fields read from each annotated row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteColumn {
    VersionCode,
    VersionStatus,
    Body,
    Links,
}

impl NoteColumn {
    pub const ALL: [NoteColumn; 4] = [
        NoteColumn::VersionCode,
        NoteColumn::VersionStatus,
        NoteColumn::Body,
        NoteColumn::Links,
    ];

    /// Exact header text identifying the column.
    pub fn header(&self) -> &'static str {
        match self {
            Self::VersionCode => "Version Code",
            Self::VersionStatus => "Version Status",
            Self::Body => "Body",
            Self::Links => "Links",
        }
    }
}

/// Zero-based positions of every [`NoteColumn`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSchema {
    positions: [usize; 4],
}

impl SheetSchema {
    /// Resolve each required header to the first column carrying that exact
    /// text. Fails with [`CoreError::Schema`] naming every header not found.
    pub fn resolve(sheet: &str, headers: &[String]) -> Result<Self, CoreError> {
        let mut positions = [0; 4];
        let mut missing = Vec::new();

        for (slot, column) in positions.iter_mut().zip(NoteColumn::ALL) {
            match headers.iter().position(|h| h == column.header()) {
                Some(index) => *slot = index,
                None => missing.push(column.header().to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(CoreError::Schema {
                sheet: sheet.to_string(),
                missing,
            });
        }
        Ok(Self { positions })
    }

    pub fn position(&self, column: NoteColumn) -> usize {
        let slot = NoteColumn::ALL
            .iter()
            .position(|c| *c == column)
            .unwrap_or_default();
        self.positions[slot]
    }

    /// Positions in [`NoteColumn::ALL`] order.
    pub fn positions(&self) -> [usize; 4] {
        self.positions
    }

    /// Minimum row length that reaches every required column.
    pub fn required_width(&self) -> usize {
        self.positions.iter().max().map_or(0, |max| max + 1)
    }
}
