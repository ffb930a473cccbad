//! Typed failures raised by the reconciliation core.
//!
//! Normalization and diffing never fail; they degrade to sentinel values.
//! Everything here is a structural or persistence problem that aborts the
//! update step and surfaces to the command layer, where it is wrapped in
//! `anyhow` context.

use std::{fmt, path::PathBuf};

use thiserror::Error;

/// Which side of the reconciliation a table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableRole {
    Tally,
    Target,
}

impl fmt::Display for TableRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableRole::Tally => f.write_str("tally"),
            TableRole::Target => f.write_str("target"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Anchor header '{anchor}' not found in {location}")]
    AnchorNotFound { anchor: String, location: String },

    #[error("The {table} table has no '{column}' key column")]
    MissingKeyColumn { table: TableRole, column: String },

    #[error("Column '{column}' has no header cell in the target sheet")]
    UnmappedColumn { column: String },

    #[error("Sheet '{0}' not found in workbook")]
    SheetNotFound(String),

    #[error("Failed to read workbook {path:?}: {message}")]
    Workbook { path: PathBuf, message: String },

    #[error("Target file {path:?} changed on disk during reconciliation (expected {expected}, found {found})")]
    TargetModified {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("Failed to persist {path:?}: {message}")]
    Persist { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ReconcileError {
    /// Structural errors mean the target layout cannot be trusted; nothing is written.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ReconcileError::AnchorNotFound { .. }
                | ReconcileError::MissingKeyColumn { .. }
                | ReconcileError::UnmappedColumn { .. }
                | ReconcileError::SheetNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_errors_are_classified() {
        let anchor = ReconcileError::AnchorNotFound {
            anchor: "Subj".into(),
            location: "target.xlsx".into(),
        };
        assert!(anchor.is_structural());
        assert_eq!(
            anchor.to_string(),
            "Anchor header 'Subj' not found in target.xlsx"
        );

        let persist = ReconcileError::Persist {
            path: PathBuf::from("target.xlsx"),
            message: "locked".into(),
        };
        assert!(!persist.is_structural());
    }

    #[test]
    fn missing_key_column_names_the_table() {
        let err = ReconcileError::MissingKeyColumn {
            table: TableRole::Target,
            column: "crsno".into(),
        };
        assert_eq!(err.to_string(), "The target table has no 'crsno' key column");
    }
}
