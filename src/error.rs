use std::path::PathBuf;

use rust_xlsxwriter::XlsxError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("cannot read input file {path}")]
    Input {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("input is missing required column `{column}`")]
    MissingColumn { column: String },
    #[error("row {row} could not be parsed")]
    MalformedRow {
        row: u64,
        #[source]
        source: csv::Error,
    },
    #[error("sheet `{0}` already exists in the report")]
    DuplicateSheet(String),
    #[error("spreadsheet write failed")]
    Spreadsheet(#[from] XlsxError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Coarse failure classes a caller can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Input,
    Column,
    Write,
}

impl FailureKind {
    pub fn exit_code(self) -> u8 {
        match self {
            FailureKind::Input => 1,
            FailureKind::Column => 2,
            FailureKind::Write => 3,
        }
    }
}

impl ReportError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ReportError::Input { .. } => FailureKind::Input,
            ReportError::MissingColumn { .. } | ReportError::MalformedRow { .. } => {
                FailureKind::Column
            }
            ReportError::DuplicateSheet(_) | ReportError::Spreadsheet(_) | ReportError::Io(_) => {
                FailureKind::Write
            }
        }
    }

    /// Message including every `source` in the chain.
    pub fn detail(&self) -> String {
        let mut detail = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            detail.push_str(": ");
            detail.push_str(&cause.to_string());
            source = cause.source();
        }
        detail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_failure_taxonomy() {
        let missing = ReportError::MissingColumn {
            column: "year".to_string(),
        };
        assert_eq!(missing.kind(), FailureKind::Column);
        assert_eq!(
            ReportError::DuplicateSheet("README".to_string()).kind(),
            FailureKind::Write
        );
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        assert_eq!(ReportError::from(io).kind(), FailureKind::Write);
    }

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            FailureKind::Input.exit_code(),
            FailureKind::Column.exit_code(),
            FailureKind::Write.exit_code(),
        ];
        assert!(codes.iter().all(|code| *code != 0));
        assert_ne!(codes[0], codes[1]);
        assert_ne!(codes[1], codes[2]);
        assert_ne!(codes[0], codes[2]);
    }

    #[test]
    fn detail_includes_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such directory");
        let error = ReportError::Io(io);
        assert!(error.detail().contains("no such directory"));
    }
}
