use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("source workbook not found: {}", .0.display())]
    MissingSourceFile(PathBuf),

    #[error("failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("failed to write export workbook: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    #[error("missing required field: {0}")]
    MissingRequiredField(&'static str),
}
