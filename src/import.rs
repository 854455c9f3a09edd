use std::path::Path;

use sqlx::SqlitePool;
use tracing::{error, info};

use crate::db;
use crate::models::{ImportSummary, Sheet, SheetOutcome};
use crate::normalize;
use crate::workbook;

/// Normalizes and appends each sheet in workbook order.
///
/// A sheet that fails to persist is reported as failed; later sheets still run.
pub async fn import_sheets(pool: &SqlitePool, sheets: &[Sheet]) -> ImportSummary {
    let mut summary = ImportSummary::default();

    for sheet in sheets {
        let outcome = match normalize::normalize_sheet(&sheet.name, &sheet.rows) {
            Err(reason) => {
                info!(sheet = %sheet.name, reason = reason.describe(), "skipping sheet");
                SheetOutcome::Skipped(reason)
            }
            Ok(records) => match db::insert_batch(pool, &records).await {
                Ok(count) => {
                    info!(sheet = %sheet.name, count, "imported sheet");
                    SheetOutcome::Imported(count)
                }
                Err(err) => {
                    error!(sheet = %sheet.name, error = %err, "failed to append sheet");
                    SheetOutcome::Failed(err.to_string())
                }
            },
        };
        summary.record(&sheet.name, outcome);
    }

    summary
}

/// Appends every sheet of the workbook to the existing table.
pub async fn import_workbook(pool: &SqlitePool, path: &Path) -> anyhow::Result<ImportSummary> {
    let sheets = workbook::read_workbook(path)?;
    Ok(import_sheets(pool, &sheets).await)
}

/// Recreates the table, then imports the workbook into it.
///
/// The workbook is read before the reset, so a missing or unreadable file
/// leaves the store as it was.
pub async fn reset_and_import(pool: &SqlitePool, path: &Path) -> anyhow::Result<ImportSummary> {
    let sheets = workbook::read_workbook(path)?;
    db::init_db(pool).await?;
    Ok(import_sheets(pool, &sheets).await)
}
