use std::fmt::Write;

use crate::models::{ImportSummary, ScholarshipRecord, SheetOutcome};

pub fn build_import_report(summary: &ImportSummary) -> String {
    let mut output = String::new();

    for sheet in summary.sheets.iter() {
        match &sheet.outcome {
            SheetOutcome::Imported(count) => {
                let _ = writeln!(output, "[{}] imported {} rows", sheet.sheet_name, count);
            }
            SheetOutcome::Skipped(reason) => {
                let _ = writeln!(
                    output,
                    "[{}] skipped ({})",
                    sheet.sheet_name,
                    reason.describe()
                );
            }
            SheetOutcome::Failed(message) => {
                let _ = writeln!(output, "[{}] failed: {}", sheet.sheet_name, message);
            }
        }
    }

    let _ = writeln!(output, "Import complete: {} rows in total.", summary.total);
    output
}

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|text| !text.is_empty()).unwrap_or("-")
}

/// One line per record, without the surrogate id.
pub fn build_search_listing(records: &[ScholarshipRecord]) -> String {
    let mut output = String::new();

    if records.is_empty() {
        let _ = writeln!(output, "No matching records.");
        return output;
    }

    let _ = writeln!(output, "Found {} records:", records.len());
    for record in records {
        let months: Vec<String> = record
            .months
            .iter()
            .enumerate()
            .filter(|(_, amount)| **amount != 0.0)
            .map(|(index, amount)| format!("{}月={}", index + 1, amount))
            .collect();

        let _ = writeln!(
            output,
            "- {} {} ({}, {}, {}) {} renew={} total={:.0} email={} months=[{}]",
            record.student_id,
            or_dash(record.name.as_deref()),
            or_dash(record.country.as_deref()),
            or_dash(record.department.as_deref()),
            or_dash(record.grade.as_deref()),
            or_dash(record.scholarship_type.as_deref()),
            or_dash(record.can_renew.as_deref()),
            record.total_amount,
            or_dash(record.email.as_deref()),
            months.join(", ")
        );
    }

    output
}
