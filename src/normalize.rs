//! Reduces one loosely structured award sheet to `NewScholarship` rows.
//!
//! Everything here is pure: rows come in as `Cell` grids, records come out.
//! Sheets do not share state, so each can be normalized on its own.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Cell, NewScholarship, RenewalStatus, SkipReason};

/// Substrings that identify the header row (case-sensitive).
pub const HEADER_MARKERS: &[&str] = &["學號", "Student ID"];

/// Any cell containing one of these marks the award as non-renewable.
pub const DISQUALIFYING_PHRASES: &[&str] = &["不得再續領", "not eligible for renewal"];

/// Sheets whose lowercased name contains this are templates, not award data.
pub const EXCLUDED_SHEET_MARKER: &str = "for";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    StudentId,
    Name,
    Country,
    Department,
    Grade,
    TotalAmount,
}

/// Canonical fields and their candidate header keywords, tried in order.
pub const FIELD_KEYWORDS: &[(Field, &[&str])] = &[
    (Field::StudentId, &["學號", "Student ID"]),
    (Field::Name, &["姓名", "Name", "英文姓名", "受獎生姓名"]),
    (Field::Country, &["國籍", "Country"]),
    (Field::Department, &["系所", "Department", "國內就讀學程"]),
    (Field::Grade, &["年級", "Grade"]),
    (Field::TotalAmount, &["小計", "Total", "請款金額"]),
];

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}")
        .expect("email pattern compiles")
});

pub type ColumnMap = HashMap<Field, usize>;

pub fn is_excluded_sheet(sheet_name: &str) -> bool {
    sheet_name.to_lowercase().contains(EXCLUDED_SHEET_MARKER)
}

/// Index of the first row with a cell containing a header marker.
pub fn locate_header(rows: &[Vec<Cell>]) -> Option<usize> {
    rows.iter().position(|row| {
        row.iter().any(|cell| {
            let text = cell.render();
            HEADER_MARKERS.iter().any(|marker| text.contains(marker))
        })
    })
}

/// Leftmost header matching the earliest keyword that matches anything.
fn resolve_column(header: &[String], keywords: &[&str]) -> Option<usize> {
    keywords
        .iter()
        .find_map(|keyword| header.iter().position(|name| name.contains(keyword)))
}

pub fn resolve_columns(header: &[String], keywords: &[(Field, &[&str])]) -> ColumnMap {
    keywords
        .iter()
        .filter_map(|(field, candidates)| {
            resolve_column(header, candidates).map(|column| (*field, column))
        })
        .collect()
}

pub fn month_columns(header: &[String]) -> [Option<usize>; 12] {
    std::array::from_fn(|index| {
        let keyword = format!("{}月", index + 1);
        header.iter().position(|name| name.contains(&keyword))
    })
}

pub fn coerce_amount(cell: Option<&Cell>) -> f64 {
    cell.and_then(Cell::as_number).unwrap_or(0.0)
}

/// Twelve monthly amounts per data row; absent or unparsable cells read as 0.
pub fn extract_month_amounts(header: &[String], rows: &[Vec<Cell>]) -> Vec<[f64; 12]> {
    let columns = month_columns(header);
    rows.iter()
        .map(|row| month_amounts(&columns, row))
        .collect()
}

fn month_amounts(columns: &[Option<usize>; 12], row: &[Cell]) -> [f64; 12] {
    std::array::from_fn(|index| coerce_amount(columns[index].and_then(|column| row.get(column))))
}

/// First email-looking substring in the row, scanning cells left to right.
pub fn extract_email(row: &[Cell]) -> Option<String> {
    row.iter()
        .filter(|cell| !cell.is_blank())
        .find_map(|cell| {
            EMAIL_PATTERN
                .find(&cell.render())
                .map(|found| found.as_str().to_string())
        })
}

pub fn derive_can_renew(row: &[Cell]) -> RenewalStatus {
    let disqualified = row.iter().any(|cell| {
        let text = cell.render();
        DISQUALIFYING_PHRASES
            .iter()
            .any(|phrase| text.contains(phrase))
    });

    if disqualified {
        RenewalStatus::No
    } else {
        RenewalStatus::Yes
    }
}

fn text_field(row: &[Cell], column: Option<usize>) -> Option<String> {
    let text = row.get(column?)?.render();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn is_empty_sheet(rows: &[Vec<Cell>]) -> bool {
    rows.iter().all(|row| row.iter().all(Cell::is_blank))
}

/// Normalizes one sheet, or reports why the whole sheet was skipped.
///
/// Rows below the header without a student id are dropped. The email column,
/// if any, is ignored in favour of scanning every cell of the row.
pub fn normalize_sheet(
    sheet_name: &str,
    rows: &[Vec<Cell>],
) -> Result<Vec<NewScholarship>, SkipReason> {
    if is_empty_sheet(rows) {
        return Err(SkipReason::Empty);
    }
    if is_excluded_sheet(sheet_name) {
        return Err(SkipReason::Excluded);
    }

    let header_index = locate_header(rows).ok_or(SkipReason::HeaderNotFound)?;
    let header: Vec<String> = rows[header_index].iter().map(Cell::render).collect();
    let data_rows = &rows[header_index + 1..];

    let columns = resolve_columns(&header, FIELD_KEYWORDS);
    let months = extract_month_amounts(&header, data_rows);
    let column = |field: Field| columns.get(&field).copied();

    let records = data_rows
        .iter()
        .zip(months)
        .filter_map(|(row, months)| {
            let student_id = text_field(row, column(Field::StudentId))?;
            Some(NewScholarship {
                student_id,
                name: text_field(row, column(Field::Name)),
                country: text_field(row, column(Field::Country)),
                department: text_field(row, column(Field::Department)),
                grade: text_field(row, column(Field::Grade)),
                scholarship_type: sheet_name.to_string(),
                can_renew: derive_can_renew(row),
                months,
                total_amount: column(Field::TotalAmount)
                    .and_then(|index| row.get(index))
                    .and_then(Cell::as_number),
                email: extract_email(row),
            })
        })
        .collect();

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[Cell]) -> Vec<Cell> {
        cells.to_vec()
    }

    fn text(value: &str) -> Cell {
        Cell::from(value)
    }

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn header_found_below_title_rows() {
        let rows = vec![
            row(&[text("113學年度 豐泰獎學金"), Cell::Empty]),
            row(&[Cell::Empty, Cell::Empty]),
            row(&[text("序號"), text("學號 Student ID")]),
            row(&[1i64.into(), text("S1")]),
        ];
        assert_eq!(locate_header(&rows), Some(2));
    }

    #[test]
    fn header_markers_are_case_sensitive() {
        let rows = vec![row(&[text("student id"), text("name")])];
        assert_eq!(locate_header(&rows), None);
        assert_eq!(locate_header(&[]), None);
    }

    #[test]
    fn resolver_prefers_earlier_keyword_then_leftmost_column() {
        let columns = resolve_columns(
            &header(&["Name", "英文姓名", "姓名", "Student ID"]),
            FIELD_KEYWORDS,
        );
        assert_eq!(columns.get(&Field::Name), Some(&1));
        assert_eq!(columns.get(&Field::StudentId), Some(&3));
    }

    #[test]
    fn resolver_omits_fields_without_matching_header() {
        let columns = resolve_columns(&header(&["學號", "Department of study"]), FIELD_KEYWORDS);
        assert_eq!(columns.get(&Field::Department), Some(&1));
        assert!(!columns.contains_key(&Field::Country));
        assert!(!columns.contains_key(&Field::TotalAmount));
    }

    #[test]
    fn missing_months_fill_with_zero_and_text_coerces_to_zero() {
        let rows = vec![
            row(&[text("S1"), 1500i64.into(), text("n/a")]),
            row(&[text("S2"), text(" 2000 "), Cell::Empty]),
        ];
        let amounts = extract_month_amounts(&header(&["學號", "3月", "4月份"]), &rows);

        assert_eq!(amounts.len(), 2);
        assert_eq!(amounts[0][2], 1500.0);
        assert_eq!(amounts[0][3], 0.0);
        assert_eq!(amounts[1][2], 2000.0);
        for month in [0, 1, 4, 5, 6, 7, 8, 9, 10, 11] {
            assert_eq!(amounts[0][month], 0.0);
            assert_eq!(amounts[1][month], 0.0);
        }
    }

    #[test]
    fn coercion_keeps_negatives_and_rejects_non_finite() {
        assert_eq!(coerce_amount(Some(&text("-300"))), -300.0);
        assert_eq!(coerce_amount(Some(&text("NaN"))), 0.0);
        assert_eq!(coerce_amount(Some(&text("inf"))), 0.0);
        assert_eq!(coerce_amount(Some(&Cell::Bool(true))), 0.0);
        assert_eq!(coerce_amount(Some(&Cell::Number(0.0))), 0.0);
        assert_eq!(coerce_amount(None), 0.0);
    }

    #[test]
    fn month_keyword_matches_by_substring() {
        let columns = month_columns(&header(&["11月", "12月"]));
        assert_eq!(columns[0], Some(0));
        assert_eq!(columns[1], Some(1));
        assert_eq!(columns[10], Some(0));
        assert_eq!(columns[2], None);
    }

    #[test]
    fn email_is_first_match_in_leftmost_cell() {
        let cells = row(&[
            text("note: contact x@y.com"),
            Cell::Empty,
            text("backup z@w.org"),
        ]);
        assert_eq!(extract_email(&cells).as_deref(), Some("x@y.com"));

        let cells = row(&[text("a@b.co and c@d.io")]);
        assert_eq!(extract_email(&cells).as_deref(), Some("a@b.co"));
    }

    #[test]
    fn email_requires_dotted_domain_with_alpha_tld() {
        let cells = row(&[text("user@localhost"), text("x@host.1"), 42i64.into()]);
        assert_eq!(extract_email(&cells), None);
    }

    #[test]
    fn renewal_flag_scans_every_cell() {
        let cells = row(&[text("S1"), Cell::Empty, text("備註：下學年不得再續領")]);
        assert_eq!(derive_can_renew(&cells), RenewalStatus::No);

        let cells = row(&[text("Renewal"), text("Not eligible for renewal")]);
        assert_eq!(derive_can_renew(&cells), RenewalStatus::Yes);

        let cells = row(&[text("S2"), text("可續領")]);
        assert_eq!(derive_can_renew(&cells), RenewalStatus::Yes);
    }

    #[test]
    fn excluded_sheet_names_match_any_case() {
        assert!(is_excluded_sheet("Template for 2025"));
        assert!(is_excluded_sheet("FORM"));
        assert!(!is_excluded_sheet("新南向"));

        let rows = vec![row(&[text("學號")]), row(&[text("S1")])];
        assert_eq!(normalize_sheet("Format", &rows), Err(SkipReason::Excluded));
    }

    #[test]
    fn empty_and_headerless_sheets_are_skipped() {
        assert_eq!(normalize_sheet("A", &[]), Err(SkipReason::Empty));
        let blank = vec![row(&[Cell::Empty, text("  ")])];
        assert_eq!(normalize_sheet("A", &blank), Err(SkipReason::Empty));

        let headerless = vec![row(&[text("姓名")]), row(&[text("Alice")])];
        assert_eq!(
            normalize_sheet("A", &headerless),
            Err(SkipReason::HeaderNotFound)
        );
    }

    #[test]
    fn normalizes_sheet_end_to_end() {
        let rows = vec![
            row(&[text("學號"), text("姓名"), text("1月"), text("不得再續領欄")]),
            row(&[text("S1"), text("Alice"), 100i64.into(), Cell::Empty]),
            row(&[text("S2"), text("Bob"), 200i64.into(), text("不得再續領")]),
        ];

        let records = normalize_sheet("A", &rows).expect("sheet imports");
        assert_eq!(records.len(), 2);

        let alice = &records[0];
        assert_eq!(alice.student_id, "S1");
        assert_eq!(alice.name.as_deref(), Some("Alice"));
        assert_eq!(alice.months[0], 100.0);
        assert!(alice.months[1..].iter().all(|amount| *amount == 0.0));
        assert_eq!(alice.can_renew, RenewalStatus::Yes);
        assert_eq!(alice.scholarship_type, "A");

        let bob = &records[1];
        assert_eq!(bob.student_id, "S2");
        assert_eq!(bob.months[0], 200.0);
        assert_eq!(bob.can_renew, RenewalStatus::No);
        assert_eq!(bob.scholarship_type, "A");
    }

    #[test]
    fn rows_without_student_id_are_dropped() {
        let rows = vec![
            row(&[text("學號"), text("姓名"), text("小計"), text("Email")]),
            row(&[10812345i64.into(), text("Chen"), 30000i64.into(), text("chen@mail.edu.tw")]),
            row(&[Cell::Empty, text("合計"), 30000i64.into(), Cell::Empty]),
            row(&[text("   "), text("Nobody"), Cell::Empty, Cell::Empty]),
        ];

        let records = normalize_sheet("豐泰", &rows).expect("sheet imports");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].student_id, "10812345");
        assert_eq!(records[0].total_amount, Some(30000.0));
        assert_eq!(records[0].email.as_deref(), Some("chen@mail.edu.tw"));
        assert_eq!(records[0].country, None);
    }

    #[test]
    fn email_comes_from_any_cell_not_the_email_column() {
        let rows = vec![
            row(&[text("Student ID"), text("Email"), text("Remarks")]),
            row(&[text("S9"), text("not provided"), text("reach me at s9@uni.edu")]),
        ];

        let records = normalize_sheet("MOU", &rows).expect("sheet imports");
        assert_eq!(records[0].email.as_deref(), Some("s9@uni.edu"));
    }
}
