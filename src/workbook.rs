use std::path::Path;

use anyhow::Context;
use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::Workbook;
use serde::Serialize;

use crate::error::LedgerError;
use crate::models::{Cell, ScholarshipRecord, Sheet};

pub const EXPORT_SHEET_NAME: &str = "獎學金資料";

/// Display labels for exported columns, in table order (without `id`).
pub const EXPORT_HEADERS: [&str; 20] = [
    "學號", "姓名", "國籍", "系所", "年級", "種類", "可否續領", "1月", "2月", "3月", "4月", "5月",
    "6月", "7月", "8月", "9月", "10月", "11月", "12月", "總額",
];
pub const EMAIL_HEADER: &str = "電子郵件";

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(value) | Data::DateTimeIso(value) | Data::DurationIso(value) => {
            Cell::Text(value.clone())
        }
        Data::Float(value) => Cell::Number(*value),
        Data::Int(value) => Cell::Number(*value as f64),
        Data::Bool(value) => Cell::Bool(*value),
        Data::DateTime(value) => Cell::Number(value.as_f64()),
    }
}

/// Reads every worksheet, in workbook order, as raw cell rows.
pub fn read_workbook(path: &Path) -> Result<Vec<Sheet>, LedgerError> {
    if !path.exists() {
        return Err(LedgerError::MissingSourceFile(path.to_path_buf()));
    }

    let mut workbook = open_workbook_auto(path)?;
    let mut sheets = Vec::new();

    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        let rows = range
            .rows()
            .map(|row| row.iter().map(to_cell).collect())
            .collect();
        sheets.push(Sheet { name, rows });
    }

    Ok(sheets)
}

#[derive(Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "學號")]
    student_id: &'a str,
    #[serde(rename = "姓名")]
    name: Option<&'a str>,
    #[serde(rename = "國籍")]
    country: Option<&'a str>,
    #[serde(rename = "系所")]
    department: Option<&'a str>,
    #[serde(rename = "年級")]
    grade: Option<&'a str>,
    #[serde(rename = "種類")]
    scholarship_type: Option<&'a str>,
    #[serde(rename = "可否續領")]
    can_renew: Option<&'a str>,
    #[serde(rename = "1月")]
    m1: f64,
    #[serde(rename = "2月")]
    m2: f64,
    #[serde(rename = "3月")]
    m3: f64,
    #[serde(rename = "4月")]
    m4: f64,
    #[serde(rename = "5月")]
    m5: f64,
    #[serde(rename = "6月")]
    m6: f64,
    #[serde(rename = "7月")]
    m7: f64,
    #[serde(rename = "8月")]
    m8: f64,
    #[serde(rename = "9月")]
    m9: f64,
    #[serde(rename = "10月")]
    m10: f64,
    #[serde(rename = "11月")]
    m11: f64,
    #[serde(rename = "12月")]
    m12: f64,
    #[serde(rename = "總額")]
    total_amount: f64,
    #[serde(rename = "電子郵件")]
    email: Option<&'a str>,
}

impl<'a> From<&'a ScholarshipRecord> for ExportRow<'a> {
    fn from(record: &'a ScholarshipRecord) -> Self {
        let [m1, m2, m3, m4, m5, m6, m7, m8, m9, m10, m11, m12] = record.months;
        Self {
            student_id: &record.student_id,
            name: record.name.as_deref(),
            country: record.country.as_deref(),
            department: record.department.as_deref(),
            grade: record.grade.as_deref(),
            scholarship_type: record.scholarship_type.as_deref(),
            can_renew: record.can_renew.as_deref(),
            m1,
            m2,
            m3,
            m4,
            m5,
            m6,
            m7,
            m8,
            m9,
            m10,
            m11,
            m12,
            total_amount: record.total_amount,
            email: record.email.as_deref(),
        }
    }
}

pub fn write_csv(path: &Path, records: &[ScholarshipRecord]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for record in records {
        writer.serialize(ExportRow::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_xlsx(path: &Path, records: &[ScholarshipRecord]) -> Result<(), LedgerError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(EXPORT_SHEET_NAME)?;

    let email_column = EXPORT_HEADERS.len() as u16;
    for (column, label) in EXPORT_HEADERS.iter().enumerate() {
        worksheet.write_string(0, column as u16, *label)?;
    }
    worksheet.write_string(0, email_column, EMAIL_HEADER)?;

    for (index, record) in records.iter().enumerate() {
        let row = index as u32 + 1;
        let text_columns = [
            Some(record.student_id.as_str()),
            record.name.as_deref(),
            record.country.as_deref(),
            record.department.as_deref(),
            record.grade.as_deref(),
            record.scholarship_type.as_deref(),
            record.can_renew.as_deref(),
        ];
        for (column, value) in text_columns.iter().enumerate() {
            if let Some(value) = value {
                worksheet.write_string(row, column as u16, *value)?;
            }
        }

        let first_month = text_columns.len() as u16;
        for (offset, amount) in record.months.iter().enumerate() {
            worksheet.write_number(row, first_month + offset as u16, *amount)?;
        }
        worksheet.write_number(row, first_month + 12, record.total_amount)?;

        if let Some(email) = record.email.as_deref() {
            worksheet.write_string(row, email_column, email)?;
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// Writes CSV for a `.csv` path and an xlsx workbook otherwise.
pub fn export(path: &Path, records: &[ScholarshipRecord]) -> anyhow::Result<()> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    if is_csv {
        write_csv(path, records)
    } else {
        write_xlsx(path, records).with_context(|| format!("exporting to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> ScholarshipRecord {
        let mut months = [0.0; 12];
        months[0] = 12000.0;
        ScholarshipRecord {
            id: 1,
            student_id: "M11234".to_string(),
            name: Some("Nguyen An".to_string()),
            country: Some("越南".to_string()),
            department: None,
            grade: Some("1".to_string()),
            scholarship_type: Some("新南向".to_string()),
            can_renew: Some("是".to_string()),
            months,
            total_amount: 12000.0,
            email: Some("an@example.com".to_string()),
        }
    }

    #[test]
    fn missing_workbook_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.xlsx");
        match read_workbook(&path) {
            Err(LedgerError::MissingSourceFile(missing)) => assert_eq!(missing, path),
            other => panic!("expected missing source file, got {other:?}"),
        }
    }

    #[test]
    fn xlsx_export_reads_back_with_localized_headers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("export.xlsx");
        export(&path, &[sample_record()]).expect("export succeeds");

        let sheets = read_workbook(&path).expect("workbook reads");
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].name, EXPORT_SHEET_NAME);

        let header: Vec<String> = sheets[0].rows[0].iter().map(Cell::render).collect();
        assert_eq!(header.len(), 21);
        assert_eq!(header[0], "學號");
        assert_eq!(header[7], "1月");
        assert_eq!(header[20], EMAIL_HEADER);

        let data = &sheets[0].rows[1];
        assert_eq!(data[0].render(), "M11234");
        assert_eq!(data[3], Cell::Empty);
        assert_eq!(data[7].as_number(), Some(12000.0));
        assert_eq!(data[20].render(), "an@example.com");
    }

    #[test]
    fn csv_export_uses_display_labels() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("export.csv");
        export(&path, &[sample_record()]).expect("export succeeds");

        let mut reader = csv::Reader::from_path(&path).expect("csv opens");
        let headers = reader.headers().expect("headers").clone();
        assert_eq!(headers.len(), 21);
        assert_eq!(&headers[0], "學號");
        assert_eq!(&headers[19], "總額");

        let first = reader
            .records()
            .next()
            .expect("one row")
            .expect("row parses");
        assert_eq!(&first[0], "M11234");
        assert_eq!(&first[6], "是");
        assert_eq!(&first[20], "an@example.com");
    }
}
