use serde::Serialize;

/// One spreadsheet cell, reduced to the shapes the import pipeline cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    /// Textual form used for header matching, pattern scans and text fields.
    pub fn render(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(value) => value.trim().to_string(),
            Cell::Number(value) => render_number(*value),
            Cell::Bool(value) => value.to_string(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(value) => value.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric reading of the cell; `None` when it holds no finite number.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            Cell::Number(value) => *value,
            Cell::Text(value) => value.trim().parse::<f64>().ok()?,
            Cell::Empty | Cell::Bool(_) => return None,
        };
        value.is_finite().then_some(value)
    }
}

fn render_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RenewalStatus {
    Yes,
    No,
}

impl RenewalStatus {
    /// Label persisted in the `can_renew` column.
    pub fn label(self) -> &'static str {
        match self {
            RenewalStatus::Yes => "是",
            RenewalStatus::No => "否",
        }
    }
}

/// Award programs accepted for manually added records.
pub const SCHOLARSHIP_TYPES: [&str; 6] = ["豐泰", "教臺", "新南向", "MOU清寒", "雲科清寒", "其他僑生獎學金"];

/// A record ready to be appended to the store; the store assigns `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewScholarship {
    pub student_id: String,
    pub name: Option<String>,
    pub country: Option<String>,
    pub department: Option<String>,
    pub grade: Option<String>,
    pub scholarship_type: String,
    pub can_renew: RenewalStatus,
    pub months: [f64; 12],
    pub total_amount: Option<f64>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScholarshipRecord {
    pub id: i64,
    pub student_id: String,
    pub name: Option<String>,
    pub country: Option<String>,
    pub department: Option<String>,
    pub grade: Option<String>,
    pub scholarship_type: Option<String>,
    pub can_renew: Option<String>,
    pub months: [f64; 12],
    pub total_amount: f64,
    pub email: Option<String>,
}

/// A worksheet as read from the workbook: its name and raw rows.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Empty,
    Excluded,
    HeaderNotFound,
}

impl SkipReason {
    pub fn describe(self) -> &'static str {
        match self {
            SkipReason::Empty => "sheet is empty",
            SkipReason::Excluded => "template sheet excluded by name",
            SkipReason::HeaderNotFound => "no student id header row",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SheetOutcome {
    Imported(usize),
    Skipped(SkipReason),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct SheetReport {
    pub sheet_name: String,
    pub outcome: SheetOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    pub sheets: Vec<SheetReport>,
    pub total: usize,
}

impl ImportSummary {
    pub fn record(&mut self, sheet_name: &str, outcome: SheetOutcome) {
        if let SheetOutcome::Imported(count) = outcome {
            self.total += count;
        }
        self.sheets.push(SheetReport {
            sheet_name: sheet_name.to_string(),
            outcome,
        });
    }
}
