use std::path::PathBuf;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:scholarship.db";
pub const DEFAULT_WORKBOOK: &str = "scholarship.xlsx";

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub workbook: PathBuf,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            database_url: non_empty("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            workbook: non_empty("SCHOLARSHIP_WORKBOOK")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKBOOK)),
        }
    }
}
