use chrono::NaiveDate;
use housing_subsidy::error::AppError;
use housing_subsidy::wizard::{ApplicationRecord, RecordChange};
use std::fs;
use std::path::Path;

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn load_record(path: &Path) -> Result<ApplicationRecord, AppError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Edits are stored as a JSON array, applied in file order.
pub(crate) fn load_changes(path: &Path) -> Result<Vec<RecordChange>, AppError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
