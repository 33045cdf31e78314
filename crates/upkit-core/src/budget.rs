//! Weekly budget loading
//!
//! A budget file maps tags to a weekly amount. CSV files need a header row;
//! JSON files hold an array of objects. Nothing is validated beyond parsing:
//! the loaded [`Budget`] remembers which columns it saw so that a missing
//! `tag` or `weekly_budget` column is reported when the budget is used.

use std::fs::File;
use std::path::Path;

use csv::ReaderBuilder;
use serde_json::{Map, Value};
use tracing::{error, info};

use crate::error::{Error, Result};
use crate::models::BudgetRow;

pub const TAG_COLUMN: &str = "tag";
pub const WEEKLY_BUDGET_COLUMN: &str = "weekly_budget";

/// A loaded budget table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Budget {
    /// Column names found in the file
    pub columns: Vec<String>,
    pub rows: Vec<BudgetRow>,
}

impl Budget {
    pub fn new(rows: Vec<BudgetRow>) -> Self {
        Self {
            columns: vec![TAG_COLUMN.to_string(), WEEKLY_BUDGET_COLUMN.to_string()],
            rows,
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}

/// Load a budget, choosing the format from the file extension.
///
/// `.json` files are read as JSON; anything else as CSV.
pub fn load_budget(path: &Path) -> Result<Budget> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        load_json_budget(path)
    } else {
        load_csv_budget(path)
    }
}

fn open(path: &Path) -> Result<File> {
    if !path.exists() {
        let message = format!(
            "File path doesn't exist: {}. Please check your inputs and try again",
            path.display()
        );
        error!("{}", message);
        return Err(Error::NotFound(message));
    }
    Ok(File::open(path)?)
}

fn parse_weekly_budget(raw: &str, tag: &str) -> Result<Option<f64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>().map(Some).map_err(|_| {
        Error::InvalidData(format!(
            "weekly_budget for tag '{}' is not a number: {}",
            tag, raw
        ))
    })
}

pub fn load_csv_budget(path: &Path) -> Result<Budget> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(open(path)?);

    let columns: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let tag_idx = columns.iter().position(|c| c == TAG_COLUMN);
    let budget_idx = columns.iter().position(|c| c == WEEKLY_BUDGET_COLUMN);

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let tag = tag_idx
            .and_then(|i| record.get(i))
            .unwrap_or_default()
            .to_string();
        let weekly_budget = match budget_idx.and_then(|i| record.get(i)) {
            Some(raw) => parse_weekly_budget(raw, &tag)?,
            None => None,
        };
        rows.push(BudgetRow { tag, weekly_budget });
    }

    info!(path = %path.display(), rows = rows.len(), columns = ?columns, "Loaded CSV budget");
    Ok(Budget { columns, rows })
}

pub fn load_json_budget(path: &Path) -> Result<Budget> {
    let entries: Vec<Map<String, Value>> = serde_json::from_reader(open(path)?)?;

    let mut columns: Vec<String> = Vec::new();
    for key in entries.iter().flat_map(|entry| entry.keys()) {
        if !columns.contains(key) {
            columns.push(key.clone());
        }
    }

    let mut rows = Vec::with_capacity(entries.len());
    for entry in &entries {
        let tag = match entry.get(TAG_COLUMN) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        let weekly_budget = match entry.get(WEEKLY_BUDGET_COLUMN) {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => parse_weekly_budget(s, &tag)?,
            Some(Value::Null) | None => None,
            Some(other) => {
                return Err(Error::InvalidData(format!(
                    "weekly_budget for tag '{}' is not a number: {}",
                    tag, other
                )))
            }
        };
        rows.push(BudgetRow { tag, weekly_budget });
    }

    info!(path = %path.display(), rows = rows.len(), columns = ?columns, "Loaded JSON budget");
    Ok(Budget { columns, rows })
}
