//! Report export to spreadsheet workbooks and CSV
//!
//! Reports are assembled as a [`Workbook`]: an ordered list of named
//! [`Table`]s. Writing produces one `.xlsx` file with one worksheet per table,
//! a header row, and no index column.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::Workbook as XlsxWorkbook;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{BudgetVariance, ReportSummary, TagSummary, Transaction};
use crate::time::TIMESTAMP_FORMAT;

/// Excel's limit on worksheet name length
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Sheet name used for the empty-tag group
pub const UNTAGGED_SHEET_NAME: &str = "untagged";

const INVALID_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// A single spreadsheet cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Integer(i64),
    Empty,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// `None` and non-finite values become empty cells
    pub fn number(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => Self::Number(v),
            _ => Self::Empty,
        }
    }

    /// Numeric value, if the cell holds one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Render for text outputs such as CSV
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(v) => v.to_string(),
            Self::Integer(v) => v.to_string(),
            Self::Empty => String::new(),
        }
    }
}

/// A row type that can be laid out as a sheet
pub trait TableRow {
    /// Column names, in sheet order
    fn columns() -> Vec<&'static str>;

    /// Cells for this row, one per column
    fn cells(&self) -> Vec<Cell>;
}

/// A rectangular table with named columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn from_rows<T: TableRow>(rows: &[T]) -> Self {
        Self {
            columns: T::columns().into_iter().map(str::to_string).collect(),
            rows: rows.iter().map(TableRow::cells).collect(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All cells of one column, top to bottom
    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row.get(idx).unwrap_or(&Cell::Empty)).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Named tables in sheet order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<(String, Table)>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sheet. The name is made valid for the xlsx format.
    pub fn add_sheet(&mut self, name: &str, table: Table) {
        let taken: HashSet<String> = self.sheets.iter().map(|(n, _)| n.to_lowercase()).collect();
        let name = unique_sheet_name(&sanitize_sheet_name(name), &taken);
        self.sheets.push((name, table));
    }

    pub fn sheets(&self) -> &[(String, Table)] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&Table> {
        self.sheets.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

/// Make a worksheet name acceptable to Excel
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if INVALID_SHEET_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let cleaned = trim_sheet_name(&cleaned, MAX_SHEET_NAME_LEN);
    if cleaned.trim().is_empty() {
        return UNTAGGED_SHEET_NAME.to_string();
    }
    cleaned
}

/// Cut to `max` characters, then drop apostrophes Excel refuses at either end
fn trim_sheet_name(name: &str, max: usize) -> String {
    let cut: String = name.chars().take(max).collect();
    cut.trim_matches('\'').to_string()
}

/// Excel compares sheet names case-insensitively
fn unique_sheet_name(name: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(&name.to_lowercase()) {
        return name.to_string();
    }
    (2..)
        .map(|n| {
            let suffix = format!(" ({})", n);
            let keep = MAX_SHEET_NAME_LEN - suffix.chars().count();
            format!("{}{}", trim_sheet_name(name, keep), suffix)
        })
        .find(|candidate| !taken.contains(&candidate.to_lowercase()))
        .unwrap_or_else(|| name.to_string())
}

/// Write every sheet to `dir/filename` as an `.xlsx` workbook
pub fn write_workbook(workbook: &Workbook, dir: &Path, filename: &str) -> Result<PathBuf> {
    let path = dir.join(filename);
    let mut xlsx = XlsxWorkbook::new();

    for (name, table) in workbook.sheets() {
        info!(sheet = %name, rows = table.rows.len(), "Saving worksheet");
        let worksheet = xlsx.add_worksheet();
        worksheet.set_name(name)?;

        for (col, column) in table.columns.iter().enumerate() {
            worksheet.write_string(0, col as u16, column)?;
        }
        for (r, row) in table.rows.iter().enumerate() {
            let r = r as u32 + 1;
            for (col, cell) in row.iter().enumerate() {
                let col = col as u16;
                match cell {
                    Cell::Text(s) => {
                        worksheet.write_string(r, col, s)?;
                    }
                    Cell::Number(v) if v.is_finite() => {
                        worksheet.write_number(r, col, *v)?;
                    }
                    Cell::Integer(v) => {
                        worksheet.write_number(r, col, *v as f64)?;
                    }
                    Cell::Number(_) | Cell::Empty => {}
                }
            }
        }
    }

    xlsx.save(&path)?;
    info!(path = %path.display(), "Excel results are available");
    Ok(path)
}

/// Write a single table to `dir/filename` as CSV
pub fn write_csv(table: &Table, dir: &Path, filename: &str) -> Result<PathBuf> {
    let path = dir.join(filename);
    let mut writer = csv::Writer::from_path(&path)?;

    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(Cell::to_text))?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = table.rows.len(), "CSV file saved");
    Ok(path)
}

/// Read a workbook back into named tables.
///
/// The reader counterpart to [`write_workbook`].
/// The first row of each sheet is taken as the header.
pub fn read_workbook(path: &Path) -> Result<Workbook> {
    let mut sheets = open_workbook_auto(path)
        .map_err(|e| Error::InvalidData(format!("Cannot open {}: {}", path.display(), e)))?;

    let mut workbook = Workbook::new();
    for name in sheets.sheet_names() {
        let range = sheets
            .worksheet_range(&name)
            .map_err(|e| Error::InvalidData(format!("Cannot read sheet {}: {}", name, e)))?;

        let mut rows = range.rows();
        let columns = rows
            .next()
            .map(|header| header.iter().map(|c| c.to_string()).collect())
            .unwrap_or_default();
        let rows = rows
            .map(|row| row.iter().map(cell_from_data).collect())
            .collect();

        debug!(sheet = %name, "Read worksheet");
        workbook.sheets.push((name, Table { columns, rows }));
    }
    Ok(workbook)
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Integer(*i),
        other => Cell::Text(other.to_string()),
    }
}

// =============================================================================
// Row layouts
// =============================================================================

fn date_cell(value: Option<&chrono::DateTime<chrono::FixedOffset>>) -> Cell {
    match value {
        Some(dt) => Cell::Text(dt.format(TIMESTAMP_FORMAT).to_string()),
        None => Cell::Text(String::new()),
    }
}

impl TableRow for Transaction {
    fn columns() -> Vec<&'static str> {
        vec![
            "created_at",
            "description",
            "amount",
            "category",
            "parent_category",
            "tags",
            "message",
            "transaction_id",
            "amount_in_base_units",
            "card_purchase_method",
            "card_purchase_method_card_suffix",
            "cashback",
            "foreign_amount",
            "raw_text",
            "round_up",
            "status",
            "settled_at",
            "long_description",
        ]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            date_cell(Some(&self.created_at)),
            Cell::text(&self.description),
            Cell::number(Some(self.amount)),
            Cell::text(&self.category),
            Cell::text(&self.parent_category),
            Cell::text(&self.tags),
            Cell::text(&self.message),
            Cell::text(&self.transaction_id),
            Cell::Integer(self.amount_in_base_units),
            Cell::text(&self.card_purchase_method),
            Cell::text(&self.card_purchase_method_card_suffix),
            Cell::text(&self.cashback),
            Cell::text(&self.foreign_amount),
            Cell::text(&self.raw_text),
            Cell::text(&self.round_up),
            Cell::text(&self.status),
            date_cell(self.settled_at.as_ref()),
            Cell::text(&self.long_description),
        ]
    }
}

impl TableRow for TagSummary {
    fn columns() -> Vec<&'static str> {
        vec!["tag", "total_spend", "weekly_spend", "monthly_spend"]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::text(&self.tag),
            Cell::number(Some(self.total_spend)),
            Cell::number(Some(self.weekly_spend)),
            Cell::number(Some(self.monthly_spend)),
        ]
    }
}

impl TableRow for BudgetVariance {
    fn columns() -> Vec<&'static str> {
        vec![
            "tag",
            "total_spend",
            "weekly_spend",
            "weekly_budget",
            "weekly_budget_variance",
            "exceeds_variance",
            "under_variance",
        ]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::text(&self.tag),
            Cell::number(Some(self.total_spend)),
            Cell::number(Some(self.weekly_spend)),
            Cell::number(self.weekly_budget),
            Cell::number(self.weekly_budget_variance),
            Cell::text(self.exceeds_variance.as_str()),
            Cell::text(self.under_variance.as_str()),
        ]
    }
}

impl TableRow for ReportSummary {
    fn columns() -> Vec<&'static str> {
        vec![
            "from_timestamp",
            "to_timestamp",
            "generated_at",
            "total_days",
            "total_weeks",
            "total_months",
        ]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::text(&self.from_timestamp),
            Cell::text(&self.to_timestamp),
            Cell::text(&self.generated_at),
            Cell::number(Some(self.total_days)),
            Cell::number(Some(self.total_weeks)),
            Cell::number(Some(self.total_months)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VarianceFlag;
    use tempfile::TempDir;

    fn summary_rows() -> Vec<TagSummary> {
        vec![
            TagSummary {
                tag: "Groceries".to_string(),
                total_spend: 100.0,
                weekly_spend: 50.0,
                monthly_spend: 217.25,
            },
            TagSummary {
                tag: "".to_string(),
                total_spend: 12.5,
                weekly_spend: 6.25,
                monthly_spend: 27.15625,
            },
        ]
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("Groceries"), "Groceries");
        assert_eq!(sanitize_sheet_name(""), "untagged");
        assert_eq!(sanitize_sheet_name("fuel/car:[x]"), "fuel_car__x_");
        assert_eq!(sanitize_sheet_name("'quoted'"), "quoted");
        let long = "a".repeat(40);
        assert_eq!(sanitize_sheet_name(&long).chars().count(), MAX_SHEET_NAME_LEN);
    }

    #[test]
    fn test_add_sheet_dedupes_names() {
        let mut workbook = Workbook::new();
        workbook.add_sheet("fuel/car", Table::default());
        workbook.add_sheet("fuel:car", Table::default());
        workbook.add_sheet("FUEL_CAR", Table::default());
        assert_eq!(
            workbook.sheet_names(),
            vec!["fuel_car", "fuel_car (2)", "FUEL_CAR (3)"]
        );

        let long = "b".repeat(40);
        workbook.add_sheet(&long, Table::default());
        workbook.add_sheet(&long, Table::default());
        let last = workbook.sheet_names()[4];
        assert_eq!(last.chars().count(), MAX_SHEET_NAME_LEN);
        assert!(last.ends_with(" (2)"));
    }

    #[test]
    fn test_apostrophe_at_cut_point_is_trimmed() {
        let tag = format!("{}'b", "a".repeat(30));
        let name = sanitize_sheet_name(&tag);
        assert_eq!(name, "a".repeat(30));

        let mut workbook = Workbook::new();
        workbook.add_sheet(&tag, Table::from_rows(&summary_rows()));
        workbook.add_sheet(&format!("{}'c", "a".repeat(30)), Table::default());
        let quoted = format!("{}'{}", "q".repeat(26), "z".repeat(10));
        workbook.add_sheet(&quoted, Table::default());
        workbook.add_sheet(&quoted, Table::default());
        assert_eq!(workbook.sheet_names()[3], format!("{} (2)", "q".repeat(26)));
        for name in workbook.sheet_names() {
            assert!(!name.starts_with('\'') && !name.ends_with('\''));
        }

        let dir = TempDir::new().unwrap();
        let path = write_workbook(&workbook, dir.path(), "quotes.xlsx").unwrap();
        let read = read_workbook(&path).unwrap();
        assert_eq!(read.sheet_names(), workbook.sheet_names());
    }

    #[test]
    fn test_table_from_rows() {
        let table = Table::from_rows(&summary_rows());
        assert_eq!(
            table.columns,
            vec!["tag", "total_spend", "weekly_spend", "monthly_spend"]
        );
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][1], Cell::Number(100.0));
    }

    #[test]
    fn test_empty_table_keeps_header() {
        let table = Table::from_rows::<TagSummary>(&[]);
        assert!(table.is_empty());
        assert_eq!(table.columns.len(), 4);
    }

    #[test]
    fn test_absent_and_non_finite_numbers_are_empty() {
        let row = BudgetVariance {
            tag: "Gifts".to_string(),
            total_spend: 10.0,
            weekly_spend: f64::INFINITY,
            weekly_budget: None,
            weekly_budget_variance: None,
            exceeds_variance: VarianceFlag::NotApplicable,
            under_variance: VarianceFlag::NotApplicable,
        };
        let cells = row.cells();
        assert_eq!(cells[2], Cell::Empty);
        assert_eq!(cells[3], Cell::Empty);
        assert_eq!(cells[5], Cell::text("N/A"));
    }

    #[test]
    fn test_workbook_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut workbook = Workbook::new();
        workbook.add_sheet("tag_summary", Table::from_rows(&summary_rows()));
        workbook.add_sheet("empty", Table::from_rows::<TagSummary>(&[]));

        let path = write_workbook(&workbook, dir.path(), "report.xlsx").unwrap();
        assert!(path.exists());

        let read = read_workbook(&path).unwrap();
        assert_eq!(read.sheet_names(), vec!["tag_summary", "empty"]);

        let original = workbook.sheet("tag_summary").unwrap();
        let table = read.sheet("tag_summary").unwrap();
        assert_eq!(table.columns, original.columns);
        for column in &original.columns {
            let expected = original.column(column).unwrap();
            let actual = table.column(column).unwrap();
            assert_eq!(expected.len(), actual.len());
            for (e, a) in expected.iter().zip(actual.iter()) {
                match e.as_f64() {
                    Some(v) => assert_eq!(a.as_f64(), Some(v), "column {}", column),
                    None => assert_eq!(e.to_text(), a.to_text(), "column {}", column),
                }
            }
        }

        let empty = read.sheet("empty").unwrap();
        assert_eq!(empty.columns.len(), 4);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_write_workbook_to_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let mut workbook = Workbook::new();
        workbook.add_sheet("tag_summary", Table::from_rows(&summary_rows()));
        assert!(write_workbook(&workbook, &dir.path().join("nope"), "report.xlsx").is_err());
    }

    #[test]
    fn test_write_csv() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&Table::from_rows(&summary_rows()), dir.path(), "summary.csv").unwrap();
        let contents = std::fs::read_to_string(path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("tag,total_spend,weekly_spend,monthly_spend"));
        assert_eq!(lines.next(), Some("Groceries,100,50,217.25"));
        assert_eq!(lines.next(), Some(",12.5,6.25,27.15625"));
    }
}
