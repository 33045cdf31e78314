//! Upkit Core Library
//!
//! Spend reporting over Up Bank transactions:
//! - Transaction source abstraction with an HTTP client and a mock
//! - Normalization of source transactions into flat rows
//! - Tag, withdrawal and untagged filters
//! - Budget loading from CSV or JSON
//! - Tag aggregation and weekly budget variance
//! - Workbook export (xlsx) and CSV export
//! - Report workflows that tie the above together

pub mod analysis;
pub mod budget;
pub mod config;
pub mod error;
pub mod export;
pub mod filters;
pub mod models;
pub mod normalize;
pub mod report;
pub mod source;
pub mod time;

pub use analysis::{
    calculate_weekly_budget_variance, classify_variance, merge_with_budget, summarize_by_tag,
    summarize_tags,
};
pub use budget::{load_budget, load_csv_budget, load_json_budget, Budget};
pub use config::{ApiSettings, LoggingSettings, ReportSettings, Settings};
pub use error::{Error, Result};
pub use export::{read_workbook, write_csv, write_workbook, Cell, Table, TableRow, Workbook};
pub use filters::{filter_by_tag, filter_untagged, filter_withdrawals};
pub use models::{
    Account, BudgetRow, BudgetSpend, BudgetVariance, ReportSummary, TagSummary, Transaction,
    VarianceFlag,
};
pub use normalize::{normalize, normalize_all};
pub use report::{
    all_tag_analysis, budget_vs_spend, tag_analysis, untagged_withdrawals, BudgetReport,
    ReportRequest, TagReport, UntaggedReport, VarianceLimits,
};
pub use source::{MockSource, SourceTransaction, TransactionQuery, TransactionSource, UpClient};
pub use time::{Period, TimeUnit};
