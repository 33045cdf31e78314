//! Report workflows
//!
//! Each workflow authenticates, resolves the account by display name, fetches
//! the inclusive `[start, end]` window, and assembles a [`Workbook`] whose
//! first sheet is always `report_summary`. Writing the workbook is left to
//! the caller.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use chrono_tz::Tz;
use tracing::{error, info};

use crate::analysis::{
    calculate_weekly_budget_variance, group_by_tag, merge_with_budget, summarize_by_tag,
    summarize_tags,
};
use crate::budget::Budget;
use crate::error::{Error, Result};
use crate::export::{Table, Workbook};
use crate::filters::{filter_by_tag, filter_untagged, filter_withdrawals};
use crate::models::{Account, BudgetVariance, ReportSummary, TagSummary, Transaction};
use crate::normalize::normalize_all;
use crate::source::{TransactionQuery, TransactionSource};
use crate::time::{elapsed, format_timestamp, to_source_bound, Period};

pub const REPORT_SUMMARY_SHEET: &str = "report_summary";
pub const TAG_SUMMARY_SHEET: &str = "tag_summary";
pub const BUDGET_VS_SPEND_SHEET: &str = "budget_vs_spend";
pub const UNTAGGED_WITHDRAWALS_SHEET: &str = "untagged_withdrawals";

/// What to report on
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    /// Display name of the account, matched exactly
    pub account_name: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// When the report was generated, recorded in the summary sheet
    pub generated_at: NaiveDateTime,
    /// Timezone the window bounds are expressed in
    pub timezone: Tz,
    /// Maximum transactions to fetch, 0 for no limit
    pub transaction_limit: usize,
}

impl ReportRequest {
    pub fn new(
        account_name: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        generated_at: NaiveDateTime,
        timezone: Tz,
    ) -> Self {
        Self {
            account_name: account_name.to_string(),
            start,
            end,
            generated_at,
            timezone,
            transaction_limit: 0,
        }
    }

    pub fn with_limit(mut self, transaction_limit: usize) -> Self {
        self.transaction_limit = transaction_limit;
        self
    }
}

/// Percentages of budget at which spend is flagged
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarianceLimits {
    pub lower: f64,
    pub upper: f64,
}

impl Default for VarianceLimits {
    fn default() -> Self {
        Self {
            lower: 97.5,
            upper: 120.0,
        }
    }
}

/// Result of a tag analysis
#[derive(Debug, Clone)]
pub struct TagReport {
    pub workbook: Workbook,
    pub summary: ReportSummary,
    pub tags: Vec<TagSummary>,
}

/// Result of a budget-versus-spend analysis
#[derive(Debug, Clone)]
pub struct BudgetReport {
    pub workbook: Workbook,
    pub summary: ReportSummary,
    pub variance: Vec<BudgetVariance>,
}

/// Result of the untagged withdrawals report
#[derive(Debug, Clone)]
pub struct UntaggedReport {
    pub workbook: Workbook,
    pub summary: ReportSummary,
    pub withdrawals: Vec<Transaction>,
}

/// Check the source accepts our credentials
pub async fn authenticate(source: &dyn TransactionSource) -> Result<String> {
    match source.ping().await {
        Ok(user_id) => Ok(user_id),
        Err(e @ Error::Authentication(_)) => {
            error!("{}", e);
            Err(e)
        }
        Err(e) => Err(e),
    }
}

/// Find an account by its exact display name
pub async fn resolve_account(source: &dyn TransactionSource, account_name: &str) -> Result<Account> {
    let accounts = source.accounts().await?;
    let Some(found) = accounts.iter().find(|a| a.display_name == account_name) else {
        let known: Vec<String> = accounts.iter().map(|a| a.display_name.clone()).collect();
        error!(
            account = account_name,
            known = ?known,
            "Unable to find account. Please check that your account name is correct and try again"
        );
        return Err(Error::AccountNotFound {
            name: account_name.to_string(),
            known,
        });
    };
    source.account(&found.id).await
}

/// Provenance row for a request
pub fn report_summary(request: &ReportRequest, period: &Period) -> ReportSummary {
    ReportSummary {
        from_timestamp: format_timestamp(&request.start),
        to_timestamp: format_timestamp(&request.end),
        generated_at: format_timestamp(&request.generated_at),
        total_days: period.days,
        total_weeks: period.weeks,
        total_months: period.months,
    }
}

/// Fetch and normalize the transactions in the request window
pub async fn fetch_window(
    source: &dyn TransactionSource,
    account: &Account,
    request: &ReportRequest,
) -> Result<Vec<Transaction>> {
    let query = TransactionQuery {
        since: Some(to_source_bound(request.start, request.timezone)?),
        until: Some(to_source_bound(request.end, request.timezone)?),
        limit: request.transaction_limit,
    };
    info!(
        account = %account.display_name,
        since = %format_timestamp(&request.start),
        until = %format_timestamp(&request.end),
        limit = request.transaction_limit,
        "Retrieving transactions"
    );
    let transactions = source.transactions(&account.id, &query).await?;
    Ok(normalize_all(&transactions))
}

/// Shared front half of every workflow
async fn prepare(
    source: &dyn TransactionSource,
    request: &ReportRequest,
) -> Result<(Vec<Transaction>, Period, ReportSummary)> {
    authenticate(source).await?;
    let account = resolve_account(source, &request.account_name).await?;
    let period = elapsed(request.start, request.end);
    let rows = fetch_window(source, &account, request).await?;
    let summary = report_summary(request, &period);
    Ok((rows, period, summary))
}

/// Per-tag breakdown over every distinct tags value, one sheet per tag
pub async fn all_tag_analysis(
    source: &dyn TransactionSource,
    request: &ReportRequest,
) -> Result<TagReport> {
    let (rows, period, summary) = prepare(source, request).await?;

    let tags = summarize_by_tag(&rows, &period);

    let mut workbook = Workbook::new();
    workbook.add_sheet(REPORT_SUMMARY_SHEET, Table::from_rows(std::slice::from_ref(&summary)));
    workbook.add_sheet(TAG_SUMMARY_SHEET, Table::from_rows(&tags));
    for (tag, group) in &group_by_tag(&rows) {
        workbook.add_sheet(tag, Table::from_rows(group));
    }

    info!(tags = tags.len(), sheets = workbook.len(), "All-tag analysis complete");
    Ok(TagReport {
        workbook,
        summary,
        tags,
    })
}

/// Breakdown for the given tags only, matched exactly, one sheet per tag.
///
/// Repeated tags are analysed once, in first-given order.
pub async fn tag_analysis(
    source: &dyn TransactionSource,
    request: &ReportRequest,
    tags: &[String],
) -> Result<TagReport> {
    let mut seen = HashSet::new();
    let tags: Vec<String> = tags
        .iter()
        .filter(|tag| seen.insert(tag.as_str()))
        .cloned()
        .collect();

    let (rows, period, summary) = prepare(source, request).await?;
    let tag_summary = summarize_tags(&rows, &tags, &period);

    let mut workbook = Workbook::new();
    workbook.add_sheet(REPORT_SUMMARY_SHEET, Table::from_rows(std::slice::from_ref(&summary)));
    workbook.add_sheet(TAG_SUMMARY_SHEET, Table::from_rows(&tag_summary));
    for tag in &tags {
        workbook.add_sheet(tag, Table::from_rows(&filter_by_tag(&rows, tag, true)));
    }

    info!(tags = tag_summary.len(), sheets = workbook.len(), "Tag analysis complete");
    Ok(TagReport {
        workbook,
        summary,
        tags: tag_summary,
    })
}

/// Weekly spend per tag against a budget
pub async fn budget_vs_spend(
    source: &dyn TransactionSource,
    request: &ReportRequest,
    budget: &Budget,
    limits: VarianceLimits,
) -> Result<BudgetReport> {
    let (rows, period, summary) = prepare(source, request).await?;

    let tags = summarize_by_tag(&rows, &period);
    let merged = merge_with_budget(&tags, budget)?;
    let variance = calculate_weekly_budget_variance(&merged, limits.lower, limits.upper);

    let mut workbook = Workbook::new();
    workbook.add_sheet(REPORT_SUMMARY_SHEET, Table::from_rows(std::slice::from_ref(&summary)));
    workbook.add_sheet(BUDGET_VS_SPEND_SHEET, Table::from_rows(&variance));

    Ok(BudgetReport {
        workbook,
        summary,
        variance,
    })
}

/// Withdrawals in the window that carry no tag
pub async fn untagged_withdrawals(
    source: &dyn TransactionSource,
    request: &ReportRequest,
) -> Result<UntaggedReport> {
    let (rows, _, summary) = prepare(source, request).await?;
    let withdrawals = filter_untagged(&filter_withdrawals(&rows));

    let mut workbook = Workbook::new();
    workbook.add_sheet(REPORT_SUMMARY_SHEET, Table::from_rows(std::slice::from_ref(&summary)));
    workbook.add_sheet(UNTAGGED_WITHDRAWALS_SHEET, Table::from_rows(&withdrawals));

    info!(count = withdrawals.len(), "Untagged withdrawals retrieved");
    Ok(UntaggedReport {
        workbook,
        summary,
        withdrawals,
    })
}
