//! Tag spend aggregation and budget variance
//!
//! Transactions are grouped by their verbatim tags string, so a row tagged
//! "fuel,car" counts toward the "fuel,car" group only. Untagged rows form the
//! empty-string group.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::{debug, info};

use crate::budget::{Budget, TAG_COLUMN, WEEKLY_BUDGET_COLUMN};
use crate::error::{Error, Result};
use crate::filters::filter_by_tag;
use crate::models::{BudgetSpend, BudgetVariance, TagSummary, Transaction, VarianceFlag};
use crate::time::Period;

/// Split rows into tag groups, in the order each tags value first appears
pub fn group_by_tag(rows: &[Transaction]) -> Vec<(String, Vec<Transaction>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<Transaction>)> = Vec::new();

    for row in rows {
        match index.get(row.tags.as_str()) {
            Some(&i) => groups[i].1.push(row.clone()),
            None => {
                index.insert(row.tags.as_str(), groups.len());
                groups.push((row.tags.clone(), vec![row.clone()]));
            }
        }
    }
    groups
}

/// Spend summary for one group of rows
pub fn summarize_group(tag: &str, rows: &[Transaction], period: &Period) -> TagSummary {
    let total_spend: f64 = rows.iter().map(|r| r.amount.abs()).sum();
    let summary = TagSummary {
        tag: tag.to_string(),
        total_spend,
        weekly_spend: total_spend / period.weeks,
        monthly_spend: total_spend / period.months,
    };
    info!(
        tag = %summary.tag,
        total_spend = summary.total_spend,
        weekly_spend = summary.weekly_spend,
        monthly_spend = summary.monthly_spend,
        "Tag analysis"
    );
    summary
}

fn sort_by_total_spend(summaries: &mut [TagSummary]) {
    // sort_by is stable, so equal totals keep first-seen order
    summaries.sort_by(|a, b| b.total_spend.total_cmp(&a.total_spend));
}

/// Summarize spend for every distinct tags value, largest total first
pub fn summarize_by_tag(rows: &[Transaction], period: &Period) -> Vec<TagSummary> {
    let mut summaries: Vec<TagSummary> = group_by_tag(rows)
        .iter()
        .map(|(tag, group)| summarize_group(tag, group, period))
        .collect();
    sort_by_total_spend(&mut summaries);
    summaries
}

/// Summarize spend for the given tags only, matching each exactly.
///
/// A tag with no transactions still gets a row with zero spend.
pub fn summarize_tags(rows: &[Transaction], tags: &[String], period: &Period) -> Vec<TagSummary> {
    let mut summaries: Vec<TagSummary> = tags
        .iter()
        .map(|tag| summarize_group(tag, &filter_by_tag(rows, tag, true), period))
        .collect();
    sort_by_total_spend(&mut summaries);
    summaries
}

/// Left-join tag summaries with a budget on tag.
///
/// Every matching budget row yields an output row. Tags without a budget row
/// keep `weekly_budget: None`.
pub fn merge_with_budget(summary: &[TagSummary], budget: &Budget) -> Result<Vec<BudgetSpend>> {
    for column in [TAG_COLUMN, WEEKLY_BUDGET_COLUMN] {
        if !budget.has_column(column) {
            return Err(Error::MissingColumn(format!(
                "budget has no '{}' column (found: {})",
                column,
                budget.columns.join(", ")
            )));
        }
    }

    let mut merged: Vec<BudgetSpend> = Vec::with_capacity(summary.len());
    for row in summary {
        let spend = |weekly_budget: Option<f64>| BudgetSpend {
            tag: row.tag.clone(),
            total_spend: row.total_spend,
            weekly_spend: row.weekly_spend,
            monthly_spend: row.monthly_spend,
            weekly_budget,
        };

        let before = merged.len();
        merged.extend(
            budget
                .rows
                .iter()
                .filter(|b| b.tag == row.tag)
                .map(|b| spend(b.weekly_budget)),
        );
        if merged.len() == before {
            debug!(tag = %row.tag, "No budget for tag");
            merged.push(spend(None));
        }
    }
    Ok(merged)
}

/// Classify a spend-to-budget percentage as (exceeds, under).
///
/// No percentage (an unbudgeted tag) or NaN gives N/A for both. The limits are
/// inclusive and are not checked against each other.
pub fn classify_variance(percent: Option<f64>, lower: f64, upper: f64) -> (VarianceFlag, VarianceFlag) {
    match percent {
        Some(p) if !p.is_nan() => {
            let exceeds = if p >= upper { VarianceFlag::Yes } else { VarianceFlag::No };
            let under = if p <= lower { VarianceFlag::Yes } else { VarianceFlag::No };
            (exceeds, under)
        }
        _ => (VarianceFlag::NotApplicable, VarianceFlag::NotApplicable),
    }
}

fn budget_order(a: Option<f64>, b: Option<f64>) -> Ordering {
    let a = a.filter(|v| !v.is_nan());
    let b = b.filter(|v| !v.is_nan());
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Compute weekly variance for merged rows, largest budget first
pub fn calculate_weekly_budget_variance(
    merged: &[BudgetSpend],
    lower: f64,
    upper: f64,
) -> Vec<BudgetVariance> {
    let mut rows: Vec<BudgetVariance> = merged
        .iter()
        .map(|row| {
            let variance = row.weekly_budget.map(|b| row.weekly_spend / b * 100.0);
            let (exceeds_variance, under_variance) = classify_variance(variance, lower, upper);
            BudgetVariance {
                tag: row.tag.clone(),
                total_spend: row.total_spend,
                weekly_spend: row.weekly_spend,
                weekly_budget: row.weekly_budget,
                weekly_budget_variance: variance,
                exceeds_variance,
                under_variance,
            }
        })
        .collect();

    rows.sort_by(|a, b| budget_order(a.weekly_budget, b.weekly_budget));

    let over = rows.iter().filter(|r| r.exceeds_variance == VarianceFlag::Yes).count();
    let under = rows.iter().filter(|r| r.under_variance == VarianceFlag::Yes).count();
    info!(tags = rows.len(), over, under, lower, upper, "Calculated budget variance");
    rows
}
