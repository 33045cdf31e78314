//! Report generation commands

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;
use upkit_core::report::{all_tag_analysis, budget_vs_spend, tag_analysis, untagged_withdrawals};
use upkit_core::time::TIMESTAMP_FORMAT;
use upkit_core::{load_budget, ReportSummary, TagSummary, TransactionSource, VarianceLimits};

use super::{resolve_input, save_workbook, truncate, RunContext};
use crate::cli::{OutputArgs, WindowArgs};

fn print_header(title: &str, account: &str, summary: &ReportSummary) {
    println!();
    println!("{}", title);
    println!("   Account: {}", account);
    println!(
        "   Period: {} to {} ({:.1} days)",
        summary.from_timestamp, summary.to_timestamp, summary.total_days
    );
    println!("   ─────────────────────────────────────────────────────────────");
}

fn print_tag_table(tags: &[TagSummary]) {
    if tags.is_empty() {
        println!("   No transactions found in this period.");
        return;
    }

    println!(
        "   {:25} │ {:>10} │ {:>10} │ {:>10}",
        "Tag", "Total", "Weekly", "Monthly"
    );
    println!("   ──────────────────────────┼────────────┼────────────┼────────────");
    for tag in tags {
        let name = if tag.tag.is_empty() {
            "(untagged)".to_string()
        } else {
            truncate(&tag.tag, 25)
        };
        println!(
            "   {:25} │ {:>10.2} │ {:>10.2} │ {:>10.2}",
            name, tag.total_spend, tag.weekly_spend, tag.monthly_spend
        );
    }
}

fn print_saved(path: &Path) {
    println!();
    println!("✅ Report saved to {}", path.display());
}

pub async fn cmd_report_tags(
    source: &dyn TransactionSource,
    ctx: &RunContext,
    account: &str,
    window: &WindowArgs,
    output: &OutputArgs,
) -> Result<PathBuf> {
    let request = ctx.request(account, window)?;
    let report = all_tag_analysis(source, &request).await?;

    print_header("🏷️  Tag Analysis", account, &report.summary);
    print_tag_table(&report.tags);

    let (dir, filename) = ctx.output_target(output, "all_tag_based_analysis");
    let path = save_workbook(&report.workbook, &dir, &filename)?;
    print_saved(&path);
    Ok(path)
}

pub async fn cmd_report_tag(
    source: &dyn TransactionSource,
    ctx: &RunContext,
    account: &str,
    tags: &[String],
    window: &WindowArgs,
    output: &OutputArgs,
) -> Result<PathBuf> {
    let request = ctx.request(account, window)?;
    let report = tag_analysis(source, &request, tags).await?;

    print_header("🏷️  Selected Tag Analysis", account, &report.summary);
    print_tag_table(&report.tags);

    let (dir, filename) = ctx.output_target(output, "tag_based_analysis");
    let path = save_workbook(&report.workbook, &dir, &filename)?;
    print_saved(&path);
    Ok(path)
}

#[allow(clippy::too_many_arguments)]
pub async fn cmd_report_budget(
    source: &dyn TransactionSource,
    ctx: &RunContext,
    account: &str,
    budget_path: &Path,
    lower: Option<f64>,
    upper: Option<f64>,
    window: &WindowArgs,
    output: &OutputArgs,
) -> Result<PathBuf> {
    let budget_path = resolve_input(budget_path, &ctx.settings.report.input_dir);
    let budget = load_budget(&budget_path)
        .with_context(|| format!("Failed to load budget from {}", budget_path.display()))?;

    let limits = VarianceLimits {
        lower: lower.unwrap_or(ctx.settings.report.lower_variance_limit),
        upper: upper.unwrap_or(ctx.settings.report.upper_variance_limit),
    };
    if limits.lower > limits.upper {
        warn!(
            lower = limits.lower,
            upper = limits.upper,
            "Lower variance limit is above the upper limit"
        );
    }

    let request = ctx.request(account, window)?;
    let report = budget_vs_spend(source, &request, &budget, limits).await?;

    print_header("💰 Budget vs Spend", account, &report.summary);
    println!(
        "   Variance limits: under ≤ {:.1}%, over ≥ {:.1}%",
        limits.lower, limits.upper
    );
    println!();

    if report.variance.is_empty() {
        println!("   No transactions found in this period.");
    } else {
        println!(
            "   {:25} │ {:>10} │ {:>10} │ {:>8} │ {:>4} │ {:>5}",
            "Tag", "Weekly", "Budget", "%", "Over", "Under"
        );
        println!("   ──────────────────────────┼────────────┼────────────┼──────────┼──────┼───────");
        for row in &report.variance {
            let name = if row.tag.is_empty() {
                "(untagged)".to_string()
            } else {
                truncate(&row.tag, 25)
            };
            let budget = row
                .weekly_budget
                .map(|b| format!("{:.2}", b))
                .unwrap_or_else(|| "-".to_string());
            let percent = row
                .weekly_budget_variance
                .filter(|v| v.is_finite())
                .map(|v| format!("{:.1}", v))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "   {:25} │ {:>10.2} │ {:>10} │ {:>8} │ {:>4} │ {:>5}",
                name,
                row.weekly_spend,
                budget,
                percent,
                row.exceeds_variance.as_str(),
                row.under_variance.as_str()
            );
        }
    }

    let (dir, filename) = ctx.output_target(output, "budget_vs_spend");
    let path = save_workbook(&report.workbook, &dir, &filename)?;
    print_saved(&path);
    Ok(path)
}

pub async fn cmd_report_untagged(
    source: &dyn TransactionSource,
    ctx: &RunContext,
    account: &str,
    window: &WindowArgs,
    output: &OutputArgs,
) -> Result<PathBuf> {
    let request = ctx.request(account, window)?;
    let report = untagged_withdrawals(source, &request).await?;

    print_header("🔍 Untagged Withdrawals", account, &report.summary);
    if report.withdrawals.is_empty() {
        println!("   Every withdrawal in this period has a tag.");
    } else {
        println!("   {:19} │ {:30} │ {:>10}", "Created", "Description", "Amount");
        println!("   ────────────────────┼────────────────────────────────┼───────────");
        for tx in &report.withdrawals {
            println!(
                "   {:19} │ {:30} │ {:>10.2}",
                tx.created_at.format(TIMESTAMP_FORMAT).to_string(),
                truncate(&tx.description, 30),
                tx.amount
            );
        }
    }

    let (dir, filename) = ctx.output_target(output, "untagged_withdrawals");
    let path = save_workbook(&report.workbook, &dir, &filename)?;
    print_saved(&path);
    Ok(path)
}
