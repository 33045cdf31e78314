//! Integration tests for upkit-core
//!
//! These tests exercise the full fetch → normalize → aggregate → export
//! workflow against an in-memory source and real files on disk.

use chrono::DateTime;
use tempfile::TempDir;
use upkit_core::{
    all_tag_analysis, budget_vs_spend, load_budget, read_workbook, untagged_withdrawals,
    write_csv, write_workbook, Account, Cell, MockSource, ReportRequest, SourceTransaction,
    VarianceLimits,
};
use upkit_core::time::{elapsed_between, months_ago, parse_timestamp};

fn spending_account() -> Account {
    Account {
        id: "acc-2up".to_string(),
        display_name: "2Up Spending".to_string(),
        account_type: "TRANSACTIONAL".to_string(),
        ownership_type: "JOINT".to_string(),
    }
}

fn tx(id: &str, description: &str, cents: i64, created_at: &str) -> SourceTransaction {
    SourceTransaction::new(
        id,
        description,
        cents,
        DateTime::parse_from_rfc3339(created_at).unwrap(),
    )
}

/// Two weeks of activity on a joint account, newest first
fn source() -> MockSource {
    MockSource::new().with_account(
        spending_account(),
        vec![
            tx("t6", "Woolworths", -5000, "2024-01-13T17:45:00+11:00")
                .with_tags(&["Groceries"])
                .with_category("groceries", Some("good-life"))
                .with_card_purchase_method("CARD_PIN", Some("4321")),
            tx("t5", "Shell Coles Express", -6500, "2024-01-11T08:10:00+11:00")
                .with_tags(&["Fuel", "Car"])
                .with_category("fuel", Some("transport")),
            tx("t4", "Coles", -3000, "2024-01-09T18:20:00+11:00")
                .with_tags(&["Groceries"])
                .with_category("groceries", Some("good-life")),
            tx("t3", "Salary", 250000, "2024-01-08T09:00:00+11:00"),
            tx("t2", "Mystery Merchant", -1999, "2024-01-05T13:00:00+11:00")
                .with_card_purchase_method("ECOMMERCE", Some("4321")),
            tx("t1", "Aldi", -2000, "2024-01-03T11:30:00+11:00")
                .with_tags(&["Groceries"])
                .with_category("groceries", Some("good-life"))
                .settled_at(DateTime::parse_from_rfc3339("2024-01-04T02:00:00+11:00").unwrap()),
        ],
    )
}

fn request() -> ReportRequest {
    ReportRequest::new(
        "2Up Spending",
        parse_timestamp("2024-01-01 00:00:00").unwrap(),
        parse_timestamp("2024-01-15 00:00:00").unwrap(),
        parse_timestamp("2024-01-15 08:00:00").unwrap(),
        chrono_tz::Australia::Sydney,
    )
}

// =============================================================================
// Budget workflow
// =============================================================================

#[tokio::test]
async fn test_budget_vs_spend_end_to_end() {
    let dir = TempDir::new().unwrap();
    let budget_path = dir.path().join("budget.csv");
    std::fs::write(
        &budget_path,
        "tag,weekly_budget\nGroceries,40\n\"Fuel,Car\",35\nRent,450\n",
    )
    .unwrap();

    let budget = load_budget(&budget_path).unwrap();
    let limits = VarianceLimits {
        lower: 95.0,
        upper: 112.5,
    };
    let report = budget_vs_spend(&source(), &request(), &budget, limits)
        .await
        .unwrap();

    let tags: Vec<&str> = report.variance.iter().map(|v| v.tag.as_str()).collect();
    assert_eq!(tags, vec!["Groceries", "Fuel,Car", ""]);

    let groceries = &report.variance[0];
    assert_eq!(groceries.total_spend, 100.0);
    assert_eq!(groceries.weekly_spend, 50.0);
    assert_eq!(groceries.weekly_budget_variance, Some(125.0));
    assert_eq!(groceries.exceeds_variance.as_str(), "YES");
    assert_eq!(groceries.under_variance.as_str(), "NO");

    // 65 over two weeks against 35 a week is 92.86%
    let fuel = &report.variance[1];
    assert_eq!(fuel.exceeds_variance.as_str(), "NO");
    assert_eq!(fuel.under_variance.as_str(), "YES");

    let untagged = &report.variance[2];
    assert_eq!(untagged.weekly_budget, None);
    assert_eq!(untagged.exceeds_variance.as_str(), "N/A");

    let path = write_workbook(&report.workbook, dir.path(), "budget_vs_spend.xlsx").unwrap();
    let read = read_workbook(&path).unwrap();
    assert_eq!(read.sheet_names(), vec!["report_summary", "budget_vs_spend"]);

    let sheet = read.sheet("budget_vs_spend").unwrap();
    assert_eq!(
        sheet.columns,
        vec![
            "tag",
            "total_spend",
            "weekly_spend",
            "weekly_budget",
            "weekly_budget_variance",
            "exceeds_variance",
            "under_variance",
        ]
    );
    let variance = sheet.column("weekly_budget_variance").unwrap();
    assert_eq!(variance[0].as_f64(), Some(125.0));
    let exceeds = sheet.column("exceeds_variance").unwrap();
    assert_eq!(exceeds[0], &Cell::text("YES"));
    assert_eq!(exceeds[2], &Cell::text("N/A"));
}

// =============================================================================
// Tag workflow
// =============================================================================

#[tokio::test]
async fn test_all_tag_workbook_round_trip() {
    let dir = TempDir::new().unwrap();
    let report = all_tag_analysis(&source(), &request()).await.unwrap();
    let path = write_workbook(&report.workbook, dir.path(), "all_tag_based_analysis.xlsx").unwrap();

    let read = read_workbook(&path).unwrap();
    assert_eq!(
        read.sheet_names(),
        vec!["report_summary", "tag_summary", "Groceries", "Fuel,Car", "untagged"]
    );

    for (name, original) in report.workbook.sheets() {
        let table = read.sheet(name).unwrap();
        assert_eq!(table.columns, original.columns, "sheet {}", name);
        assert_eq!(table.rows.len(), original.rows.len(), "sheet {}", name);

        for column in &original.columns {
            let expected = original.column(column).unwrap();
            let actual = table.column(column).unwrap();
            for (e, a) in expected.iter().zip(actual) {
                match e.as_f64() {
                    Some(v) => assert_eq!(a.as_f64(), Some(v), "{}.{}", name, column),
                    None => assert_eq!(e.to_text(), a.to_text(), "{}.{}", name, column),
                }
            }
        }
    }

    let groceries = read.sheet("Groceries").unwrap();
    let settled = groceries.column("settled_at").unwrap();
    assert_eq!(settled[2].to_text(), "2024-01-04 02:00:00");
    assert_eq!(settled[0].to_text(), "");
}

#[tokio::test]
async fn test_report_summary_matches_elapsed_period() {
    let report = all_tag_analysis(&source(), &request()).await.unwrap();
    let period = elapsed_between("2024-01-01 00:00:00", "2024-01-15 00:00:00").unwrap();

    assert_eq!(report.summary.total_days, period.days);
    assert_eq!(report.summary.total_weeks, period.weeks);
    assert_eq!(report.summary.total_months, period.months);
}

#[tokio::test]
async fn test_month_window_from_generation_time() {
    let end = "2024-01-15 00:00:00";
    let start = months_ago(end, 1).unwrap();
    assert_eq!(start, "2023-12-15 00:00:00");

    let request = ReportRequest::new(
        "2Up Spending",
        parse_timestamp(&start).unwrap(),
        parse_timestamp(end).unwrap(),
        parse_timestamp(end).unwrap(),
        chrono_tz::Australia::Sydney,
    );
    let report = all_tag_analysis(&source(), &request).await.unwrap();
    assert_eq!(report.summary.total_days, 31.0);
}

// =============================================================================
// Untagged workflow
// =============================================================================

#[tokio::test]
async fn test_untagged_withdrawals_to_csv() {
    let dir = TempDir::new().unwrap();
    let report = untagged_withdrawals(&source(), &request()).await.unwrap();

    assert_eq!(report.withdrawals.len(), 1);
    let mystery = &report.withdrawals[0];
    assert_eq!(mystery.description, "Mystery Merchant");
    assert_eq!(mystery.card_purchase_method, "ECOMMERCE");
    assert_eq!(mystery.category, "");

    let table = report.workbook.sheet("untagged_withdrawals").unwrap();
    let path = write_csv(table, dir.path(), "untagged.csv").unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.get(0), Some("created_at"));
    assert_eq!(headers.len(), 18);

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get(0), Some("2024-01-05 13:00:00"));
    assert_eq!(rows[0].get(2), Some("-19.99"));
}
