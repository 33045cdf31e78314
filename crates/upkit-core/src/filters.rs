//! Row filters over normalized transactions
//!
//! Every filter returns a new `Vec` in input order and leaves the input alone.

use tracing::info;

use crate::models::Transaction;

fn keep(rows: &[Transaction], label: &str, predicate: impl Fn(&Transaction) -> bool) -> Vec<Transaction> {
    let kept: Vec<Transaction> = rows.iter().filter(|&row| predicate(row)).cloned().collect();
    info!(
        filter = label,
        kept = kept.len(),
        removed = rows.len() - kept.len(),
        "Filtered transactions"
    );
    kept
}

/// Keep rows whose tags match `tag`.
///
/// `exact` compares the whole comma-joined tags string. Otherwise this is a
/// case-sensitive substring test, so "fuel" matches "fuel,car" only here.
pub fn filter_by_tag(rows: &[Transaction], tag: &str, exact: bool) -> Vec<Transaction> {
    if exact {
        keep(rows, "tag_exact", |row| row.tags == tag)
    } else {
        keep(rows, "tag_contains", |row| row.tags.contains(tag))
    }
}

/// Keep rows with a negative amount
pub fn filter_withdrawals(rows: &[Transaction]) -> Vec<Transaction> {
    keep(rows, "withdrawals", Transaction::is_withdrawal)
}

/// Keep rows with no tags
pub fn filter_untagged(rows: &[Transaction]) -> Vec<Transaction> {
    keep(rows, "untagged", Transaction::is_untagged)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::DateTime;

    pub(crate) fn row(id: &str, tags: &str, amount: f64) -> Transaction {
        Transaction {
            created_at: DateTime::parse_from_rfc3339("2024-01-02T10:00:00+11:00").unwrap(),
            settled_at: None,
            description: format!("tx {}", id),
            amount,
            category: String::new(),
            parent_category: String::new(),
            tags: tags.to_string(),
            message: String::new(),
            transaction_id: id.to_string(),
            amount_in_base_units: (amount * 100.0).round() as i64,
            card_purchase_method: String::new(),
            card_purchase_method_card_suffix: String::new(),
            cashback: String::new(),
            foreign_amount: String::new(),
            raw_text: String::new(),
            round_up: String::new(),
            status: "SETTLED".to_string(),
            long_description: String::new(),
        }
    }

    fn ids(rows: &[Transaction]) -> Vec<&str> {
        rows.iter().map(|r| r.transaction_id.as_str()).collect()
    }

    fn sample() -> Vec<Transaction> {
        vec![
            row("1", "fuel", -60.0),
            row("2", "fuel,car", -40.0),
            row("3", "", -12.5),
            row("4", "", 250.0),
            row("5", "Fuel", -10.0),
            row("6", "groceries", 5.0),
            row("7", "", 0.0),
        ]
    }

    #[test]
    fn test_filter_by_tag_exact() {
        assert_eq!(ids(&filter_by_tag(&sample(), "fuel", true)), vec!["1"]);
    }

    #[test]
    fn test_filter_by_tag_substring_is_case_sensitive() {
        assert_eq!(ids(&filter_by_tag(&sample(), "fuel", false)), vec!["1", "2"]);
        assert_eq!(ids(&filter_by_tag(&sample(), "Fuel", false)), vec!["5"]);
    }

    #[test]
    fn test_filter_withdrawals_is_strict() {
        assert_eq!(ids(&filter_withdrawals(&sample())), vec!["1", "2", "3", "5"]);
    }

    #[test]
    fn test_filter_untagged() {
        assert_eq!(ids(&filter_untagged(&sample())), vec!["3", "4", "7"]);
    }

    #[test]
    fn test_withdrawal_and_untagged_filters_commute() {
        let rows = sample();
        let a = filter_untagged(&filter_withdrawals(&rows));
        let b = filter_withdrawals(&filter_untagged(&rows));
        assert_eq!(a, b);
        assert_eq!(ids(&a), vec!["3"]);
    }

    #[test]
    fn test_filters_leave_input_untouched() {
        let rows = sample();
        let before = rows.clone();
        let _ = filter_withdrawals(&rows);
        let _ = filter_by_tag(&rows, "fuel", false);
        assert_eq!(rows, before);
    }

    #[test]
    fn test_filters_on_empty_input() {
        assert!(filter_withdrawals(&[]).is_empty());
        assert!(filter_untagged(&[]).is_empty());
        assert!(filter_by_tag(&[], "x", true).is_empty());
    }
}
