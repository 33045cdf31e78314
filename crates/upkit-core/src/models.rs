//! Domain models for upkit
//!
//! These are the flat rows the pipeline passes between stages. Everything is
//! rebuilt per invocation; nothing here is persisted.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A bank account as listed by the transaction source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub display_name: String,
    /// e.g. "TRANSACTIONAL", "SAVER"
    pub account_type: String,
    /// e.g. "INDIVIDUAL", "JOINT"
    pub ownership_type: String,
}

/// One normalized transaction.
///
/// Optional source attributes are flattened to empty strings; `tags` is the
/// comma-joined list of tag ids and is empty (never missing) for untagged rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub created_at: DateTime<FixedOffset>,
    pub settled_at: Option<DateTime<FixedOffset>>,
    pub description: String,
    /// Negative for withdrawals, positive for deposits
    pub amount: f64,
    pub category: String,
    pub parent_category: String,
    pub tags: String,
    pub message: String,
    pub transaction_id: String,
    pub amount_in_base_units: i64,
    pub card_purchase_method: String,
    pub card_purchase_method_card_suffix: String,
    pub cashback: String,
    pub foreign_amount: String,
    pub raw_text: String,
    pub round_up: String,
    pub status: String,
    pub long_description: String,
}

impl Transaction {
    pub fn is_withdrawal(&self) -> bool {
        self.amount < 0.0
    }

    pub fn is_untagged(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Spend for one distinct tags value over a report window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagSummary {
    pub tag: String,
    pub total_spend: f64,
    pub weekly_spend: f64,
    pub monthly_spend: f64,
}

/// One line of a budget file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetRow {
    pub tag: String,
    /// `None` when the cell was empty
    pub weekly_budget: Option<f64>,
}

/// A tag summary left-joined with its budget
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetSpend {
    pub tag: String,
    pub total_spend: f64,
    pub weekly_spend: f64,
    pub monthly_spend: f64,
    /// `None` for tags without a budget entry
    pub weekly_budget: Option<f64>,
}

/// Outcome of a variance check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VarianceFlag {
    #[serde(rename = "YES")]
    Yes,
    #[serde(rename = "NO")]
    No,
    /// The tag has no budget, so there is nothing to compare against
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl VarianceFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "YES",
            Self::No => "NO",
            Self::NotApplicable => "N/A",
        }
    }
}

impl std::fmt::Display for VarianceFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Budget-versus-spend row with variance classification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetVariance {
    pub tag: String,
    pub total_spend: f64,
    pub weekly_spend: f64,
    pub weekly_budget: Option<f64>,
    /// weekly_spend / weekly_budget * 100
    pub weekly_budget_variance: Option<f64>,
    pub exceeds_variance: VarianceFlag,
    pub under_variance: VarianceFlag,
}

/// Provenance of a generated report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub from_timestamp: String,
    pub to_timestamp: String,
    pub generated_at: String,
    pub total_days: f64,
    pub total_weeks: f64,
    pub total_months: f64,
}
