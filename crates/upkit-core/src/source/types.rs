//! Source-side transaction records
//!
//! `SourceTransaction` is what a [`TransactionSource`](super::TransactionSource)
//! hands to the normalizer. Attributes that legitimately go missing (incoming
//! transfers have no category, most transactions have no card purchase
//! method) are explicit `Option`s.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A monetary amount as reported by the bank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    pub currency_code: String,
    /// Decimal string, e.g. "-12.50"
    pub value: String,
    /// Integer minor units, e.g. -1250
    pub value_in_base_units: i64,
}

impl Money {
    pub fn new(currency_code: &str, value_in_base_units: i64) -> Self {
        Self {
            currency_code: currency_code.to_string(),
            value: format!("{:.2}", value_in_base_units as f64 / 100.0),
            value_in_base_units,
        }
    }

    pub fn as_f64(&self) -> f64 {
        self.value
            .parse()
            .unwrap_or(self.value_in_base_units as f64 / 100.0)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.value, self.currency_code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPurchaseMethod {
    /// e.g. "CARD_PIN", "CARD_ON_FILE", "ECOMMERCE"
    pub method: String,
    pub card_number_suffix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundUp {
    pub amount: Money,
    pub boost_portion: Option<Money>,
}

impl std::fmt::Display for RoundUp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.boost_portion {
            Some(boost) => write!(f, "{} (boost {})", self.amount, boost),
            None => write!(f, "{}", self.amount),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cashback {
    pub description: String,
    pub amount: Money,
}

impl std::fmt::Display for Cashback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.description, self.amount)
    }
}

/// Category assigned by the bank, with its parent when it has one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: String,
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceTransaction {
    pub id: String,
    /// "HELD" or "SETTLED"
    pub status: String,
    pub raw_text: Option<String>,
    pub description: String,
    pub message: Option<String>,
    pub amount: Money,
    pub foreign_amount: Option<Money>,
    pub round_up: Option<RoundUp>,
    pub cashback: Option<Cashback>,
    pub card_purchase_method: Option<CardPurchaseMethod>,
    pub created_at: DateTime<FixedOffset>,
    pub settled_at: Option<DateTime<FixedOffset>>,
    pub category: Option<CategoryRef>,
    /// Tag ids in the order the bank lists them
    pub tags: Option<Vec<String>>,
    pub long_description: Option<String>,
}

impl SourceTransaction {
    /// A settled AUD transaction with every optional attribute absent
    pub fn new(
        id: &str,
        description: &str,
        amount_in_base_units: i64,
        created_at: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id: id.to_string(),
            status: "SETTLED".to_string(),
            raw_text: None,
            description: description.to_string(),
            message: None,
            amount: Money::new("AUD", amount_in_base_units),
            foreign_amount: None,
            round_up: None,
            cashback: None,
            card_purchase_method: None,
            created_at,
            settled_at: None,
            category: None,
            tags: None,
            long_description: None,
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = Some(tags.iter().map(|t| t.to_string()).collect());
        self
    }

    pub fn with_category(mut self, id: &str, parent_id: Option<&str>) -> Self {
        self.category = Some(CategoryRef {
            id: id.to_string(),
            parent_id: parent_id.map(str::to_string),
        });
        self
    }

    pub fn with_card_purchase_method(mut self, method: &str, suffix: Option<&str>) -> Self {
        self.card_purchase_method = Some(CardPurchaseMethod {
            method: method.to_string(),
            card_number_suffix: suffix.map(str::to_string),
        });
        self
    }

    pub fn settled_at(mut self, settled_at: DateTime<FixedOffset>) -> Self {
        self.settled_at = Some(settled_at);
        self
    }

    pub fn amount_f64(&self) -> f64 {
        self.amount.as_f64()
    }
}

/// Filters for a transaction fetch
#[derive(Debug, Clone, Default)]
pub struct TransactionQuery {
    /// Inclusive lower bound on `created_at`
    pub since: Option<DateTime<FixedOffset>>,
    /// Inclusive upper bound on `created_at`
    pub until: Option<DateTime<FixedOffset>>,
    /// Maximum number of transactions to return, 0 for no limit
    pub limit: usize,
}
