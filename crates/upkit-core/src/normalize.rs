//! Flatten source transactions into report rows

use tracing::{debug, info, warn};

use crate::models::Transaction;
use crate::source::SourceTransaction;

/// Log a missing optional attribute.
///
/// Deposits often lack a category or tags, so their absences are only
/// debug noise. A withdrawal without them is worth a warning.
fn note_absent(tx: &SourceTransaction, attribute: &str) {
    if tx.amount_f64() > 0.0 {
        debug!(
            transaction_id = %tx.id,
            description = %tx.description,
            "Deposit has no {}", attribute
        );
    } else {
        warn!(
            transaction_id = %tx.id,
            description = %tx.description,
            amount = tx.amount_f64(),
            "Withdrawal has no {}", attribute
        );
    }
}

/// Convert one source transaction into a flat row
pub fn normalize(tx: &SourceTransaction) -> Transaction {
    let (category, parent_category) = match &tx.category {
        Some(category) => {
            let parent = category.parent_id.clone().unwrap_or_else(|| {
                note_absent(tx, "parent category");
                String::new()
            });
            (category.id.clone(), parent)
        }
        None => {
            note_absent(tx, "category");
            (String::new(), String::new())
        }
    };

    let tags = match &tx.tags {
        Some(tags) if !tags.is_empty() => tags.join(","),
        _ => {
            note_absent(tx, "tags");
            String::new()
        }
    };

    let (card_purchase_method, card_suffix) = match &tx.card_purchase_method {
        Some(method) => (
            method.method.clone(),
            method.card_number_suffix.clone().unwrap_or_default(),
        ),
        None => {
            note_absent(tx, "card purchase method");
            (String::new(), String::new())
        }
    };

    Transaction {
        created_at: tx.created_at,
        settled_at: tx.settled_at,
        description: tx.description.clone(),
        amount: tx.amount_f64(),
        category,
        parent_category,
        tags,
        message: tx.message.clone().unwrap_or_default(),
        transaction_id: tx.id.clone(),
        amount_in_base_units: tx.amount.value_in_base_units,
        card_purchase_method,
        card_purchase_method_card_suffix: card_suffix,
        cashback: tx.cashback.as_ref().map(ToString::to_string).unwrap_or_default(),
        foreign_amount: tx
            .foreign_amount
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        raw_text: tx.raw_text.clone().unwrap_or_default(),
        round_up: tx.round_up.as_ref().map(ToString::to_string).unwrap_or_default(),
        status: tx.status.clone(),
        long_description: tx.long_description.clone().unwrap_or_default(),
    }
}

/// Normalize a batch, preserving order
pub fn normalize_all(transactions: &[SourceTransaction]) -> Vec<Transaction> {
    let rows: Vec<Transaction> = transactions.iter().map(normalize).collect();
    info!(count = rows.len(), "Processed transactions");
    rows
}
